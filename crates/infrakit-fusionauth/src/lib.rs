//! FusionAuth declarations for infrakit
//!
//! [`FusionAuthComponent`] declares an application on a running FusionAuth
//! instance, its roles, and users registered with it. The instance itself is
//! the AWS catalog's `FusionAuthServer`.

pub mod application;
pub mod error;
pub mod resource_types;

pub use application::{
    FusionAuthComponent, FusionAuthComponentArgs, JwtSettings, JwtSettingsOverrides,
    RegisteredUser, UserArgs,
};
pub use error::{FusionAuthError, Result};
pub use resource_types::{FusionAuthResourceType, fusionauth_resource_type};
