//! PostgreSQL declarations for infrakit
//!
//! Databases, login roles, privilege grants and role memberships, declared
//! through a [`PostgresProvider`] that connects with administrative
//! credentials. The RDS components build on these.
//!
//! # Example
//!
//! ```ignore
//! use infrakit_postgres::{PostgresProvider, PostgresProviderArgs, RoleArgs, declare_role};
//!
//! let provider = PostgresProvider::declare(&mut scope, "pg-provider", args)?;
//! scope.use_provider(&provider.handle);
//! let role = declare_role(&mut scope, &name, RoleArgs::login(&name), DeclareOptions::new())?;
//! ```

pub mod database;
pub mod error;
pub mod grant;
pub mod provider;
pub mod resource_types;
pub mod role;

pub use database::{PostgresDatabase, PostgresDatabaseArgs};
pub use error::{PostgresError, Result};
pub use grant::{GrantArgs, GrantObjectType, declare_grant};
pub use provider::{DEFAULT_PORT, PostgresProvider, PostgresProviderArgs, SslMode};
pub use resource_types::{PostgresResourceType, postgres_resource_type};
pub use role::{RoleArgs, declare_role, declare_role_grant, valid_until};
