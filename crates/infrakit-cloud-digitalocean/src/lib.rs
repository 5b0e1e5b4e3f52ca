//! DigitalOcean components for infrakit
//!
//! App Platform applications and VPCs, named with the same regional
//! strategy as the AWS catalog. The provider context region is a
//! DigitalOcean slug (`lon1`); apps also take the App Platform form (`lon`).

pub mod app;
pub mod error;
pub mod region;
pub mod resource_types;
pub mod vpc;

pub use app::{App, AppArgs};
pub use error::{DigitalOceanError, Result};
pub use region::{DigitalOceanRegion, app_platform_region};
pub use resource_types::{
    DigitalOceanResourceType, build_repository_name, digital_ocean_resource_type,
};
pub use vpc::{Vpc, VpcArgs};
