//! DigitalOcean catalog error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigitalOceanError {
    #[error("Unsupported region: {0}")]
    UnsupportedRegion(String),

    #[error("Cloud error: {0}")]
    CloudError(#[from] infrakit_cloud::CloudError),
}

pub type Result<T> = std::result::Result<T, DigitalOceanError>;
