//! FusionAuth declaration error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FusionAuthError {
    #[error("Cloud error: {0}")]
    CloudError(#[from] infrakit_cloud::CloudError),
}

pub type Result<T> = std::result::Result<T, FusionAuthError>;
