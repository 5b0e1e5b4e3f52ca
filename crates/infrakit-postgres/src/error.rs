//! PostgreSQL declaration error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostgresError {
    #[error("Invalid grant for role {role}: {reason}")]
    InvalidGrant { role: String, reason: String },

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Cloud error: {0}")]
    CloudError(#[from] infrakit_cloud::CloudError),
}

pub type Result<T> = std::result::Result<T, PostgresError>;
