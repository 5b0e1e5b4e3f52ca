//! AWS catalog error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("Invalid ARN: {0}")]
    InvalidArn(String),

    #[error("Unsupported region: {0}")]
    UnsupportedRegion(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] infrakit_postgres::PostgresError),

    #[error("Cloud error: {0}")]
    CloudError(#[from] infrakit_cloud::CloudError),
}

pub type Result<T> = std::result::Result<T, AwsError>;
