//! Core error types

use crate::graph::DeclarationId;
use thiserror::Error;

/// Errors raised while composing or applying a resource graph
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown declaration: {0}")]
    UnknownDeclaration(DeclarationId),

    #[error("Dependency cycle detected at: {0}")]
    CycleDetected(String),

    #[error("Resource already exists: {0}")]
    ResourceAlreadyExists(String),

    #[error("Apply failed: {0}")]
    ApplyFailed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
