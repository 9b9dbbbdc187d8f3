//! Error types for resolution and assignment operations
//!
//! Absence of roles is never an error: it is an empty list or a `false`
//! authorization answer. Errors mean the question could not be answered.

use rbac_model::ModelError;
use thiserror::Error;

/// Storage collaborator failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Backend unreachable, timed out or lost its connection
    #[error("Assignment store unavailable: {0}")]
    Unavailable(String),

    /// Backend rejected a write
    #[error("Assignment store conflict: {0}")]
    Conflict(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// RBAC error types surfaced to callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RbacError {
    /// Rejected before touching the store (empty subject, bad level, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The assignment store could not serve the request
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for RBAC operations.
pub type RbacResult<T> = Result<T, RbacError>;

impl RbacError {
    /// Check if this error should be logged at error level.
    ///
    /// Invalid input is a caller mistake and is not.
    pub fn is_server_error(&self) -> bool {
        matches!(self, RbacError::StoreUnavailable(_) | RbacError::Config(_))
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            RbacError::InvalidInput(_) => "INVALID_INPUT",
            RbacError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            RbacError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<StoreError> for RbacError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) | StoreError::Conflict(msg) => {
                RbacError::StoreUnavailable(msg)
            }
        }
    }
}

impl From<ModelError> for RbacError {
    fn from(err: ModelError) -> Self {
        RbacError::InvalidInput(err.to_string())
    }
}
