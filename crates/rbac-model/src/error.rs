//! Error types for model construction
//!
//! Raised when a level, name or action policy fails validation. Storage and
//! resolution failures live in `rbac-engine`.

use thiserror::Error;

/// Model validation error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// Privilege levels must be strictly positive
    #[error("Invalid privilege level: {0} (levels must be > 0)")]
    InvalidLevel(i64),

    /// A required identifier was empty
    #[error("{0} must not be empty")]
    EmptyName(&'static str),

    /// Level is positive but not one of the configured levels
    #[error("Privilege level {0} is not in the configured level set")]
    UnknownLevel(u32),

    /// Action policy could not be parsed or contains invalid entries
    #[error("Invalid action policy: {0}")]
    InvalidPolicy(String),
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Reject empty identifiers.
pub(crate) fn require_name(value: &str, what: &'static str) -> ModelResult<()> {
    if value.is_empty() {
        Err(ModelError::EmptyName(what))
    } else {
        Ok(())
    }
}
