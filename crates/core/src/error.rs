//! Core error model.

use thiserror::Error;

/// Result type used by the core primitives.
pub type CoreResult<T> = Result<T, CoreError>;

/// Failure parsing one of the core primitives from untrusted input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An identifier was not a valid integer id.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A resource type name is not part of the closed set.
    #[error("unknown resource type '{0}'")]
    UnknownResourceType(String),
}

impl CoreError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
