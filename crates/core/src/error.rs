//! Domain error model.

use thiserror::Error;

/// Result type used across the pure layers.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures (validation, malformed
/// identifiers). Transport and storage concerns have their own error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {message}")]
    Validation {
        field: Option<&'static str>,
        message: String,
    },

    /// An identifier was invalid (e.g. empty or containing whitespace).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            field: None,
            message: msg.into(),
        }
    }

    /// Validation failure attributed to a single input field.
    pub fn field(field: &'static str, msg: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field),
            message: msg.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// The offending field, when the failure is a field-level validation error.
    pub fn field_name(&self) -> Option<&'static str> {
        match self {
            DomainError::Validation { field, .. } => *field,
            _ => None,
        }
    }
}
