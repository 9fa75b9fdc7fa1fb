//! Error types for edumap

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EdumapError {
    // Input errors
    #[error("Invalid record {record}: {reason}")]
    Validation { record: String, reason: String },

    // Projection errors
    #[error("Projection failed: {reason}")]
    Projection { reason: String },

    // Lookup errors
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    // Analysis errors
    #[error("Empty input: {which} must contain at least one point")]
    EmptyInput { which: &'static str },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EdumapError {
    /// Shorthand for a validation failure on a named record
    pub fn validation(record: impl Into<String>, reason: impl Into<String>) -> Self {
        EdumapError::Validation { record: record.into(), reason: reason.into() }
    }

    /// Shorthand for a failed lookup
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        EdumapError::NotFound { kind, key: key.into() }
    }

    /// Shorthand for a projection failure
    pub fn projection(reason: impl Into<String>) -> Self {
        EdumapError::Projection { reason: reason.into() }
    }

    /// True for lookup misses, which callers are expected to recover from
    pub fn is_not_found(&self) -> bool {
        matches!(self, EdumapError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, EdumapError>;
