//! Custom error types for shadow-trail
//!
//! This module defines the error hierarchy for the shadowing layer using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for shadow-trail operations
#[derive(Error, Debug)]
pub enum ShadowError {
    /// Malformed shadow declarations, surfaced at registration time
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid input or record state
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced record (or historical version) does not exist
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    /// A required attachment was absent or unpersisted when writing a shadow row
    #[error("Expected attached {attachment} on {owner_type}.")]
    AttachmentMissing {
        owner_type: String,
        attachment: String,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ShadowError {
    /// Create a "not found" error for a record of the given type
    pub fn not_found(entity_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            identifier: identifier.into(),
        }
    }

    /// Create an "attachment missing" error
    pub fn attachment_missing(owner_type: impl Into<String>, attachment: impl Into<String>) -> Self {
        Self::AttachmentMissing {
            owner_type: owner_type.into(),
            attachment: attachment.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an "attachment missing" error
    pub fn is_attachment_missing(&self) -> bool {
        matches!(self, Self::AttachmentMissing { .. })
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<std::io::Error> for ShadowError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ShadowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for shadow-trail operations
pub type ShadowResult<T> = Result<T, ShadowError>;
