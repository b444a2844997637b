//! Error types for secret detection.

use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors that can occur while configuring detection.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// Failed to compile a regex pattern.
    #[error("pattern error: {0}")]
    PatternError(String),
}
