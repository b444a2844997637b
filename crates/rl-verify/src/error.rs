//! Verifier errors.

use crate::exit_codes::ExitCode;
use std::path::PathBuf;
use thiserror::Error;

/// A failed check or an environment problem that stopped verification.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// bundle.json is not valid JSON, not an object, or not a bundle manifest
    #[error("schema: {0}")]
    Schema(String),

    /// Missing parts, unmapped parts, hash mismatch
    #[error("integrity: {0}")]
    Integrity(String),

    /// Byte accounting does not add up
    #[error("consistency: {0}")]
    Consistency(String),

    /// Truncation markers or missing mandatory zones
    #[error("guard: {0}")]
    Guard(String),

    /// Target does not name a bundle
    #[error("bundle not found: {}", .0.display())]
    NotFound(PathBuf),

    /// bundle.json could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VerifyError {
    /// Whether this is a check failure rather than an environment problem.
    pub fn is_check_failure(&self) -> bool {
        !matches!(self, VerifyError::NotFound(_) | VerifyError::Io { .. })
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> ExitCode {
        if self.is_check_failure() {
            ExitCode::CheckFailed
        } else {
            ExitCode::IoError
        }
    }
}

pub type Result<T> = std::result::Result<T, VerifyError>;
