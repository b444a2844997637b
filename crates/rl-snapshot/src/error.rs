//! Error types for snapshot operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while scanning a tree.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The scan root does not exist or is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Directory listing failed.
    #[error("failed to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for snapshot operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;
