//! Error types for bundle operations.

use std::fmt;
use thiserror::Error;

/// Errors that can occur while producing or loading a bundle.
///
/// Every violated bundle invariant surfaces as one of the `*Violation`
/// variants; the first violation aborts the whole operation.
#[derive(Error, Debug)]
pub enum BundleError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Scanning a source tree failed
    #[error("snapshot error: {0}")]
    Snapshot(#[from] rl_snapshot::SnapshotError),

    /// Malformed or unexpected top-level shape, legacy keys
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// Hash mismatch, missing part file, parts/artifacts mismatch
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    /// Byte accounting does not add up
    #[error("consistency violation: {0}")]
    ConsistencyViolation(String),

    /// Truncation marker under the wrong policy, missing mandatory zone
    #[error("guard violation: {0}")]
    GuardViolation(String),

    /// Invalid configuration or verification level
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A written part could not be hashed
    #[error("failed to hash '{path}': {source}")]
    HashFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Invariant violation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    Schema,
    Integrity,
    Consistency,
    Guard,
    Config,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViolationKind::Schema => "schema",
            ViolationKind::Integrity => "integrity",
            ViolationKind::Consistency => "consistency",
            ViolationKind::Guard => "guard",
            ViolationKind::Config => "config",
        };
        f.write_str(s)
    }
}

impl BundleError {
    /// Violation category, `None` for plain I/O or serialization failures.
    pub fn violation_kind(&self) -> Option<ViolationKind> {
        match self {
            BundleError::SchemaViolation(_) => Some(ViolationKind::Schema),
            BundleError::IntegrityViolation(_) => Some(ViolationKind::Integrity),
            BundleError::ConsistencyViolation(_) => Some(ViolationKind::Consistency),
            BundleError::GuardViolation(_) => Some(ViolationKind::Guard),
            BundleError::ConfigError(_) => Some(ViolationKind::Config),
            BundleError::Io(_)
            | BundleError::Json(_)
            | BundleError::Snapshot(_)
            | BundleError::HashFailed { .. } => None,
        }
    }

    /// Whether this error is an invariant violation.
    pub fn is_violation(&self) -> bool {
        self.violation_kind().is_some()
    }

    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            BundleError::Io(_) => 70,
            BundleError::Json(_) => 71,
            BundleError::Snapshot(_) => 72,
            BundleError::SchemaViolation(_) => 73,
            BundleError::IntegrityViolation(_) => 74,
            BundleError::ConsistencyViolation(_) => 75,
            BundleError::GuardViolation(_) => 76,
            BundleError::ConfigError(_) => 77,
            BundleError::HashFailed { .. } => 78,
        }
    }
}

/// Result type alias for bundle operations.
pub type Result<T> = std::result::Result<T, BundleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_kinds() {
        assert_eq!(
            BundleError::SchemaViolation("x".into()).violation_kind(),
            Some(ViolationKind::Schema)
        );
        assert_eq!(
            BundleError::GuardViolation("x".into()).violation_kind(),
            Some(ViolationKind::Guard)
        );
        let io = BundleError::Io(std::io::Error::other("boom"));
        assert!(!io.is_violation());
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            BundleError::SchemaViolation(String::new()),
            BundleError::IntegrityViolation(String::new()),
            BundleError::ConsistencyViolation(String::new()),
            BundleError::GuardViolation(String::new()),
            BundleError::ConfigError(String::new()),
        ];
        let mut codes: Vec<u32> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_display_names_category() {
        let err = BundleError::IntegrityViolation("SHA256 mismatch for review.md".into());
        assert!(err.to_string().starts_with("integrity violation:"));
    }

    #[test]
    fn test_hash_failure_is_fatal_not_violation() {
        let err = BundleError::HashFailed {
            path: "review.md".to_string(),
            source: std::io::Error::other("gone"),
        };
        assert!(!err.is_violation());
        assert_eq!(err.code(), 78);
        assert!(err.to_string().contains("review.md"));
    }
}
