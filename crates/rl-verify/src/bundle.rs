//! The on-disk bundle contract, as far as verification needs it.
//!
//! Unknown keys are ignored and artifact roles are plain strings.

use crate::error::{Result, VerifyError};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE_NAME: &str = "bundle.json";

/// Substrings that mark truncated content.
pub const TRUNCATION_MARKERS: &[&str] = &["Content truncated at", "<!-- truncated -->"];

/// Zones the primary part must open.
pub const MANDATORY_ZONES: &[&str] = &["summary", "files_manifest"];

pub const ZONE_END: &str = "<!-- zone:end -->";

/// Absolute floor of the allowed emitted/expected difference.
pub const OVERHEAD_FLOOR_BYTES: u64 = 64 * 1024;

/// Relative share of `expected_bytes` allowed as difference.
pub const OVERHEAD_RATIO: f64 = 0.05;

pub fn zone_begin(kind: &str) -> String {
    format!("<!-- zone:begin type={} -->", kind)
}

/// `max(64 KiB, floor(5 % of expected))`.
pub fn allowed_overhead(expected_bytes: u64) -> u64 {
    let relative = (expected_bytes as f64 * OVERHEAD_RATIO).floor() as u64;
    OVERHEAD_FLOOR_BYTES.max(relative)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub completeness: Completeness,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Completeness {
    pub is_complete: bool,
    pub policy: String,
    pub parts: Vec<String>,
    pub primary_part: String,
    pub expected_bytes: u64,
    pub emitted_bytes: u64,
}

impl Completeness {
    pub fn allows_truncation(&self) -> bool {
        self.policy == "truncate" && !self.is_complete
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    pub role: String,
    pub basename: String,
    #[serde(default)]
    pub sha256: Option<String>,
}

/// Location of a bundle on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLocation {
    pub dir: PathBuf,
    pub manifest_path: PathBuf,
}

impl BundleLocation {
    /// Accept the bundle directory or the path of its `bundle.json`.
    pub fn resolve(target: &Path) -> Result<Self> {
        let location = if target.is_dir() {
            BundleLocation {
                dir: target.to_path_buf(),
                manifest_path: target.join(MANIFEST_FILE_NAME),
            }
        } else {
            let dir = match target.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            BundleLocation {
                dir,
                manifest_path: target.to_path_buf(),
            }
        };
        if !location.manifest_path.is_file() {
            return Err(VerifyError::NotFound(location.manifest_path));
        }
        Ok(location)
    }

    /// Path of a bundle member; only plain file names are accepted.
    pub fn member(&self, basename: &str) -> Result<PathBuf> {
        let plain = !basename.is_empty()
            && basename != "."
            && basename != ".."
            && !basename.contains(['/', '\\']);
        if !plain {
            return Err(VerifyError::Integrity(format!(
                "'{}' is not a plain file name inside the bundle",
                basename
            )));
        }
        Ok(self.dir.join(basename))
    }

    /// Read and parse `bundle.json` into a JSON value.
    pub fn read_manifest_value(&self) -> Result<Value> {
        let bytes = std::fs::read(&self.manifest_path).map_err(|source| VerifyError::Io {
            path: self.manifest_path.clone(),
            source,
        })?;
        let text = String::from_utf8(bytes)
            .map_err(|e| VerifyError::Schema(format!("bundle.json is not valid UTF-8: {}", e)))?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| VerifyError::Schema(format!("bundle.json is not valid JSON: {}", e)))?;
        if !value.is_object() {
            return Err(VerifyError::Schema(
                "bundle.json root is not an object".to_string(),
            ));
        }
        Ok(value)
    }
}
