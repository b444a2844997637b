//! Producer configuration and size limits.
//!
//! The defaults are part of the on-disk contract: previously generated bundles
//! were split and checked with exactly these numbers, so changing them breaks
//! verification of old bundles.

use crate::{BundleError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default maximum size of one part file (200 KiB).
pub const MAX_PART_SIZE: usize = 200 * 1024;

/// Default size above which a file is omitted instead of embedded (200 KiB).
pub const INLINE_THRESHOLD: u64 = 200 * 1024;

/// Default number of leading bytes inspected for NUL (4 KiB).
pub const BINARY_SNIFF_BYTES: usize = 4 * 1024;

/// Default absolute floor of the byte-overhead bound (64 KiB).
pub const OVERHEAD_FLOOR_BYTES: u64 = 64 * 1024;

/// Default relative byte-overhead bound (5 %).
pub const OVERHEAD_RATIO: f64 = 0.05;

/// Size thresholds used for splitting and consistency checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BundleLimits {
    /// Maximum bytes per part (a single oversized block still gets its own part).
    pub max_part_size: usize,
    /// Files larger than this are omitted with a size note.
    pub inline_threshold: u64,
    /// Leading bytes sniffed for NUL to detect binaries.
    pub binary_sniff_bytes: usize,
    /// Absolute floor of the allowed emitted/expected difference.
    pub overhead_floor_bytes: u64,
    /// Relative share of `expected_bytes` allowed as difference.
    pub overhead_ratio: f64,
}

impl Default for BundleLimits {
    fn default() -> Self {
        Self {
            max_part_size: MAX_PART_SIZE,
            inline_threshold: INLINE_THRESHOLD,
            binary_sniff_bytes: BINARY_SNIFF_BYTES,
            overhead_floor_bytes: OVERHEAD_FLOOR_BYTES,
            overhead_ratio: OVERHEAD_RATIO,
        }
    }
}

impl BundleLimits {
    /// Override the part size (tests and small-hub deployments).
    pub fn with_max_part_size(mut self, bytes: usize) -> Self {
        self.max_part_size = bytes;
        self
    }

    /// Override the inline threshold.
    pub fn with_inline_threshold(mut self, bytes: u64) -> Self {
        self.inline_threshold = bytes;
        self
    }

    /// Allowed `|emitted - expected|` for a given expected size.
    pub fn allowed_overhead(&self, expected_bytes: u64) -> u64 {
        let relative = (expected_bytes as f64 * self.overhead_ratio).floor() as u64;
        self.overhead_floor_bytes.max(relative)
    }

    /// Reject nonsensical limits.
    pub fn validate(&self) -> Result<()> {
        if self.max_part_size == 0 {
            return Err(BundleError::ConfigError(
                "max_part_size must be greater than 0".to_string(),
            ));
        }
        if self.binary_sniff_bytes == 0 {
            return Err(BundleError::ConfigError(
                "binary_sniff_bytes must be greater than 0".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.overhead_ratio) {
            return Err(BundleError::ConfigError(format!(
                "overhead_ratio must be in [0, 1), got {}",
                self.overhead_ratio
            )));
        }
        Ok(())
    }
}

/// Identity of the program that generated a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorInfo {
    pub name: String,
    pub component: String,
    pub version: String,
}

impl Default for GeneratorInfo {
    fn default() -> Self {
        Self {
            name: "repolens".to_string(),
            component: "pr-schau".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Producer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProducerConfig {
    pub limits: BundleLimits,
    pub generator: GeneratorInfo,
}

impl ProducerConfig {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ProducerConfig = serde_json::from_str(&text).map_err(|e| {
            BundleError::ConfigError(format!("invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Set the limits.
    pub fn with_limits(mut self, limits: BundleLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.limits.validate()?;
        if self.generator.name.is_empty() {
            return Err(BundleError::ConfigError(
                "generator.name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
