//! Bundle loader: the single trusted entry point for on-disk bundles.
//!
//! A bundle is loaded and checked in a fixed order, and the first violated
//! check aborts the load. Nothing downstream should read parts of a bundle
//! that did not come through [`BundleLoader::load`].

use crate::checks;
use crate::manifest::{check_strict, parse_root, ArtifactRole, BundleManifest, MANIFEST_FILE_NAME};
use crate::schema::SchemaValidator;
use crate::{BundleError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// How much of a bundle is checked on load.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum VerifyLevel {
    /// Parse (and strict gate) only.
    None,
    /// Schema, part presence and part/artifact mapping.
    Basic,
    /// Basic plus SHA-256 of every Markdown part.
    #[default]
    Full,
}

impl VerifyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyLevel::None => "none",
            VerifyLevel::Basic => "basic",
            VerifyLevel::Full => "full",
        }
    }
}

impl std::fmt::Display for VerifyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerifyLevel {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(VerifyLevel::None),
            "basic" => Ok(VerifyLevel::Basic),
            "full" => Ok(VerifyLevel::Full),
            other => Err(BundleError::ConfigError(format!(
                "unknown verify level '{}', expected none, basic or full",
                other
            ))),
        }
    }
}

/// A bundle that passed the loader's checks.
#[derive(Debug, Clone)]
pub struct LoadedBundle {
    pub manifest: BundleManifest,
    pub dir: PathBuf,
}

impl LoadedBundle {
    /// Absolute paths of all parts, in order.
    pub fn part_paths(&self) -> Result<Vec<PathBuf>> {
        self.manifest
            .completeness()?
            .parts
            .iter()
            .map(|p| checks::resolve_member(&self.dir, p))
            .collect()
    }

    /// Read one part by name. The name must be listed in `completeness.parts`.
    pub fn read_part(&self, name: &str) -> Result<String> {
        let completeness = self.manifest.completeness()?;
        if !completeness.parts.iter().any(|p| p == name) {
            return Err(BundleError::IntegrityViolation(format!(
                "'{}' is not a part of this bundle",
                name
            )));
        }
        let path = checks::resolve_member(&self.dir, name)?;
        Ok(std::fs::read_to_string(path)?)
    }

    /// Read the primary part.
    pub fn read_primary(&self) -> Result<String> {
        let primary = self.manifest.completeness()?.primary_part.clone();
        self.read_part(&primary)
    }
}

/// Configurable bundle loader.
#[derive(Debug)]
pub struct BundleLoader {
    strict: bool,
    level: VerifyLevel,
    schema: Option<SchemaValidator>,
}

impl Default for BundleLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl BundleLoader {
    /// Strict loader at level `full`, with the bundled schema when available.
    pub fn new() -> Self {
        Self {
            strict: true,
            level: VerifyLevel::Full,
            schema: SchemaValidator::bundled(),
        }
    }

    /// Enable or disable the strict top-level gate.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the verification level.
    pub fn level(mut self, level: VerifyLevel) -> Self {
        self.level = level;
        self
    }

    /// Replace the schema capability (`None` disables the soft schema check).
    pub fn with_schema(mut self, schema: Option<SchemaValidator>) -> Self {
        self.schema = schema;
        self
    }

    /// Load a bundle from its directory or its `bundle.json` path.
    pub fn load(&self, target: &Path) -> Result<LoadedBundle> {
        let (dir, manifest_path) = resolve_target(target)?;
        let bytes = std::fs::read(&manifest_path)?;
        let text = String::from_utf8(bytes).map_err(|e| {
            BundleError::SchemaViolation(format!("bundle.json is not valid UTF-8: {}", e))
        })?;

        let root = parse_root(&text)?;
        if self.strict {
            check_strict(&root)?;
        }

        if self.level >= VerifyLevel::Basic {
            match &self.schema {
                Some(validator) => {
                    let value = serde_json::Value::Object(root.clone());
                    if let Err(errors) = validator.validate(&value) {
                        return Err(BundleError::SchemaViolation(format!(
                            "bundle.json does not match schema: {}",
                            errors.join("; ")
                        )));
                    }
                }
                None => debug!("No schema validator available, schema check skipped"),
            }
        }

        let manifest = BundleManifest::from_root(root)?;

        if self.level >= VerifyLevel::Basic {
            let completeness = manifest.completeness()?;
            checks::check_primary_part(completeness)?;
            checks::check_parts_exist(completeness, &dir)?;
            checks::check_parts_mapped(completeness, &manifest.artifacts)?;
        }

        if self.level == VerifyLevel::Full {
            checks::check_artifact_hashes(
                &manifest.artifacts,
                &dir,
                |a| a.role.is_markdown_part(),
                true,
            )?;
        }

        if manifest
            .artifacts
            .iter()
            .any(|a| a.role == ArtifactRole::Unknown)
        {
            warn!("Bundle lists artifacts with unknown roles");
        }

        info!(
            dir = %dir.display(),
            repo = manifest.repo().unwrap_or("<unknown>"),
            level = %self.level,
            strict = self.strict,
            "Bundle loaded"
        );

        Ok(LoadedBundle { manifest, dir })
    }
}

/// Load with an explicit strictness and level, using the bundled schema.
pub fn load_bundle(target: &Path, strict: bool, level: VerifyLevel) -> Result<LoadedBundle> {
    BundleLoader::new().strict(strict).level(level).load(target)
}

/// Split a target into (bundle dir, manifest path).
fn resolve_target(target: &Path) -> Result<(PathBuf, PathBuf)> {
    let (dir, manifest_path) = if target.is_dir() {
        (target.to_path_buf(), target.join(MANIFEST_FILE_NAME))
    } else {
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        (dir, target.to_path_buf())
    };
    if !manifest_path.is_file() {
        return Err(BundleError::IntegrityViolation(format!(
            "{} not found",
            manifest_path.display()
        )));
    }
    Ok((dir, manifest_path))
}
