//! `bundle.json` types and the strict manifest parser.
//!
//! The manifest is the source of truth for a bundle's contents:
//! - Generator metadata and timestamps
//! - Completeness accounting (parts, expected vs. emitted bytes)
//! - Artifact listing with SHA-256 checksums
//! - The verification level the producer checked before publishing
//!
//! Parsing is done in two steps. [`parse_root`] and [`check_strict`] work on
//! the raw JSON object so that legacy keys and missing sections are reported
//! before any typed decoding; [`BundleManifest::from_root`] then decodes the
//! typed record.

use crate::reader::VerifyLevel;
use crate::{BundleError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::warn;

/// `kind` of every bundle manifest.
pub const BUNDLE_KIND: &str = "repolens.pr_schau.bundle";

/// Current bundle manifest version.
pub const BUNDLE_VERSION: &str = "1.0";

/// Manifest file name within the bundle directory.
pub const MANIFEST_FILE_NAME: &str = "bundle.json";

/// Name of the primary part.
pub const PRIMARY_PART: &str = "review.md";

/// Top-level keys of the pre-1.0 manifest layout. Never valid in a bundle.
pub const LEGACY_KEYS: &[&str] = &[
    "repo",
    "source",
    "created_at",
    "hub_rel",
    "old_tree_hint",
    "new_tree_hint",
    "note",
];

/// Top-level keys of the current layout.
pub const KNOWN_KEYS: &[&str] = &[
    "kind",
    "version",
    "meta",
    "view_mode",
    "content_scope",
    "completeness",
    "artifacts",
    "verification",
];

/// Sections a strict load requires.
pub const REQUIRED_SECTIONS: &[&str] = &["meta", "completeness", "artifacts"];

/// File name of part `number` (1-based).
pub fn part_name(number: usize) -> String {
    if number <= 1 {
        PRIMARY_PART.to_string()
    } else {
        format!("review_part{}.md", number)
    }
}

/// Bundle manifest (`bundle.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<BundleMeta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_scope: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completeness: Option<Completeness>,

    #[serde(default)]
    pub artifacts: Vec<Artifact>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<Verification>,
}

/// Who generated the bundle, for which repository, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleMeta {
    pub repo: String,
    pub generated_at: DateTime<Utc>,
    pub generator: Generator,
}

/// Generator identity as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generator {
    pub name: String,
    pub component: String,
    pub version: String,
}

/// How content that does not fit is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitPolicy {
    /// Content is spread across parts; nothing is dropped.
    Split,
    /// Content may be cut off; a marker records where.
    Truncate,
}

/// Completeness accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completeness {
    pub is_complete: bool,
    pub policy: SplitPolicy,
    pub parts: Vec<String>,
    pub primary_part: String,
    /// Bytes of the unsplit logical payload.
    pub expected_bytes: u64,
    /// Sum of the part file sizes on disk.
    pub emitted_bytes: u64,
}

impl Completeness {
    /// Whether truncation markers are legitimate in this bundle.
    pub fn allows_truncation(&self) -> bool {
        self.policy == SplitPolicy::Truncate && !self.is_complete
    }
}

/// Role of an artifact within the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRole {
    /// `bundle.json` itself
    IndexJson,
    /// The primary part
    CanonicalMd,
    /// Parts 2..N
    PartMd,
    /// `delta.json`
    DeltaJson,
    /// A role this version does not know
    #[serde(other)]
    Unknown,
}

impl ArtifactRole {
    /// Roles whose hash the loader must check at full level.
    pub fn is_markdown_part(self) -> bool {
        matches!(self, ArtifactRole::CanonicalMd | ArtifactRole::PartMd)
    }
}

/// Artifact entry with optional checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub role: ArtifactRole,
    pub basename: String,
    pub mime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl Artifact {
    /// Create a new artifact entry.
    pub fn new(role: ArtifactRole, basename: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            role,
            basename: basename.into(),
            mime: mime.into(),
            sha256: None,
        }
    }

    /// Set the checksum.
    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }

    /// Compute SHA-256 checksum of data.
    pub fn compute_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Verify the checksum against data. An artifact without checksum never verifies.
    pub fn verify(&self, data: &[u8]) -> bool {
        self.sha256
            .as_deref()
            .is_some_and(|expected| expected.eq_ignore_ascii_case(&Self::compute_checksum(data)))
    }
}

/// Record of the check the producer ran before publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub checked_at: DateTime<Utc>,
    pub checker: Checker,
    pub level: VerifyLevel,
}

/// Identity of the checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checker {
    pub name: String,
    pub version: String,
}

/// Parse text into a JSON object.
pub fn parse_root(text: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| BundleError::SchemaViolation(format!("bundle.json is not valid JSON: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(BundleError::SchemaViolation(format!(
            "bundle.json root must be an object, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Strict top-level gate: legacy keys, kind/version, required sections.
pub fn check_strict(root: &Map<String, Value>) -> Result<()> {
    if let Some(key) = LEGACY_KEYS.iter().find(|k| root.contains_key(**k)) {
        return Err(BundleError::SchemaViolation(format!(
            "legacy top-level key '{}' is not allowed",
            key
        )));
    }

    match root.get("kind").and_then(Value::as_str) {
        Some(BUNDLE_KIND) => {}
        other => {
            return Err(BundleError::SchemaViolation(format!(
                "unexpected kind {:?}, expected '{}'",
                other, BUNDLE_KIND
            )))
        }
    }

    match root.get("version").and_then(Value::as_str) {
        Some(BUNDLE_VERSION) => {}
        other => {
            return Err(BundleError::SchemaViolation(format!(
                "unsupported version {:?}, expected '{}'",
                other, BUNDLE_VERSION
            )))
        }
    }

    for section in REQUIRED_SECTIONS {
        if !root.contains_key(*section) {
            return Err(BundleError::SchemaViolation(format!(
                "missing required section '{}'",
                section
            )));
        }
    }

    Ok(())
}

impl BundleManifest {
    /// Decode the typed manifest from a parsed root object.
    ///
    /// Unknown non-legacy keys are tolerated and logged.
    pub fn from_root(root: Map<String, Value>) -> Result<Self> {
        for key in root.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) && !LEGACY_KEYS.contains(&key.as_str()) {
                warn!(key = %key, "Ignoring unknown top-level key in bundle.json");
            }
        }
        serde_json::from_value(Value::Object(root))
            .map_err(|e| BundleError::SchemaViolation(format!("malformed bundle.json: {}", e)))
    }

    /// Parse text with the strict gate applied.
    pub fn from_json_strict(text: &str) -> Result<Self> {
        let root = parse_root(text)?;
        check_strict(&root)?;
        Self::from_root(root)
    }

    /// Serialize to JSON with consistent formatting (trailing LF).
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Completeness section, required beyond level `none`.
    pub fn completeness(&self) -> Result<&Completeness> {
        self.completeness.as_ref().ok_or_else(|| {
            BundleError::SchemaViolation("missing required section 'completeness'".to_string())
        })
    }

    /// Find an artifact by basename.
    pub fn find_artifact(&self, basename: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.basename == basename)
    }

    /// Repository name, if the meta section is present.
    pub fn repo(&self) -> Option<&str> {
        self.meta.as_ref().map(|m| m.repo.as_str())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_manifest_json() -> Value {
        json!({
            "kind": BUNDLE_KIND,
            "version": BUNDLE_VERSION,
            "meta": {
                "repo": "demo",
                "generated_at": "2026-01-15T14:30:22Z",
                "generator": {"name": "repolens", "component": "pr-schau", "version": "0.1.0"}
            },
            "view_mode": "full",
            "content_scope": "mixed",
            "completeness": {
                "is_complete": true,
                "policy": "split",
                "parts": ["review.md"],
                "primary_part": "review.md",
                "expected_bytes": 10,
                "emitted_bytes": 10
            },
            "artifacts": [
                {"role": "index_json", "basename": "bundle.json", "mime": "application/json"},
                {"role": "canonical_md", "basename": "review.md", "mime": "text/markdown", "sha256": "a".repeat(64)}
            ]
        })
    }

    #[test]
    fn test_part_names() {
        assert_eq!(part_name(1), "review.md");
        assert_eq!(part_name(2), "review_part2.md");
        assert_eq!(part_name(10), "review_part10.md");
    }

    #[test]
    fn test_strict_parse_valid() {
        let text = valid_manifest_json().to_string();
        let manifest = BundleManifest::from_json_strict(&text).unwrap();

        assert_eq!(manifest.kind, BUNDLE_KIND);
        assert_eq!(manifest.repo(), Some("demo"));
        let c = manifest.completeness().unwrap();
        assert_eq!(c.primary_part, "review.md");
        assert_eq!(c.policy, SplitPolicy::Split);
        assert!(manifest.find_artifact("review.md").is_some());
    }

    #[test]
    fn test_strict_rejects_each_legacy_key() {
        for key in LEGACY_KEYS {
            let mut value = valid_manifest_json();
            value[*key] = json!("legacy");
            let err = BundleManifest::from_json_strict(&value.to_string()).unwrap_err();
            assert!(
                matches!(&err, BundleError::SchemaViolation(m) if m.contains(key)),
                "key {key}: {err}"
            );
        }
    }

    #[test]
    fn test_strict_rejects_wrong_kind_and_version() {
        let mut value = valid_manifest_json();
        value["kind"] = json!("something.else");
        assert!(matches!(
            BundleManifest::from_json_strict(&value.to_string()),
            Err(BundleError::SchemaViolation(_))
        ));

        let mut value = valid_manifest_json();
        value["version"] = json!("2.0");
        assert!(matches!(
            BundleManifest::from_json_strict(&value.to_string()),
            Err(BundleError::SchemaViolation(m)) if m.contains("version")
        ));
    }

    #[test]
    fn test_strict_requires_sections() {
        for section in REQUIRED_SECTIONS {
            let mut value = valid_manifest_json();
            value.as_object_mut().unwrap().remove(*section);
            let err = BundleManifest::from_json_strict(&value.to_string()).unwrap_err();
            assert!(matches!(&err, BundleError::SchemaViolation(m) if m.contains(section)));
        }
    }

    #[test]
    fn test_root_must_be_object() {
        assert!(matches!(parse_root("[1, 2]"), Err(BundleError::SchemaViolation(m)) if m.contains("array")));
        assert!(matches!(parse_root("{not json"), Err(BundleError::SchemaViolation(_))));
    }

    #[test]
    fn test_unknown_role_and_keys_tolerated() {
        let mut value = valid_manifest_json();
        value["x_extension"] = json!(true);
        value["artifacts"][0]["role"] = json!("future_role");
        let manifest = BundleManifest::from_json_strict(&value.to_string()).unwrap();
        assert_eq!(manifest.artifacts[0].role, ArtifactRole::Unknown);
    }

    #[test]
    fn test_to_json_ends_with_lf_and_omits_missing_hash() {
        let manifest = BundleManifest::from_json_strict(&valid_manifest_json().to_string()).unwrap();
        let json = manifest.to_json().unwrap();
        assert!(json.ends_with('\n'));
        assert!(!json.contains("\r\n"));

        let reparsed: Value = serde_json::from_str(&json).unwrap();
        assert!(reparsed["artifacts"][0].get("sha256").is_none());
    }

    #[test]
    fn test_artifact_verify() {
        let data = b"test data";
        let artifact = Artifact::new(ArtifactRole::CanonicalMd, "review.md", "text/markdown")
            .with_sha256(Artifact::compute_checksum(data));

        assert!(artifact.verify(data));
        assert!(!artifact.verify(b"different data"));
        assert!(!Artifact::new(ArtifactRole::PartMd, "x.md", "text/markdown").verify(data));
    }

    #[test]
    fn test_allows_truncation() {
        let mut c = Completeness {
            is_complete: false,
            policy: SplitPolicy::Truncate,
            parts: vec!["review.md".into()],
            primary_part: "review.md".into(),
            expected_bytes: 0,
            emitted_bytes: 0,
        };
        assert!(c.allows_truncation());
        c.is_complete = true;
        assert!(!c.allows_truncation());
        c.is_complete = false;
        c.policy = SplitPolicy::Split;
        assert!(!c.allows_truncation());
    }
}
