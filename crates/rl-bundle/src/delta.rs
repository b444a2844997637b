//! `delta.json`: the machine-readable change set of a bundle.

use crate::{BundleError, Result};
use chrono::{DateTime, Utc};
use rl_snapshot::{ReviewCategory, Snapshot, SnapshotDiff};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `kind` of every delta manifest.
pub const DELTA_KIND: &str = "repolens.pr_schau.delta";

/// Current delta manifest version.
pub const DELTA_VERSION: u32 = 1;

/// Delta file name within the bundle directory.
pub const DELTA_FILE_NAME: &str = "delta.json";

/// Change status of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Changed,
    Removed,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Added => write!(f, "added"),
            FileStatus::Changed => write!(f, "changed"),
            FileStatus::Removed => write!(f, "removed"),
        }
    }
}

/// Whether a file hash could be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sha256Status {
    Ok,
    Unavailable,
}

/// One changed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub status: FileStatus,
    pub category: ReviewCategory,
    #[serde(rename = "size_bytes")]
    pub size: u64,
    pub sha256: Option<String>,
    pub sha256_status: Sha256Status,
}

impl FileEntry {
    fn from_snapshot(path: &str, status: FileStatus, snapshot: &Snapshot) -> Option<Self> {
        let entry = snapshot.get(path)?;
        Some(Self {
            path: path.to_string(),
            status,
            category: entry.category,
            size: entry.size,
            sha256: entry.sha256.clone(),
            sha256_status: if entry.sha256.is_some() {
                Sha256Status::Ok
            } else {
                Sha256Status::Unavailable
            },
        })
    }

    /// Whether the entry gets a content block (added or changed).
    pub fn is_reviewable(&self) -> bool {
        self.status != FileStatus::Removed
    }
}

/// Build the ordered entry list: reviewable files by category priority then
/// path, followed by removed files by path.
pub fn collect_entries(diff: &SnapshotDiff, old: &Snapshot, new: &Snapshot) -> Vec<FileEntry> {
    let mut reviewable: Vec<FileEntry> = diff
        .added
        .iter()
        .filter_map(|p| FileEntry::from_snapshot(p, FileStatus::Added, new))
        .chain(
            diff.changed
                .iter()
                .filter_map(|p| FileEntry::from_snapshot(p, FileStatus::Changed, new)),
        )
        .collect();
    reviewable.sort_by(|a, b| {
        a.category
            .priority()
            .cmp(&b.category.priority())
            .then_with(|| a.path.cmp(&b.path))
    });

    let mut removed: Vec<FileEntry> = diff
        .removed
        .iter()
        .filter_map(|p| FileEntry::from_snapshot(p, FileStatus::Removed, old))
        .collect();
    removed.sort_by(|a, b| a.path.cmp(&b.path));

    reviewable.extend(removed);
    reviewable
}

/// Per-status counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaSummary {
    pub added: usize,
    pub changed: usize,
    pub removed: usize,
}

/// Delta manifest (`delta.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaManifest {
    pub kind: String,
    pub version: u32,
    pub repo: String,
    pub generated_at: DateTime<Utc>,
    pub summary: DeltaSummary,
    pub files: Vec<FileEntry>,
}

impl DeltaManifest {
    /// Build a delta manifest from ordered entries.
    pub fn new(repo: impl Into<String>, generated_at: DateTime<Utc>, files: Vec<FileEntry>) -> Self {
        let mut summary = DeltaSummary::default();
        for f in &files {
            match f.status {
                FileStatus::Added => summary.added += 1,
                FileStatus::Changed => summary.changed += 1,
                FileStatus::Removed => summary.removed += 1,
            }
        }
        Self {
            kind: DELTA_KIND.to_string(),
            version: DELTA_VERSION,
            repo: repo.into(),
            generated_at,
            summary,
            files,
        }
    }

    /// Serialize to JSON with consistent formatting (trailing LF).
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Parse and check kind/version.
    pub fn from_json(text: &str) -> Result<Self> {
        let delta: DeltaManifest = serde_json::from_str(text)
            .map_err(|e| BundleError::SchemaViolation(format!("malformed delta.json: {}", e)))?;
        if delta.kind != DELTA_KIND {
            return Err(BundleError::SchemaViolation(format!(
                "unexpected delta kind '{}', expected '{}'",
                delta.kind, DELTA_KIND
            )));
        }
        if delta.version != DELTA_VERSION {
            return Err(BundleError::SchemaViolation(format!(
                "unsupported delta version {}, expected {}",
                delta.version, DELTA_VERSION
            )));
        }
        Ok(delta)
    }
}

/// Load `delta.json` from a bundle directory.
pub fn load_delta(bundle_dir: &Path) -> Result<DeltaManifest> {
    let path = bundle_dir.join(DELTA_FILE_NAME);
    let text = std::fs::read_to_string(&path).map_err(|e| {
        BundleError::IntegrityViolation(format!("cannot read {}: {}", path.display(), e))
    })?;
    DeltaManifest::from_json(&text)
}
