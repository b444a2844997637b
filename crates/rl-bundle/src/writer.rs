//! Bundle producer.
//!
//! Packages the difference between two trees into a fresh bundle directory
//! inside an output hub. Everything is written into a hidden staging
//! directory first; the directory is renamed to its final name only after the
//! invariant checks passed and `bundle.json` was written. A failed run leaves
//! nothing behind.

use crate::checks::{self, hash_file};
use crate::delta::{collect_entries, DeltaManifest, FileEntry, DELTA_FILE_NAME};
use crate::manifest::{
    Artifact, ArtifactRole, BundleManifest, BundleMeta, Checker, Completeness, Generator,
    SplitPolicy, Verification, BUNDLE_KIND, BUNDLE_VERSION, MANIFEST_FILE_NAME, PRIMARY_PART,
};
use crate::reader::VerifyLevel;
use crate::render::{
    assign_anchors, contains_truncation_marker, infer_language, looks_binary, normalize_newlines,
    render_file_block, render_header, ContentBlock, HeaderContext,
};
use crate::source::{FsTree, TreeSource};
use crate::split::{logical_payload_len, split_blocks};
use crate::{BundleError, ProducerConfig, Result};
use chrono::{DateTime, SubsecRound, Utc};
use rl_redact::{secret_filename_reason, SecretDetector};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MIME_MARKDOWN: &str = "text/markdown";
const MIME_JSON: &str = "application/json";

/// Name recorded as checker of the pre-publish self-check.
const CHECKER_NAME: &str = "rl-bundle";

/// Result of a successful producer run.
#[derive(Debug, Clone)]
pub struct BundleOutcome {
    /// Final bundle directory.
    pub dir: PathBuf,
    /// Manifest as written to `bundle.json`.
    pub manifest: BundleManifest,
    /// Delta as written to `delta.json`.
    pub delta: DeltaManifest,
}

/// Producer of PR-Schau bundles.
#[derive(Debug, Clone)]
pub struct BundleWriter<S: TreeSource = FsTree> {
    config: ProducerConfig,
    source: S,
    detector: SecretDetector,
    timestamp: Option<DateTime<Utc>>,
}

impl BundleWriter<FsTree> {
    /// Create a producer reading from the filesystem.
    pub fn new(config: ProducerConfig) -> Self {
        Self {
            config,
            source: FsTree,
            detector: SecretDetector::new(),
            timestamp: None,
        }
    }
}

impl<S: TreeSource> BundleWriter<S> {
    /// Use another tree source.
    pub fn with_source<T: TreeSource>(self, source: T) -> BundleWriter<T> {
        BundleWriter {
            config: self.config,
            source,
            detector: self.detector,
            timestamp: self.timestamp,
        }
    }

    /// Use a detector with additional patterns.
    pub fn with_detector(mut self, detector: SecretDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Pin the generation timestamp instead of using the current time.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// Produce a bundle for the change from `old_root` to `new_root`.
    pub fn produce(
        &self,
        old_root: &Path,
        new_root: &Path,
        repo: &str,
        hub: &Path,
    ) -> Result<BundleOutcome> {
        self.config.validate()?;
        let limits = &self.config.limits;
        let generated_at = self.timestamp.unwrap_or_else(Utc::now).trunc_subsecs(0);

        let old = self.source.snapshot(old_root)?;
        let new = self.source.snapshot(new_root)?;
        let diff = rl_snapshot::diff(&old, &new);
        let delta = DeltaManifest::new(repo, generated_at, collect_entries(&diff, &old, &new));

        info!(
            repo,
            added = delta.summary.added,
            changed = delta.summary.changed,
            removed = delta.summary.removed,
            "Producing bundle"
        );

        let blocks = self.render_blocks(new_root, repo, generated_at, &delta.files);
        let expected_bytes = logical_payload_len(&blocks) as u64;
        let parts = split_blocks(&blocks, limits.max_part_size);
        debug!(
            expected_bytes,
            parts = parts.len(),
            max_part_size = limits.max_part_size,
            "Payload split"
        );

        fs::create_dir_all(hub)?;
        let base_name = bundle_dir_name(repo, generated_at);
        let staging = StagingDir::create(hub, &base_name)?;

        let mut artifacts = vec![Artifact::new(
            ArtifactRole::IndexJson,
            MANIFEST_FILE_NAME,
            MIME_JSON,
        )];
        let mut emitted_bytes = 0u64;
        for part in &parts {
            let path = staging.path().join(&part.name);
            write_synced(&path, part.text.as_bytes())?;
            let sha256 = hash_file(&path).map_err(|source| BundleError::HashFailed {
                path: part.name.clone(),
                source,
            })?;
            emitted_bytes += fs::metadata(&path)?.len();

            let role = if part.number == 1 {
                ArtifactRole::CanonicalMd
            } else {
                ArtifactRole::PartMd
            };
            debug!(part = %part.name, bytes = part.text.len(), blocks = part.block_count, "Part written");
            artifacts.push(Artifact::new(role, &part.name, MIME_MARKDOWN).with_sha256(sha256));
        }

        let delta_path = staging.path().join(DELTA_FILE_NAME);
        write_synced(&delta_path, delta.to_json()?.as_bytes())?;
        let delta_sha = hash_file(&delta_path).map_err(|source| BundleError::HashFailed {
            path: DELTA_FILE_NAME.to_string(),
            source,
        })?;
        artifacts.push(
            Artifact::new(ArtifactRole::DeltaJson, DELTA_FILE_NAME, MIME_JSON).with_sha256(delta_sha),
        );

        let generator = &self.config.generator;
        let mut manifest = BundleManifest {
            kind: BUNDLE_KIND.to_string(),
            version: BUNDLE_VERSION.to_string(),
            meta: Some(BundleMeta {
                repo: repo.to_string(),
                generated_at,
                generator: Generator {
                    name: generator.name.clone(),
                    component: generator.component.clone(),
                    version: generator.version.clone(),
                },
            }),
            view_mode: Some("full".to_string()),
            content_scope: Some("mixed".to_string()),
            completeness: Some(Completeness {
                is_complete: true,
                policy: SplitPolicy::Split,
                parts: parts.iter().map(|p| p.name.clone()).collect(),
                primary_part: PRIMARY_PART.to_string(),
                expected_bytes,
                emitted_bytes,
            }),
            artifacts,
            verification: None,
        };

        checks::check_all(&manifest, staging.path(), limits)?;
        manifest.verification = Some(Verification {
            checked_at: Utc::now().trunc_subsecs(0),
            checker: Checker {
                name: CHECKER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            level: VerifyLevel::Full,
        });

        write_synced(
            &staging.path().join(MANIFEST_FILE_NAME),
            manifest.to_json()?.as_bytes(),
        )?;
        let dir = staging.publish(hub, &base_name)?;

        info!(
            dir = %dir.display(),
            parts = parts.len(),
            expected_bytes,
            emitted_bytes,
            "Bundle written"
        );

        Ok(BundleOutcome {
            dir,
            manifest,
            delta,
        })
    }

    /// Header block followed by one block per reviewable entry.
    fn render_blocks(
        &self,
        new_root: &Path,
        repo: &str,
        generated_at: DateTime<Utc>,
        entries: &[FileEntry],
    ) -> Vec<String> {
        let mut reviewable_anchors = assign_anchors(
            entries
                .iter()
                .filter(|e| e.is_reviewable())
                .map(|e| e.path.as_str()),
        )
        .into_iter();
        let anchors: Vec<Option<String>> = entries
            .iter()
            .map(|e| {
                if e.is_reviewable() {
                    reviewable_anchors.next()
                } else {
                    None
                }
            })
            .collect();

        let generator = &self.config.generator;
        let generator_label = format!(
            "{}/{} {}",
            generator.name, generator.component, generator.version
        );
        let mut blocks = vec![render_header(&HeaderContext {
            repo,
            generated_at,
            generator: &generator_label,
            entries,
            anchors: &anchors,
        })];

        for (entry, anchor) in entries.iter().zip(&anchors) {
            let Some(anchor) = anchor else { continue };
            let content = self.render_content(new_root, entry);
            debug!(path = %entry.path, content = content.label(), "Rendered file block");
            blocks.push(render_file_block(entry, anchor, &content));
        }
        blocks
    }

    /// Decide how one added or changed file is shown.
    fn render_content(&self, new_root: &Path, entry: &FileEntry) -> ContentBlock {
        let limits = &self.config.limits;

        if let Some(reason) = secret_filename_reason(&entry.path) {
            return ContentBlock::Redacted {
                reason: format!("file name indicates secrets ({})", reason),
            };
        }

        if entry.size > limits.inline_threshold {
            return ContentBlock::Omitted {
                reason: format!(
                    "{} bytes exceeds the inline threshold of {} bytes",
                    entry.size, limits.inline_threshold
                ),
            };
        }

        let data = match self.source.read_file(new_root, &entry.path) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %entry.path, error = %e, "Failed to read file for embedding");
                return ContentBlock::ReadError {
                    message: e.to_string(),
                };
            }
        };

        if looks_binary(&data, limits) {
            return ContentBlock::Binary;
        }

        let text = normalize_newlines(&String::from_utf8_lossy(&data));

        if let Some(secret) = self.detector.detect(&text) {
            return ContentBlock::Redacted {
                reason: format!("content matches {}", secret.label()),
            };
        }

        if contains_truncation_marker(&text) {
            return ContentBlock::Omitted {
                reason: "content contains a reserved truncation marker".to_string(),
            };
        }

        ContentBlock::Embedded {
            language: infer_language(&entry.path).to_string(),
            text,
        }
    }
}

/// `<repo>_pr-schau_<YYYYMMDD-HHMMSS>`, with the repo name made path-safe.
pub fn bundle_dir_name(repo: &str, generated_at: DateTime<Utc>) -> String {
    let mut safe: String = repo
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    safe = safe.trim_start_matches('.').to_string();
    if safe.is_empty() {
        safe = "repo".to_string();
    }
    format!("{}_pr-schau_{}", safe, generated_at.format("%Y%m%d-%H%M%S"))
}

/// Write and flush a file to disk before anything reads it back.
fn write_synced(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}

/// Hidden staging directory, removed on drop unless published.
struct StagingDir {
    path: PathBuf,
    published: bool,
}

impl StagingDir {
    /// Create a fresh hidden directory, never reusing an existing one.
    fn create(hub: &Path, base_name: &str) -> Result<Self> {
        let pid = std::process::id();
        let mut n = 1u32;
        loop {
            let path = if n == 1 {
                hub.join(format!(".{}.{}.staging", base_name, pid))
            } else {
                hub.join(format!(".{}.{}-{}.staging", base_name, pid, n))
            };
            match fs::create_dir(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "Created staging directory");
                    return Ok(Self {
                        path,
                        published: false,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Rename to the first free name `base`, `base-2`, `base-3`, ...
    fn publish(mut self, hub: &Path, base_name: &str) -> Result<PathBuf> {
        let mut n = 1;
        loop {
            let candidate = if n == 1 {
                hub.join(base_name)
            } else {
                hub.join(format!("{}-{}", base_name, n))
            };
            if !candidate.exists() {
                fs::rename(&self.path, &candidate)?;
                self.published = true;
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove staging directory");
        }
    }
}
