//! Tree scanning.

use crate::{classify, ReviewCategory, Result, SnapshotError};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// One scanned file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    /// Size in bytes.
    pub size: u64,
    /// SHA-256 of the content (64 hex chars), `None` if the file could not be read.
    pub sha256: Option<String>,
    /// Review category derived from the path.
    pub category: ReviewCategory,
}

/// Relative path (`/`-separated) to entry, ordered by path.
pub type Snapshot = BTreeMap<String, SnapshotEntry>;

/// Scan a directory tree.
///
/// Symlinks are not followed. A file that cannot be read keeps its size and
/// gets no hash; a directory that cannot be listed aborts the scan.
pub fn scan(root: &Path) -> Result<Snapshot> {
    if !root.is_dir() {
        return Err(SnapshotError::NotADirectory(root.to_path_buf()));
    }

    let mut snapshot = Snapshot::new();
    let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = fs::read_dir(&dir).map_err(|source| SnapshotError::ReadDir {
            path: dir.clone(),
            source,
        })?;

        for entry in entries {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let path = entry.path();

            if file_type.is_dir() {
                let name = entry.file_name();
                if SKIPPED_DIRS.iter().any(|s| name == *s) {
                    continue;
                }
                stack.push(path);
            } else if file_type.is_file() {
                let rel = relative_key(root, &path);
                let size = entry.metadata()?.len();
                let sha256 = match hash_file(&path) {
                    Ok(h) => Some(h),
                    Err(e) => {
                        warn!(path = %rel, error = %e, "Could not hash file");
                        None
                    }
                };
                let category = classify(&rel);
                snapshot.insert(
                    rel,
                    SnapshotEntry {
                        size,
                        sha256,
                        category,
                    },
                );
            }
        }
    }

    debug!(root = %root.display(), files = snapshot.len(), "Tree scanned");
    Ok(snapshot)
}

/// Read a file below `root` by its relative key.
pub fn read_file(root: &Path, rel: &str) -> std::io::Result<Vec<u8>> {
    fs::read(root.join(rel))
}

fn relative_key(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
