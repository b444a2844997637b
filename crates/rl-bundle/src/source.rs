//! Access to the before/after trees.

use rl_snapshot::Snapshot;
use std::path::Path;

/// Snapshot and file access the producer relies on.
pub trait TreeSource {
    /// Scan a tree into a snapshot.
    fn snapshot(&self, root: &Path) -> rl_snapshot::Result<Snapshot>;

    /// Read one file by its relative key.
    fn read_file(&self, root: &Path, rel: &str) -> std::io::Result<Vec<u8>>;
}

/// Filesystem-backed tree source.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTree;

impl TreeSource for FsTree {
    fn snapshot(&self, root: &Path) -> rl_snapshot::Result<Snapshot> {
        rl_snapshot::scan(root)
    }

    fn read_file(&self, root: &Path, rel: &str) -> std::io::Result<Vec<u8>> {
        rl_snapshot::read_file(root, rel)
    }
}
