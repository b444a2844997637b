//! Snapshot comparison.

use crate::Snapshot;

/// Added/removed/changed path sets between two snapshots, each sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Paths only present in the new snapshot.
    pub added: Vec<String>,
    /// Paths only present in the old snapshot.
    pub removed: Vec<String>,
    /// Paths present in both whose size or hash differ.
    pub changed: Vec<String>,
}

impl SnapshotDiff {
    /// True when nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Total number of touched paths.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}

/// Compare two snapshots.
pub fn diff(old: &Snapshot, new: &Snapshot) -> SnapshotDiff {
    let mut out = SnapshotDiff::default();

    for (path, entry) in new {
        match old.get(path) {
            None => out.added.push(path.clone()),
            Some(prev) if prev.size != entry.size || prev.sha256 != entry.sha256 => {
                out.changed.push(path.clone())
            }
            Some(_) => {}
        }
    }

    out.removed = old
        .keys()
        .filter(|path| !new.contains_key(*path))
        .cloned()
        .collect();

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ReviewCategory, SnapshotEntry};

    fn entry(size: u64, hash: &str) -> SnapshotEntry {
        SnapshotEntry {
            size,
            sha256: Some(hash.to_string()),
            category: ReviewCategory::Other,
        }
    }

    #[test]
    fn test_diff_sets() {
        let mut old = Snapshot::new();
        old.insert("same.txt".into(), entry(1, "a"));
        old.insert("gone.txt".into(), entry(1, "b"));
        old.insert("edit.txt".into(), entry(3, "c"));
        old.insert("grow.txt".into(), entry(3, "d"));

        let mut new = Snapshot::new();
        new.insert("same.txt".into(), entry(1, "a"));
        new.insert("edit.txt".into(), entry(3, "x"));
        new.insert("grow.txt".into(), entry(4, "d"));
        new.insert("fresh.txt".into(), entry(1, "e"));

        let d = diff(&old, &new);
        assert_eq!(d.added, vec!["fresh.txt"]);
        assert_eq!(d.removed, vec!["gone.txt"]);
        assert_eq!(d.changed, vec!["edit.txt", "grow.txt"]);
        assert_eq!(d.len(), 4);
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let mut snap = Snapshot::new();
        snap.insert("a".into(), entry(1, "a"));
        assert!(diff(&snap, &snap.clone()).is_empty());
    }
}
