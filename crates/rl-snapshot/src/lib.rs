//! Directory snapshots and tree diffing for repolens.
//!
//! A [`Snapshot`] maps every regular file below a root (relative, `/`-separated
//! path) to its size, SHA-256 and review category. Two snapshots are compared
//! with [`diff`] to obtain the added/removed/changed sets that PR-Schau bundles
//! are built from.
//!
//! # Example
//!
//! ```no_run
//! use rl_snapshot::{diff, scan};
//! use std::path::Path;
//!
//! let old = scan(Path::new("before")).unwrap();
//! let new = scan(Path::new("after")).unwrap();
//! let delta = diff(&old, &new);
//! println!("{} added, {} changed", delta.added.len(), delta.changed.len());
//! ```

pub mod category;
pub mod diff;
pub mod error;
pub mod scan;

pub use category::{classify, ReviewCategory};
pub use diff::{diff, SnapshotDiff};
pub use error::{Result, SnapshotError};
pub use scan::{read_file, scan, Snapshot, SnapshotEntry};
