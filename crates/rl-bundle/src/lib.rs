//! PR-Schau review bundles for repolens.
//!
//! A bundle packages the difference between two snapshots of a repository
//! into a self-describing, integrity-checked directory that a reviewer (human
//! or agent) can consume without access to either tree.
//!
//! # Bundle Layout
//!
//! ```text
//! <repo>_pr-schau_<YYYYMMDD-HHMMSS>/
//!   bundle.json        manifest, written last
//!   delta.json         machine-readable change set
//!   review.md          primary part (summary + files manifest zones)
//!   review_part2.md    continuation parts, when the payload is split
//! ```
//!
//! Every Markdown part is listed in `bundle.json` with its SHA-256. The
//! manifest also records expected (logical) and emitted (on-disk) byte
//! counts so that silent truncation is detectable.
//!
//! # Example
//!
//! ```no_run
//! use rl_bundle::{load_bundle, BundleWriter, ProducerConfig, VerifyLevel};
//! use std::path::Path;
//!
//! let writer = BundleWriter::new(ProducerConfig::default());
//! let outcome = writer
//!     .produce(Path::new("old"), Path::new("new"), "demo", Path::new("hub"))
//!     .unwrap();
//!
//! let loaded = load_bundle(&outcome.dir, true, VerifyLevel::Full).unwrap();
//! println!("{}", loaded.read_primary().unwrap());
//! ```

pub mod checks;
pub mod config;
pub mod delta;
pub mod error;
pub mod manifest;
pub mod reader;
pub mod render;
pub mod schema;
pub mod source;
pub mod split;
pub mod writer;

pub use config::{BundleLimits, GeneratorInfo, ProducerConfig};
pub use delta::{load_delta, DeltaManifest, FileEntry, FileStatus, DELTA_KIND};
pub use error::{BundleError, Result, ViolationKind};
pub use manifest::{
    Artifact, ArtifactRole, BundleManifest, Completeness, SplitPolicy, BUNDLE_KIND,
    BUNDLE_VERSION, MANIFEST_FILE_NAME, PRIMARY_PART,
};
pub use reader::{load_bundle, BundleLoader, LoadedBundle, VerifyLevel};
pub use schema::SchemaValidator;
pub use source::{FsTree, TreeSource};
pub use writer::{BundleOutcome, BundleWriter};
