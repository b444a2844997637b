//! Independent verifier for PR-Schau review bundles.
//!
//! Reads nothing but the on-disk contract: `bundle.json`, the Markdown parts
//! and any other artifact that declares a hash. Nothing here depends on the
//! producer crates.
//!
//! ```no_run
//! use rl_verify::{verify, Level};
//!
//! let report = verify("hub/demo_pr-schau_20260115-143022".as_ref(), Level::Full)?;
//! print!("{}", report.render_human());
//! std::process::exit(report.exit_code().as_i32());
//! # Ok::<(), rl_verify::VerifyError>(())
//! ```

pub mod bundle;
pub mod checks;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod report;
pub mod schema;

pub use error::{Result, VerifyError};
pub use exit_codes::ExitCode;
pub use report::{CheckOutcome, Level, Report};

/// Verify the bundle at `target` (directory or `bundle.json` path).
pub fn verify(target: &std::path::Path, level: Level) -> Result<Report> {
    checks::run(target, level)
}
