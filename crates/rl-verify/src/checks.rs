//! Individual verification checks and the ordered runner.
//!
//! Every check returns a short success message or the violation it found.
//! [`run`] stops at the first failure.

use crate::bundle::{
    allowed_overhead, zone_begin, BundleLocation, Completeness, Manifest, MANDATORY_ZONES,
    TRUNCATION_MARKERS, ZONE_END,
};
use crate::error::{Result, VerifyError};
use crate::report::{Level, Report};
use crate::schema::{self, SchemaCheck};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
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

fn read_text(loc: &BundleLocation, name: &str) -> Result<String> {
    let path = loc.member(name)?;
    let bytes = std::fs::read(&path)
        .map_err(|e| VerifyError::Integrity(format!("cannot read part '{}': {}", name, e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Schema validation; `Ok(None)` when no validator is available.
pub fn schema_check(value: &serde_json::Value) -> Result<Option<String>> {
    match schema::check(value) {
        SchemaCheck::Valid => Ok(Some("bundle.json matches the bundle schema".to_string())),
        SchemaCheck::Invalid(errors) => Err(VerifyError::Schema(format!(
            "bundle.json does not match schema: {}",
            errors.join("; ")
        ))),
        SchemaCheck::Unavailable(reason) => {
            warn!(reason = %reason, "Schema validation skipped");
            Ok(None)
        }
    }
}

pub fn parts_exist(c: &Completeness, loc: &BundleLocation) -> Result<String> {
    if c.parts.is_empty() {
        return Err(VerifyError::Integrity(
            "completeness.parts is empty".to_string(),
        ));
    }
    for part in &c.parts {
        if !loc.member(part)?.is_file() {
            return Err(VerifyError::Integrity(format!(
                "missing part file '{}'",
                part
            )));
        }
    }
    Ok(format!("{} part file(s) present", c.parts.len()))
}

pub fn primary_part(c: &Completeness) -> Result<String> {
    if !c.parts.contains(&c.primary_part) {
        return Err(VerifyError::Integrity(format!(
            "primary part '{}' is not listed in completeness.parts",
            c.primary_part
        )));
    }
    Ok(format!("primary part '{}' is listed", c.primary_part))
}

pub fn parts_mapped(manifest: &Manifest) -> Result<String> {
    for part in &manifest.completeness.parts {
        if !manifest.artifacts.iter().any(|a| &a.basename == part) {
            return Err(VerifyError::Integrity(format!(
                "part '{}' has no matching artifact entry",
                part
            )));
        }
    }
    Ok("every part has an artifact entry".to_string())
}

/// Recompute SHA-256 for every artifact that declares one.
pub fn artifact_hashes(manifest: &Manifest, loc: &BundleLocation) -> Result<String> {
    let mut checked = 0usize;
    for artifact in &manifest.artifacts {
        let Some(declared) = artifact.sha256.as_deref() else {
            continue;
        };
        let path = loc.member(&artifact.basename)?;
        let actual = sha256_file(&path).map_err(|e| {
            VerifyError::Integrity(format!(
                "cannot hash artifact '{}': {}",
                artifact.basename, e
            ))
        })?;
        if !declared.eq_ignore_ascii_case(&actual) {
            return Err(VerifyError::Integrity(format!(
                "SHA256 mismatch for '{}': declared {}, actual {}",
                artifact.basename, declared, actual
            )));
        }
        debug!(artifact = %artifact.basename, role = %artifact.role, "Hash matches");
        checked += 1;
    }
    Ok(format!("{} artifact hash(es) match", checked))
}

pub fn truncation_guard(c: &Completeness, loc: &BundleLocation) -> Result<String> {
    if c.allows_truncation() {
        return Ok("incomplete truncate bundle, markers allowed".to_string());
    }
    for part in &c.parts {
        let text = read_text(loc, part)?;
        if let Some(marker) = TRUNCATION_MARKERS.iter().find(|m| text.contains(*m)) {
            return Err(VerifyError::Guard(format!(
                "truncation marker {:?} found in '{}' (policy {}, is_complete={})",
                marker, part, c.policy, c.is_complete
            )));
        }
    }
    Ok("no truncation markers".to_string())
}

pub fn mandatory_zones(c: &Completeness, loc: &BundleLocation) -> Result<String> {
    let text = read_text(loc, &c.primary_part)?;
    for zone in MANDATORY_ZONES {
        if !text.contains(&zone_begin(zone)) {
            return Err(VerifyError::Guard(format!(
                "mandatory zone '{}' missing from primary part '{}'",
                zone, c.primary_part
            )));
        }
    }
    if !text.contains(ZONE_END) {
        return Err(VerifyError::Guard(format!(
            "primary part '{}' has no closing zone marker",
            c.primary_part
        )));
    }
    Ok(format!("zones {} present", MANDATORY_ZONES.join(", ")))
}

pub fn emitted_bytes(c: &Completeness, loc: &BundleLocation) -> Result<String> {
    let mut total = 0u64;
    for part in &c.parts {
        let path = loc.member(part)?;
        total += std::fs::metadata(&path)
            .map_err(|e| VerifyError::Integrity(format!("cannot stat part '{}': {}", part, e)))?
            .len();
    }
    if total != c.emitted_bytes {
        return Err(VerifyError::Consistency(format!(
            "emitted_bytes mismatch: declared {}, parts on disk total {}",
            c.emitted_bytes, total
        )));
    }
    Ok(format!("emitted_bytes = {}", total))
}

pub fn byte_overhead(c: &Completeness) -> Result<String> {
    let diff = c.emitted_bytes.abs_diff(c.expected_bytes);
    let allowed = allowed_overhead(c.expected_bytes);
    if diff > allowed {
        return Err(VerifyError::Consistency(format!(
            "byte overhead {} exceeds bound {} (expected {}, emitted {})",
            diff, allowed, c.expected_bytes, c.emitted_bytes
        )));
    }
    Ok(format!("overhead {} within bound {}", diff, allowed))
}

/// Verify the bundle at `target`.
///
/// Check failures end up in the returned [`Report`]. `Err` is reserved for a
/// missing or unreadable `bundle.json`.
pub fn run(target: &Path, level: Level) -> Result<Report> {
    let loc = BundleLocation::resolve(target)?;
    debug!(dir = %loc.dir.display(), level = %level, "Verifying bundle");
    let mut report = Report::new(level);

    let value = match loc.read_manifest_value() {
        Ok(v) => v,
        Err(e) if e.is_check_failure() => {
            report.fail("parse", &e);
            return Ok(report);
        }
        Err(e) => return Err(e),
    };
    report.pass("parse", "bundle.json parsed");

    match schema_check(&value) {
        Ok(Some(message)) => report.pass("schema", message),
        Ok(None) => report.skip("schema", "skipped, no schema validator available"),
        Err(e) => {
            report.fail("schema", &e);
            return Ok(report);
        }
    }

    let manifest: Manifest = match serde_json::from_value(value) {
        Ok(m) => m,
        Err(e) => {
            report.fail(
                "manifest",
                &VerifyError::Schema(format!("bundle.json is not a bundle manifest: {}", e)),
            );
            return Ok(report);
        }
    };
    let c = &manifest.completeness;

    if !report.record("parts_exist", parts_exist(c, &loc)) {
        return Ok(report);
    }
    if level < Level::Full {
        info!(checks = report.checks.len(), "Basic verification passed");
        return Ok(report);
    }

    if !report.record("primary_part", primary_part(c))
        || !report.record("parts_mapped", parts_mapped(&manifest))
        || !report.record("sha256", artifact_hashes(&manifest, &loc))
        || !report.record("truncation_guard", truncation_guard(c, &loc))
        || !report.record("mandatory_zones", mandatory_zones(c, &loc))
    {
        return Ok(report);
    }

    if c.is_complete {
        if !report.record("emitted_bytes", emitted_bytes(c, &loc))
            || !report.record("byte_overhead", byte_overhead(c))
        {
            return Ok(report);
        }
    } else {
        report.skip("emitted_bytes", "skipped, bundle is incomplete");
        report.skip("byte_overhead", "skipped, bundle is incomplete");
    }

    info!(checks = report.checks.len(), "Full verification passed");
    Ok(report)
}
