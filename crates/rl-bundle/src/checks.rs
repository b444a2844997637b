//! Bundle invariant checks.
//!
//! Each check returns the first violation it finds. The loader and the
//! producer's pre-publish self-check compose them in a fixed order so the
//! reported violation is deterministic.

use crate::manifest::{Artifact, BundleManifest, Completeness};
use crate::render::{contains_truncation_marker, zone_begin, MANDATORY_ZONES, ZONE_END};
use crate::{BundleError, BundleLimits, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// SHA-256 of a file, streamed.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
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

/// Resolve a basename inside the bundle directory, rejecting anything that
/// is not a plain file name.
pub fn resolve_member(dir: &Path, basename: &str) -> Result<PathBuf> {
    let plain = !basename.is_empty()
        && basename != "."
        && basename != ".."
        && !basename.contains('/')
        && !basename.contains('\\');
    if !plain {
        return Err(BundleError::IntegrityViolation(format!(
            "'{}' is not a plain file name inside the bundle",
            basename
        )));
    }
    Ok(dir.join(basename))
}

fn read_part_text(dir: &Path, name: &str) -> Result<String> {
    let path = resolve_member(dir, name)?;
    let bytes = std::fs::read(&path).map_err(|e| {
        BundleError::IntegrityViolation(format!("cannot read part '{}': {}", name, e))
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// `parts` is non-empty and contains the primary part.
pub fn check_primary_part(completeness: &Completeness) -> Result<()> {
    if completeness.parts.is_empty() {
        return Err(BundleError::IntegrityViolation(
            "completeness.parts is empty".to_string(),
        ));
    }
    if !completeness.parts.contains(&completeness.primary_part) {
        return Err(BundleError::IntegrityViolation(format!(
            "primary part '{}' is not listed in completeness.parts",
            completeness.primary_part
        )));
    }
    Ok(())
}

/// Every part exists on disk as a regular file.
pub fn check_parts_exist(completeness: &Completeness, dir: &Path) -> Result<()> {
    for part in &completeness.parts {
        let path = resolve_member(dir, part)?;
        if !path.is_file() {
            return Err(BundleError::IntegrityViolation(format!(
                "missing part file '{}'",
                part
            )));
        }
    }
    Ok(())
}

/// Every part has an artifact entry with the same basename.
pub fn check_parts_mapped(completeness: &Completeness, artifacts: &[Artifact]) -> Result<()> {
    for part in &completeness.parts {
        if !artifacts.iter().any(|a| &a.basename == part) {
            return Err(BundleError::IntegrityViolation(format!(
                "part '{}' has no matching artifact entry",
                part
            )));
        }
    }
    Ok(())
}

/// Recompute hashes of the selected artifacts.
///
/// With `require_hash`, a selected artifact without a declared hash is a
/// violation; otherwise it is skipped.
pub fn check_artifact_hashes<F>(
    artifacts: &[Artifact],
    dir: &Path,
    select: F,
    require_hash: bool,
) -> Result<()>
where
    F: Fn(&Artifact) -> bool,
{
    for artifact in artifacts.iter().filter(|a| select(a)) {
        let declared = match artifact.sha256.as_deref() {
            Some(h) => h,
            None if require_hash => {
                return Err(BundleError::IntegrityViolation(format!(
                    "artifact '{}' declares no sha256",
                    artifact.basename
                )))
            }
            None => continue,
        };
        let path = resolve_member(dir, &artifact.basename)?;
        let actual = hash_file(&path).map_err(|e| {
            BundleError::IntegrityViolation(format!(
                "cannot hash artifact '{}': {}",
                artifact.basename, e
            ))
        })?;
        if !declared.eq_ignore_ascii_case(&actual) {
            return Err(BundleError::IntegrityViolation(format!(
                "SHA256 mismatch for '{}': declared {}, actual {}",
                artifact.basename, declared, actual
            )));
        }
        debug!(artifact = %artifact.basename, "Artifact hash verified");
    }
    Ok(())
}

/// No truncation markers unless the bundle is an incomplete truncate bundle.
pub fn check_truncation_guard(completeness: &Completeness, dir: &Path) -> Result<()> {
    if completeness.allows_truncation() {
        return Ok(());
    }
    for part in &completeness.parts {
        let text = read_part_text(dir, part)?;
        if contains_truncation_marker(&text) {
            return Err(BundleError::GuardViolation(format!(
                "truncation marker found in '{}' although policy is {:?} and is_complete={}",
                part, completeness.policy, completeness.is_complete
            )));
        }
    }
    Ok(())
}

/// The primary part carries every mandatory zone.
pub fn check_mandatory_zones(completeness: &Completeness, dir: &Path) -> Result<()> {
    let text = read_part_text(dir, &completeness.primary_part)?;
    for zone in MANDATORY_ZONES {
        if !text.contains(&zone_begin(zone)) {
            return Err(BundleError::GuardViolation(format!(
                "mandatory zone '{}' missing from primary part '{}'",
                zone, completeness.primary_part
            )));
        }
    }
    if !text.contains(ZONE_END) {
        return Err(BundleError::GuardViolation(format!(
            "primary part '{}' has no closing zone marker",
            completeness.primary_part
        )));
    }
    Ok(())
}

/// Emitted bytes match the parts on disk and stay within the overhead
/// bound of the expected bytes. Skipped for incomplete bundles.
pub fn check_byte_accounting(
    completeness: &Completeness,
    dir: &Path,
    limits: &BundleLimits,
) -> Result<()> {
    if !completeness.is_complete {
        debug!("Bundle marked incomplete, byte accounting skipped");
        return Ok(());
    }

    let mut on_disk = 0u64;
    for part in &completeness.parts {
        let path = resolve_member(dir, part)?;
        on_disk += std::fs::metadata(&path)
            .map_err(|e| {
                BundleError::IntegrityViolation(format!("cannot stat part '{}': {}", part, e))
            })?
            .len();
    }
    if on_disk != completeness.emitted_bytes {
        return Err(BundleError::ConsistencyViolation(format!(
            "emitted_bytes mismatch: declared {}, parts on disk total {}",
            completeness.emitted_bytes, on_disk
        )));
    }

    let diff = completeness.emitted_bytes.abs_diff(completeness.expected_bytes);
    let allowed = limits.allowed_overhead(completeness.expected_bytes);
    if diff > allowed {
        return Err(BundleError::ConsistencyViolation(format!(
            "byte overhead {} exceeds bound {} (expected {}, emitted {})",
            diff, allowed, completeness.expected_bytes, completeness.emitted_bytes
        )));
    }
    Ok(())
}

/// Every invariant the producer can establish before publishing, in order.
pub fn check_all(manifest: &BundleManifest, dir: &Path, limits: &BundleLimits) -> Result<()> {
    let completeness = manifest.completeness()?;
    check_primary_part(completeness)?;
    check_parts_exist(completeness, dir)?;
    check_parts_mapped(completeness, &manifest.artifacts)?;
    check_artifact_hashes(&manifest.artifacts, dir, |a| a.role.is_markdown_part(), true)?;
    check_artifact_hashes(&manifest.artifacts, dir, |a| !a.role.is_markdown_part(), false)?;
    check_truncation_guard(completeness, dir)?;
    check_mandatory_zones(completeness, dir)?;
    check_byte_accounting(completeness, dir, limits)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ArtifactRole, SplitPolicy};
    use std::fs;
    use tempfile::TempDir;

    const PRIMARY: &str = "<!-- zone:begin type=summary -->\n<!-- zone:end -->\n<!-- zone:begin type=files_manifest -->\n<!-- zone:end -->\n";

    fn completeness(parts: &[&str], expected: u64, emitted: u64) -> Completeness {
        Completeness {
            is_complete: true,
            policy: SplitPolicy::Split,
            parts: parts.iter().map(|s| s.to_string()).collect(),
            primary_part: "review.md".into(),
            expected_bytes: expected,
            emitted_bytes: emitted,
        }
    }

    #[test]
    fn test_hash_file_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("review.md");
        fs::write(&path, "hello").unwrap();
        let a = hash_file(&path).unwrap();
        let b = hash_file(&path).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Artifact::compute_checksum(b"hello"));
    }

    #[test]
    fn test_primary_part_checks() {
        assert!(check_primary_part(&completeness(&["review.md"], 0, 0)).is_ok());
        assert!(matches!(
            check_primary_part(&completeness(&[], 0, 0)),
            Err(BundleError::IntegrityViolation(m)) if m.contains("empty")
        ));
        assert!(matches!(
            check_primary_part(&completeness(&["review_part2.md"], 0, 0)),
            Err(BundleError::IntegrityViolation(m)) if m.contains("primary part")
        ));
    }

    #[test]
    fn test_resolve_member_rejects_paths() {
        let dir = Path::new("/tmp/bundle");
        assert!(resolve_member(dir, "review.md").is_ok());
        assert!(resolve_member(dir, "../etc/passwd").is_err());
        assert!(resolve_member(dir, "sub/review.md").is_err());
        assert!(resolve_member(dir, "..").is_err());
        assert!(resolve_member(dir, "").is_err());
    }

    #[test]
    fn test_parts_mapped() {
        let c = completeness(&["review.md", "review_part2.md"], 0, 0);
        let artifacts = vec![Artifact::new(ArtifactRole::CanonicalMd, "review.md", "text/markdown")];
        assert!(matches!(
            check_parts_mapped(&c, &artifacts),
            Err(BundleError::IntegrityViolation(m)) if m.contains("review_part2.md")
        ));
    }

    #[test]
    fn test_hash_mismatch_and_missing_hash() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("review.md"), PRIMARY).unwrap();

        let good = vec![Artifact::new(ArtifactRole::CanonicalMd, "review.md", "text/markdown")
            .with_sha256(Artifact::compute_checksum(PRIMARY.as_bytes()))];
        assert!(check_artifact_hashes(&good, dir.path(), |_| true, true).is_ok());

        let bad = vec![Artifact::new(ArtifactRole::CanonicalMd, "review.md", "text/markdown")
            .with_sha256("0".repeat(64))];
        assert!(matches!(
            check_artifact_hashes(&bad, dir.path(), |_| true, true),
            Err(BundleError::IntegrityViolation(m)) if m.contains("SHA256 mismatch")
        ));

        let missing = vec![Artifact::new(ArtifactRole::CanonicalMd, "review.md", "text/markdown")];
        assert!(check_artifact_hashes(&missing, dir.path(), |_| true, true).is_err());
        assert!(check_artifact_hashes(&missing, dir.path(), |_| true, false).is_ok());
    }

    #[test]
    fn test_truncation_guard_respects_policy() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("review.md"), "Content truncated at 100 bytes").unwrap();

        let mut c = completeness(&["review.md"], 0, 0);
        assert!(matches!(
            check_truncation_guard(&c, dir.path()),
            Err(BundleError::GuardViolation(m)) if m.contains("truncation marker")
        ));

        c.policy = SplitPolicy::Truncate;
        c.is_complete = false;
        assert!(check_truncation_guard(&c, dir.path()).is_ok());
    }

    #[test]
    fn test_mandatory_zones() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("review.md"), "<!-- zone:begin type=summary -->\n<!-- zone:end -->\n").unwrap();
        let c = completeness(&["review.md"], 0, 0);
        assert!(matches!(
            check_mandatory_zones(&c, dir.path()),
            Err(BundleError::GuardViolation(m)) if m.contains("files_manifest")
        ));

        fs::write(dir.path().join("review.md"), PRIMARY).unwrap();
        assert!(check_mandatory_zones(&c, dir.path()).is_ok());
    }

    #[test]
    fn test_byte_accounting() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("review.md"), "12345").unwrap();
        let limits = BundleLimits::default();

        assert!(check_byte_accounting(&completeness(&["review.md"], 5, 5), dir.path(), &limits).is_ok());
        assert!(matches!(
            check_byte_accounting(&completeness(&["review.md"], 5, 6), dir.path(), &limits),
            Err(BundleError::ConsistencyViolation(m)) if m.contains("emitted_bytes")
        ));
        assert!(matches!(
            check_byte_accounting(&completeness(&["review.md"], 100_000, 5), dir.path(), &limits),
            Err(BundleError::ConsistencyViolation(m)) if m.contains("overhead")
        ));

        let mut incomplete = completeness(&["review.md"], 100_000, 6);
        incomplete.is_complete = false;
        assert!(check_byte_accounting(&incomplete, dir.path(), &limits).is_ok());
    }
}
