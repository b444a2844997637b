//! rl-verify against bundles written by the real producer.

use assert_cmd::Command;
use predicates::prelude::*;
use rl_bundle::{BundleOutcome, BundleWriter, ProducerConfig};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn rl_verify() -> Command {
    Command::cargo_bin("rl-verify").expect("rl-verify binary should exist")
}

fn write_file(root: &Path, rel: &str, data: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, data).unwrap();
}

fn text_of_size(tag: &str, bytes: usize) -> String {
    let mut out = String::with_capacity(bytes + 64);
    let mut i = 0;
    while out.len() < bytes {
        out.push_str(&format!("{} line {:06} lorem ipsum dolor sit amet\n", tag, i));
        i += 1;
    }
    out.truncate(bytes);
    out
}

/// Small change plus two 150 KiB files, so the bundle is split.
fn produce_split_bundle(tmp: &TempDir) -> BundleOutcome {
    let old = tmp.path().join("old");
    let new = tmp.path().join("new");
    write_file(&old, "file1.txt", "content1");
    write_file(&new, "file1.txt", "content1_modified");
    write_file(&new, "file2.txt", "content2");
    write_file(&new, "docs/big_a.md", &text_of_size("a", 150 * 1024));
    write_file(&new, "docs/big_b.md", &text_of_size("b", 150 * 1024));

    BundleWriter::new(ProducerConfig::default())
        .produce(&old, &new, "demo", &tmp.path().join("hub"))
        .expect("produce bundle")
}

#[test]
fn produced_split_bundle_passes_full_verification() {
    let tmp = TempDir::new().unwrap();
    let outcome = produce_split_bundle(&tmp);
    assert!(outcome.dir.join("review_part2.md").is_file());

    let output = rl_verify()
        .args(["verify", "--json"])
        .arg(&outcome.dir)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["ok"], true);
    let checks = report["checks"].as_array().unwrap();
    assert_eq!(checks.len(), 10);
    assert!(checks.iter().all(|c| c["ok"] == true && c.get("skipped").is_none()));
}

#[test]
fn produced_bundle_passes_basic_verification() {
    let tmp = TempDir::new().unwrap();
    let outcome = produce_split_bundle(&tmp);
    rl_verify()
        .args(["verify", "--level", "basic"])
        .arg(outcome.dir.join("bundle.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("✅ schema"));
}

#[test]
fn appending_to_produced_review_md_fails_full_verification() {
    let tmp = TempDir::new().unwrap();
    let outcome = produce_split_bundle(&tmp);

    rl_verify()
        .arg("verify")
        .arg(&outcome.dir)
        .assert()
        .success();

    let mut review = fs::OpenOptions::new()
        .append(true)
        .open(outcome.dir.join("review.md"))
        .unwrap();
    review.write_all(b"\ntamper\n").unwrap();

    rl_verify()
        .args(["verify", "--level", "full"])
        .arg(&outcome.dir)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("❌ sha256"))
        .stdout(predicate::str::contains("SHA256 mismatch for 'review.md'"));
}

#[test]
fn tampered_delta_json_fails_full_verification() {
    let tmp = TempDir::new().unwrap();
    let outcome = produce_split_bundle(&tmp);
    fs::write(outcome.dir.join("delta.json"), "{}").unwrap();

    rl_verify()
        .arg("verify")
        .arg(&outcome.dir)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("SHA256 mismatch for 'delta.json'"));
}
