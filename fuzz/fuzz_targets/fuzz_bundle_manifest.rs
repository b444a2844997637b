//! Fuzz target for strict bundle.json parsing.
//!
//! Manifests are read from directories that may come from anywhere, so the
//! strict parser must reject garbage with an error and never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rl_bundle::BundleManifest;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(manifest) = BundleManifest::from_json_strict(text) {
            let _ = manifest.to_json();
            let _ = manifest.completeness();
        }
    }
});
