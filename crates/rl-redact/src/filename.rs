//! Secret-carrying file names.
//!
//! Files matched here are redacted without reading their content.

use once_cell::sync::Lazy;
use regex::Regex;

/// Exact base names that always hold credentials.
const SECRET_BASENAMES: &[&str] = &[
    ".env",
    "id_rsa",
    "id_dsa",
    "id_ecdsa",
    "id_ed25519",
    ".npmrc",
    ".pypirc",
    ".netrc",
    ".pgpass",
    "credentials.json",
    "service-account.json",
];

/// Extensions of key and certificate stores.
const SECRET_EXTENSIONS: &[&str] = &["pem", "key", "p12", "pfx", "jks", "keystore"];

static ENV_VARIANT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\.env\.[A-Za-z0-9_.-]+$").unwrap());

static SECRETS_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^secrets?\.(?:json|ya?ml|toml|env|ini)$").unwrap());

/// Return why a path is considered a secret carrier, or `None`.
///
/// Only the final path component is inspected. `.env.example` and
/// `.env.sample` templates are allowed.
pub fn secret_filename_reason(path: &str) -> Option<&'static str> {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);

    if base == ".env.example" || base == ".env.sample" || base == ".env.template" {
        return None;
    }
    if SECRET_BASENAMES.contains(&base) {
        return Some("well-known credential file");
    }
    if ENV_VARIANT.is_match(base) {
        return Some("environment file");
    }
    if SECRETS_FILE.is_match(base) {
        return Some("secrets file");
    }
    let ext = base
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    if SECRET_EXTENSIONS.contains(&ext.as_str()) {
        return Some("key or certificate store");
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_filenames() {
        assert!(secret_filename_reason(".env").is_some());
        assert!(secret_filename_reason("app/.env.production").is_some());
        assert!(secret_filename_reason("certs/server.pem").is_some());
        assert!(secret_filename_reason("deploy/tls.KEY").is_some());
        assert!(secret_filename_reason("home/.ssh/id_ed25519").is_some());
        assert!(secret_filename_reason("config/secrets.yaml").is_some());
        assert!(secret_filename_reason("gcp/credentials.json").is_some());
    }

    #[test]
    fn test_regular_filenames() {
        assert!(secret_filename_reason(".env.example").is_none());
        assert!(secret_filename_reason("src/keys.rs").is_none());
        assert!(secret_filename_reason("docs/secret-handling.md").is_none());
        assert!(secret_filename_reason("id_rsa.pub").is_none());
        assert!(secret_filename_reason("README.md").is_none());
    }

    #[test]
    fn test_windows_separators() {
        assert!(secret_filename_reason(r"config\.env").is_some());
    }
}
