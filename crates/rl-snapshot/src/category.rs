//! Review categories for changed files.
//!
//! Categories drive the order in which files appear in a review: schema
//! changes first, then CI, config, docs, code and everything else. The
//! priority is fixed and not user-configurable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Review category of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewCategory {
    /// JSON schemas, SQL migrations, protobuf/GraphQL definitions
    Schema,
    /// CI pipelines: .github/workflows, .gitlab-ci.yml, Jenkinsfile
    Ci,
    /// Configuration and manifests: Cargo.toml, *.yaml, *.ini, Dockerfile
    Config,
    /// Documentation: *.md, *.rst, docs/
    Docs,
    /// Source code
    Code,
    /// Anything unrecognized
    Other,
}

impl ReviewCategory {
    /// Review priority (lower is reviewed first).
    pub fn priority(self) -> u8 {
        match self {
            ReviewCategory::Schema => 0,
            ReviewCategory::Ci => 1,
            ReviewCategory::Config => 2,
            ReviewCategory::Docs => 3,
            ReviewCategory::Code => 4,
            ReviewCategory::Other => 5,
        }
    }

    /// Stable string form used in `delta.json`.
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewCategory::Schema => "schema",
            ReviewCategory::Ci => "ci",
            ReviewCategory::Config => "config",
            ReviewCategory::Docs => "docs",
            ReviewCategory::Code => "code",
            ReviewCategory::Other => "other",
        }
    }
}

impl fmt::Display for ReviewCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const CODE_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "jsx", "ts", "tsx", "go", "java", "kt", "c", "h", "cc", "cpp", "hpp", "cs",
    "rb", "php", "swift", "m", "scala", "sh", "bash", "zsh", "ps1", "lua", "pl", "r", "dart",
    "ex", "exs", "erl", "hs", "ml", "clj", "vue", "svelte", "css", "scss", "html",
];

const CONFIG_EXTENSIONS: &[&str] = &[
    "toml", "yaml", "yml", "ini", "cfg", "conf", "json", "lock", "properties", "env",
];

const CONFIG_FILE_NAMES: &[&str] = &[
    "Dockerfile",
    "Makefile",
    "Justfile",
    "docker-compose.yml",
    "package.json",
    "requirements.txt",
    ".gitignore",
    ".editorconfig",
];

/// Classify a relative path into a review category.
///
/// Accepts `/`-separated relative paths as produced by [`crate::scan`].
pub fn classify(path: &str) -> ReviewCategory {
    let lower = path.to_ascii_lowercase();
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();

    if lower.ends_with(".schema.json")
        || lower.contains("/schemas/")
        || lower.starts_with("schemas/")
        || lower.contains("migrations/")
        || matches!(ext.as_str(), "sql" | "proto" | "graphql" | "gql" | "avsc" | "xsd")
    {
        return ReviewCategory::Schema;
    }

    if lower.starts_with(".github/workflows/")
        || lower.starts_with(".circleci/")
        || lower == ".gitlab-ci.yml"
        || lower == ".travis.yml"
        || lower == "azure-pipelines.yml"
        || file_name == "Jenkinsfile"
    {
        return ReviewCategory::Ci;
    }

    if CONFIG_FILE_NAMES.contains(&file_name) || CONFIG_EXTENSIONS.contains(&ext.as_str()) {
        return ReviewCategory::Config;
    }

    if matches!(ext.as_str(), "md" | "rst" | "adoc" | "txt")
        || lower.starts_with("docs/")
        || lower.contains("/docs/")
        || file_name.eq_ignore_ascii_case("LICENSE")
    {
        return ReviewCategory::Docs;
    }

    if CODE_EXTENSIONS.contains(&ext.as_str()) {
        return ReviewCategory::Code;
    }

    ReviewCategory::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_schema() {
        assert_eq!(classify("schemas/bundle.schema.json"), ReviewCategory::Schema);
        assert_eq!(classify("db/migrations/001_init.sql"), ReviewCategory::Schema);
        assert_eq!(classify("api/service.proto"), ReviewCategory::Schema);
    }

    #[test]
    fn test_classify_ci() {
        assert_eq!(classify(".github/workflows/ci.yml"), ReviewCategory::Ci);
        assert_eq!(classify(".gitlab-ci.yml"), ReviewCategory::Ci);
        assert_eq!(classify("Jenkinsfile"), ReviewCategory::Ci);
    }

    #[test]
    fn test_classify_config_docs_code() {
        assert_eq!(classify("Cargo.toml"), ReviewCategory::Config);
        assert_eq!(classify("deploy/Dockerfile"), ReviewCategory::Config);
        assert_eq!(classify("README.md"), ReviewCategory::Docs);
        assert_eq!(classify("docs/guide/intro.html"), ReviewCategory::Docs);
        assert_eq!(classify("src/main.rs"), ReviewCategory::Code);
        assert_eq!(classify("assets/logo.png"), ReviewCategory::Other);
        assert_eq!(classify("noextension"), ReviewCategory::Other);
    }

    #[test]
    fn test_priority_order_is_fixed() {
        let mut cats = vec![
            ReviewCategory::Other,
            ReviewCategory::Code,
            ReviewCategory::Docs,
            ReviewCategory::Config,
            ReviewCategory::Ci,
            ReviewCategory::Schema,
        ];
        cats.sort_by_key(|c| c.priority());
        assert_eq!(cats[0], ReviewCategory::Schema);
        assert_eq!(cats[5], ReviewCategory::Other);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ReviewCategory::Ci.to_string(), "ci");
        assert_eq!(ReviewCategory::Schema.as_str(), "schema");
    }
}
