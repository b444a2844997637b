//! Secret detection in file contents.
//!
//! Detection is pattern based: provider token prefixes and PEM private-key
//! headers. There is no entropy analysis here, whole source files are too noisy
//! for it.

use crate::{filename, RedactionError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of detected secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretType {
    /// AWS access key (AKIA...)
    AwsAccessKey,
    /// GitHub personal access token
    GitHubToken,
    /// GitLab personal access token
    GitLabToken,
    /// Slack token (xoxb-...)
    SlackToken,
    /// Google API key (AIza...)
    GoogleApiKey,
    /// JSON Web Token
    Jwt,
    /// Private key (PEM format)
    PrivateKey,
    /// OpenAI/Anthropic API key
    AiApiKey,
    /// Matched a caller-supplied pattern
    Custom,
}

impl SecretType {
    /// Human readable label used in redaction notes.
    pub fn label(&self) -> &'static str {
        match self {
            SecretType::AwsAccessKey => "AWS access key",
            SecretType::GitHubToken => "GitHub token",
            SecretType::GitLabToken => "GitLab token",
            SecretType::SlackToken => "Slack token",
            SecretType::GoogleApiKey => "Google API key",
            SecretType::Jwt => "JSON Web Token",
            SecretType::PrivateKey => "private key",
            SecretType::AiApiKey => "AI API key",
            SecretType::Custom => "custom secret pattern",
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Detection pattern definition.
struct DetectionPattern {
    secret_type: SecretType,
    pattern: Lazy<Regex>,
}

// Pre-compiled detection patterns
static PATTERNS: [DetectionPattern; 8] = [
    DetectionPattern {
        secret_type: SecretType::PrivateKey,
        pattern: Lazy::new(|| Regex::new(r"-----BEGIN[A-Z ]*PRIVATE KEY-----").unwrap()),
    },
    DetectionPattern {
        secret_type: SecretType::AwsAccessKey,
        pattern: Lazy::new(|| Regex::new(r"\b(?:AKIA|ASIA)[0-9A-Z]{16}\b").unwrap()),
    },
    DetectionPattern {
        secret_type: SecretType::GitHubToken,
        pattern: Lazy::new(|| {
            Regex::new(r"\b(?:gh[pousr]_[A-Za-z0-9_]{36,}|github_pat_[A-Za-z0-9_]{22,})").unwrap()
        }),
    },
    DetectionPattern {
        secret_type: SecretType::GitLabToken,
        pattern: Lazy::new(|| Regex::new(r"\bglpat-[A-Za-z0-9\-_]{20,}").unwrap()),
    },
    DetectionPattern {
        secret_type: SecretType::SlackToken,
        pattern: Lazy::new(|| Regex::new(r"\bxox[baprs]-[A-Za-z0-9\-]{10,}").unwrap()),
    },
    DetectionPattern {
        secret_type: SecretType::GoogleApiKey,
        pattern: Lazy::new(|| Regex::new(r"\bAIza[0-9A-Za-z\-_]{35}").unwrap()),
    },
    DetectionPattern {
        secret_type: SecretType::AiApiKey,
        pattern: Lazy::new(|| {
            // OpenAI: sk-..., Anthropic: sk-ant-...
            Regex::new(r"\bsk-(?:ant-|proj-)?[A-Za-z0-9_-]{20,}").unwrap()
        }),
    },
    DetectionPattern {
        secret_type: SecretType::Jwt,
        pattern: Lazy::new(|| {
            Regex::new(r"\beyJ[A-Za-z0-9_-]{8,}\.eyJ[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}").unwrap()
        }),
    },
];

/// Secret detector for file names and file contents.
#[derive(Clone, Default)]
pub struct SecretDetector {
    /// Additional content patterns.
    custom_patterns: Vec<Regex>,
}

impl SecretDetector {
    /// Create a detector with the built-in patterns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom content pattern.
    pub fn add_pattern(&mut self, pattern: Regex) {
        self.custom_patterns.push(pattern);
    }

    /// Compile and add a custom content pattern.
    pub fn add_pattern_str(&mut self, pattern: &str) -> Result<()> {
        let re = Regex::new(pattern).map_err(|e| RedactionError::PatternError(e.to_string()))?;
        self.custom_patterns.push(re);
        Ok(())
    }

    /// Number of caller-supplied patterns.
    pub fn custom_pattern_count(&self) -> usize {
        self.custom_patterns.len()
    }

    /// Whether the path names a file that must never be embedded.
    pub fn is_secret_filename(&self, path: &str) -> bool {
        filename::secret_filename_reason(path).is_some()
    }

    /// Detect the first secret-looking pattern in `text`.
    pub fn detect(&self, text: &str) -> Option<SecretType> {
        for pattern in &PATTERNS {
            if pattern.pattern.is_match(text) {
                return Some(pattern.secret_type);
            }
        }

        if self.custom_patterns.iter().any(|p| p.is_match(text)) {
            return Some(SecretType::Custom);
        }

        None
    }
}

impl fmt::Debug for SecretDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretDetector")
            .field("custom_patterns", &self.custom_patterns.len())
            .finish()
    }
}
