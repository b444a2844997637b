//! Verification report and its two renderings.

use crate::error::VerifyError;
use crate::exit_codes::ExitCode;
use serde::Serialize;

/// Requested verification depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Schema and part presence.
    Basic,
    /// Every invariant.
    Full,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Basic => write!(f, "basic"),
            Level::Full => write!(f, "full"),
        }
    }
}

/// One executed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
}

/// Ordered check results. Verification stops at the first failure.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub ok: bool,
    pub level: Level,
    pub checks: Vec<CheckOutcome>,
}

impl Report {
    pub fn new(level: Level) -> Self {
        Self {
            ok: true,
            level,
            checks: Vec::new(),
        }
    }

    pub fn pass(&mut self, name: &'static str, message: impl Into<String>) {
        self.checks.push(CheckOutcome {
            name,
            ok: true,
            message: message.into(),
            skipped: false,
        });
    }

    pub fn skip(&mut self, name: &'static str, message: impl Into<String>) {
        self.checks.push(CheckOutcome {
            name,
            ok: true,
            message: message.into(),
            skipped: true,
        });
    }

    pub fn fail(&mut self, name: &'static str, error: &VerifyError) {
        self.ok = false;
        self.checks.push(CheckOutcome {
            name,
            ok: false,
            message: error.to_string(),
            skipped: false,
        });
    }

    /// Record a check result; returns whether it passed.
    pub fn record(&mut self, name: &'static str, result: crate::Result<String>) -> bool {
        match result {
            Ok(message) => {
                self.pass(name, message);
                true
            }
            Err(e) => {
                self.fail(name, &e);
                false
            }
        }
    }

    pub fn first_failure(&self) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| !c.ok)
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.ok {
            ExitCode::Clean
        } else {
            ExitCode::CheckFailed
        }
    }

    /// `✅`/`❌` lines plus a closing verdict.
    pub fn render_human(&self) -> String {
        let mut out = String::new();
        for check in &self.checks {
            let mark = match (check.ok, check.skipped) {
                (true, false) => "✅",
                (true, true) => "⚠️",
                (false, _) => "❌",
            };
            out.push_str(&format!("{} {}: {}\n", mark, check.name, check.message));
        }
        if self.ok {
            out.push_str(&format!("✅ bundle OK (level {})\n", self.level));
        } else {
            out.push_str(&format!("❌ bundle FAILED (level {})\n", self.level));
        }
        out
    }

    pub fn to_json(&self) -> String {
        let mut json = serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            format!("{{\"ok\":false,\"error\":\"report serialization failed: {}\"}}", e)
        });
        json.push('\n');
        json
    }
}
