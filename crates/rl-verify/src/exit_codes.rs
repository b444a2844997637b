//! Exit codes for the rl-verify CLI.
//!
//! These are a stable contract for CI pipelines: a non-zero code always
//! means the bundle must not be trusted.

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every check at the requested level passed
    Clean = 0,

    /// A check failed
    CheckFailed = 1,

    /// Invalid arguments
    ArgsError = 2,

    /// Target missing or unreadable
    IoError = 3,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::CheckFailed => "ERR_CHECK",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::CheckFailed.as_i32(), 1);
        assert_eq!(ExitCode::ArgsError.as_i32(), 2);
        assert_eq!(ExitCode::IoError.as_i32(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::CheckFailed.to_string(), "ERR_CHECK (1)");
        assert!(ExitCode::Clean.is_success());
        assert!(!ExitCode::IoError.is_success());
    }
}
