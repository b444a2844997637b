//! Logging setup for the verifier CLI.
//!
//! stdout carries the report; every log line goes to stderr. Configuration
//! comes from `RL_LOG` (level), `RL_LOG_FORMAT` (human/jsonl) and the
//! `-v`/`-q` flags. `RUST_LOG`, when set, replaces the filter entirely.

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// Machine-parseable JSON lines.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "console" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    /// Warnings only (default).
    #[default]
    Warn,
    Error,
    /// Completely silent.
    Off,
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" | "none" | "quiet" => Ok(LogLevel::Off),
            _ => Err(format!("unknown log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Off => write!(f, "off"),
        }
    }
}

impl LogLevel {
    /// Level after `-v` was given `count` times.
    pub fn raised_by(self, count: u8) -> Self {
        match (self, count) {
            (level, 0) => level,
            (_, 1) => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Whether to include timestamps in human output.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: LogLevel::Warn,
            format: LogFormat::Human,
            timestamps: false,
        }
    }
}

impl LogConfig {
    /// Read `RL_LOG` and `RL_LOG_FORMAT`; unparsable values are ignored.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("RL_LOG").ok().as_deref(),
            std::env::var("RL_LOG_FORMAT").ok().as_deref(),
        )
    }

    fn from_vars(level: Option<&str>, format: Option<&str>) -> Self {
        let mut config = LogConfig::default();
        if let Some(level) = level.and_then(|v| v.parse().ok()) {
            config.level = level;
        }
        if let Some(format) = format.and_then(|v| v.parse().ok()) {
            config.format = format;
        }
        config
    }

    /// Apply `-v` / `-q` flags. `-q` wins.
    pub fn with_verbosity(mut self, verbose: u8, quiet: bool) -> Self {
        self.level = if quiet {
            LogLevel::Off
        } else {
            self.level.raised_by(verbose)
        };
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }
}

/// Initialize the global subscriber on stderr.
///
/// Calling it twice is harmless: the second call leaves the first subscriber
/// in place.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rl_verify={}", config.level)));

    let result = match config.format {
        LogFormat::Human => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("rl-verify: logging already initialized: {}", e);
    }
}
