//! Logging configuration.
//!
//! Sources, lowest to highest precedence:
//! - built-in defaults (human format, `info`, timestamps on)
//! - `FW_LOG`, `FW_LOG_FORMAT`, `FW_LOG_TIMESTAMPS`
//! - CLI flags (`-v`, `-q`)
//!
//! `RUST_LOG`, when set, replaces the level filter entirely in
//! [`init_logging`](super::init_logging).

use std::fmt;
use std::str::FromStr;

pub const ENV_LEVEL: &str = "FW_LOG";
pub const ENV_FORMAT: &str = "FW_LOG_FORMAT";
pub const ENV_TIMESTAMPS: &str = "FW_LOG_TIMESTAMPS";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// Machine-parseable JSON lines.
    Jsonl,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "human" | "console" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" | "structured" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
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

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directive())
    }
}

/// Verbosity requested on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbosity {
    /// Number of `-v` flags.
    pub verbose: u8,
    /// `-q` was given. Wins over `-v`.
    pub quiet: bool,
}

impl Verbosity {
    /// Level forced by the flags, if any.
    pub fn level(self) -> Option<LogLevel> {
        if self.quiet {
            return Some(LogLevel::Error);
        }
        match self.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Whether to include timestamps in human output.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Resolve from the process environment and CLI flags.
    pub fn resolve(verbosity: Verbosity) -> Self {
        Self::from_lookup(verbosity, |key| std::env::var(key).ok())
    }

    /// Resolve with an injected environment lookup.
    ///
    /// Unparseable values are ignored and the lower layer kept.
    pub fn from_lookup(verbosity: Verbosity, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = LogConfig::default();

        if let Some(level) = lookup(ENV_LEVEL).and_then(|v| v.parse().ok()) {
            config.level = level;
        }
        if let Some(format) = lookup(ENV_FORMAT).and_then(|v| v.parse().ok()) {
            config.format = format;
        }
        if let Some(flag) = lookup(ENV_TIMESTAMPS).and_then(|v| parse_flag(&v)) {
            config.timestamps = flag;
        }

        if let Some(level) = verbosity.level() {
            config.level = level;
        }

        config
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
