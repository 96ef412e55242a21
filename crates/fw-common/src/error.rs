//! Error types for Fare Watch.
//!
//! Errors carry:
//! - Stable error codes for machine parsing
//! - Category classification for grouping
//! - Recoverability hints for automation
//! - Remediation text for humans
//!
//! Malformed cells never surface here: the loader recovers them locally as
//! missing values. An empty baseline table is not an error either.
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 20,
//!   "category": "source",
//!   "message": "source unavailable: data/expected.csv (No such file or directory)",
//!   "recoverable": true,
//!   "context": { "path": "data/expected.csv" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Fare Watch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Rules file and path resolution errors.
    Config,
    /// Input table availability and shape errors.
    Source,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Source => write!(f, "source"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for Fare Watch.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid rules file: {0}")]
    InvalidRules(String),

    // Source errors (20-29)
    #[error("source unavailable: {} ({reason})", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("{table} table is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("malformed CSV: {0}")]
    Csv(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// - 10-19: Configuration errors
    /// - 20-29: Source errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidRules(_) => 11,
            Error::SourceUnavailable { .. } => 20,
            Error::MissingColumn { .. } => 21,
            Error::Csv(_) => 22,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidRules(_) => ErrorCategory::Config,
            Error::SourceUnavailable { .. } | Error::MissingColumn { .. } | Error::Csv(_) => {
                ErrorCategory::Source
            }
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Whether the pipeline should treat this as "no data" rather than a crash.
    pub fn is_load_failure(&self) -> bool {
        self.category() == ErrorCategory::Source
    }

    /// Returns whether this error is potentially recoverable by the operator.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::InvalidRules(_) => true,
            Error::SourceUnavailable { .. } => true,
            Error::MissingColumn { .. } => true,
            Error::Csv(_) => true,
            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Run 'fw-core check' to see which paths were resolved.",
            Error::InvalidRules(_) => {
                "Fix the reported field in rules.json, or remove the file to use built-in rules."
            }
            Error::SourceUnavailable { .. } => {
                "Pass --baseline/--sample or set FARE_WATCH_DATA_DIR to a directory with both tables."
            }
            Error::MissingColumn { .. } => {
                "Check the header row. Column names are case-sensitive (e.g. Stop_name, time_bin, actual)."
            }
            Error::Csv(_) => "Check the table for unbalanced quotes or a truncated final row.",
            Error::Io(_) => "Check file permissions and retry.",
            Error::Json(_) => "Internal serialization failure; please report it.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidRules(_) => "Invalid Rules",
            Error::SourceUnavailable { .. } => "Source Unavailable",
            Error::MissingColumn { .. } => "Missing Column",
            Error::Csv(_) => "Malformed Table",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., file path, column).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::SourceUnavailable { path, .. } => {
                context.insert(
                    "path".to_string(),
                    serde_json::json!(path.display().to_string()),
                );
            }
            Error::MissingColumn { table, column } => {
                context.insert("table".to_string(), serde_json::json!(table));
                context.insert("column".to_string(), serde_json::json!(column));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Human-facing three-line rendering.
    pub fn to_human(&self, err: &Error) -> String {
        format!(
            "✗ {}\n  Reason: {}\n  Fix: {}",
            err.headline(),
            self.message,
            err.remediation()
        )
    }
}
