//! Structured event vocabulary for pipeline logging.
//!
//! Every pipeline event carries the run correlation (run_id, host_id) and
//! the stage that produced it.

use serde::{Deserialize, Serialize};

/// Log levels as they appear in JSONL output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and rules resolution.
    Init,
    /// Reading the baseline and sample tables.
    Load,
    /// Per-station evasion estimation.
    Estimate,
    /// Baseline/metrics join.
    Merge,
    /// Rolling 24-hour event synthesis.
    Simulate,
    /// Ranked views and statistics.
    Aggregate,
    /// Payload rendering.
    Render,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Estimate => "estimate",
            Stage::Merge => "merge",
            Stage::Simulate => "simulate",
            Stage::Aggregate => "aggregate",
            Stage::Render => "render",
        };
        write!(f, "{}", s)
    }
}

/// Stable event names (used as tracing targets).
pub mod event_names {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    pub const RULES_LOADED: &str = "rules.loaded";
    pub const RULES_DEFAULT_USED: &str = "rules.default_used";
    pub const RULES_ERROR: &str = "rules.error";

    pub const LOAD_STARTED: &str = "load.started";
    pub const LOAD_MALFORMED_VALUE: &str = "load.malformed_value";
    pub const LOAD_ROW_SKIPPED: &str = "load.row_skipped";
    pub const LOAD_FINISHED: &str = "load.finished";
    pub const LOAD_FAILED: &str = "load.failed";
    pub const LOAD_EMPTY_BASELINE: &str = "load.empty_baseline";

    pub const ESTIMATE_STATION: &str = "estimate.station";
    pub const ESTIMATE_FINISHED: &str = "estimate.finished";

    pub const MERGE_FINISHED: &str = "merge.finished";

    pub const SIMULATE_FINISHED: &str = "simulate.finished";

    pub const AGGREGATE_VIEW: &str = "aggregate.view";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation IDs shared by every event in one invocation.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub host_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, host_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            host_id: host_id.into(),
        }
    }

    /// Context with a fresh run id and the local host id.
    pub fn generate() -> Self {
        LogContext::new(super::generate_run_id(), super::get_host_id())
    }
}
