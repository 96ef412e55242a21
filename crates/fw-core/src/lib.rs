//! Fare Watch Core Library
//!
//! Evasion estimation and rolling monitoring over station ridership data:
//! - Loading the baseline and sample tables
//! - Per-station evasion estimation with tiered variance
//! - Baseline/metrics merging into one canonical station set
//! - Rolling 24-hour event and alert simulation
//! - Read views for dashboards and reports
//!
//! The binary entry point is in `main.rs`.

pub mod aggregate;
pub mod context;
pub mod estimate;
pub mod exit_codes;
pub mod load;
pub mod logging;
pub mod merge;
pub mod output;
pub mod simulate;
pub mod timestamp;

pub use aggregate::AggregationService;
pub use context::{DataStatus, PipelineContext, StationSnapshot};
pub use estimate::{EvasionEstimator, StationEvasionMetrics, VarianceSampler};
pub use load::StationBaselineLoader;
pub use merge::{MergedStationRecord, StationMerger, StationSet};
pub use simulate::{RealtimeSimulator, RealtimeStream};
