//! Fare Watch common types and errors.
//!
//! This crate provides the vocabulary shared across the fare-watch crates:
//! - Station identity and the five fixed daily time bins
//! - Volume tiers and alert severities
//! - Common error types with stable codes
//! - Output formats

pub mod error;
pub mod output;
pub mod station;
pub mod time_bin;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use output::OutputFormat;
pub use station::{Severity, StationName, VolumeTier};
pub use time_bin::TimeBin;

/// Schema version stamped on every serialized payload.
pub const SCHEMA_VERSION: &str = "1.0.0";
