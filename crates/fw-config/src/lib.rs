//! Fare Watch configuration loading and validation.
//!
//! This crate provides:
//! - The typed `Rules` document holding every business constant
//! - Rules and data-table path resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Rules snapshots for output provenance

pub mod resolve;
pub mod rules;
pub mod snapshot;
pub mod validate;

pub use resolve::{load_rules, resolve_data_paths, resolve_rules, DataPaths, RulesPath, RulesSource};
pub use rules::Rules;
pub use snapshot::RulesSnapshot;
pub use validate::{ValidationError, ValidationResult};

/// Schema version for rules files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
