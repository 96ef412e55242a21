//! Rules and data-table path discovery.
//!
//! Resolution order: CLI arguments → environment variables → XDG paths → defaults.

use std::path::{Path, PathBuf};

use crate::rules::Rules;
use crate::snapshot::RulesSnapshot;
use crate::validate::{ValidationError, ValidationResult};

/// Where a path was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RulesSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for RulesSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RulesSource::CliArgument => write!(f, "CLI argument"),
            RulesSource::Environment => write!(f, "environment variable"),
            RulesSource::XdgConfig => write!(f, "XDG config"),
            RulesSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Resolved rules file location.
#[derive(Debug, Clone, Default)]
pub struct RulesPath {
    /// Path to rules.json, or None for built-in rules.
    pub path: Option<PathBuf>,
    pub source: RulesSource,
}

/// Resolved input table locations.
///
/// Paths are returned even when nothing exists there; the loader reports
/// the missing source.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub baseline: PathBuf,
    pub baseline_source: RulesSource,
    pub sample: PathBuf,
    pub sample_source: RulesSource,
}

/// Environment variable names.
pub const ENV_RULES_PATH: &str = "FARE_WATCH_RULES";
pub const ENV_CONFIG_DIR: &str = "FARE_WATCH_CONFIG_DIR";
pub const ENV_BASELINE_PATH: &str = "FARE_WATCH_BASELINE";
pub const ENV_SAMPLE_PATH: &str = "FARE_WATCH_SAMPLE";
pub const ENV_DATA_DIR: &str = "FARE_WATCH_DATA_DIR";

/// Standard file names.
pub const RULES_FILENAME: &str = "rules.json";
pub const BASELINE_FILENAME: &str = "expected.csv";
pub const SAMPLE_FILENAME: &str = "sample_tap_on_dataset.csv";

/// Default data directory, relative to the working directory.
const DEFAULT_DATA_DIR: &str = "data";

/// Application name for XDG directories.
const APP_NAME: &str = "fare-watch";

/// Resolve the rules file.
///
/// 1. Explicit CLI path (returned even if missing, so the load reports it)
/// 2. `FARE_WATCH_RULES`
/// 3. `FARE_WATCH_CONFIG_DIR` + rules.json
/// 4. XDG config directory (~/.config/fare-watch/rules.json)
/// 5. Built-in defaults (None)
pub fn resolve_rules(cli_rules: Option<&Path>) -> RulesPath {
    if let Some(path) = cli_rules {
        return RulesPath {
            path: Some(path.to_path_buf()),
            source: RulesSource::CliArgument,
        };
    }

    if let Ok(env_path) = std::env::var(ENV_RULES_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return RulesPath {
                path: Some(path),
                source: RulesSource::Environment,
            };
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(RULES_FILENAME);
        if path.exists() {
            return RulesPath {
                path: Some(path),
                source: RulesSource::Environment,
            };
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(RULES_FILENAME);
        if path.exists() {
            return RulesPath {
                path: Some(path),
                source: RulesSource::XdgConfig,
            };
        }
    }

    RulesPath::default()
}

/// Resolve both input tables.
pub fn resolve_data_paths(cli_baseline: Option<&Path>, cli_sample: Option<&Path>) -> DataPaths {
    let (baseline, baseline_source) =
        resolve_table(cli_baseline, ENV_BASELINE_PATH, BASELINE_FILENAME);
    let (sample, sample_source) = resolve_table(cli_sample, ENV_SAMPLE_PATH, SAMPLE_FILENAME);
    DataPaths {
        baseline,
        baseline_source,
        sample,
        sample_source,
    }
}

fn resolve_table(cli_path: Option<&Path>, env_var: &str, filename: &str) -> (PathBuf, RulesSource) {
    if let Some(path) = cli_path {
        return (path.to_path_buf(), RulesSource::CliArgument);
    }

    if let Ok(env_path) = std::env::var(env_var) {
        return (PathBuf::from(env_path), RulesSource::Environment);
    }

    if let Ok(data_dir) = std::env::var(ENV_DATA_DIR) {
        return (
            PathBuf::from(data_dir).join(filename),
            RulesSource::Environment,
        );
    }

    (
        PathBuf::from(DEFAULT_DATA_DIR).join(filename),
        RulesSource::BuiltinDefault,
    )
}

/// Resolve, read, validate, and snapshot the rules in one step.
pub fn load_rules(cli_rules: Option<&Path>) -> ValidationResult<(Rules, RulesSnapshot)> {
    let resolved = resolve_rules(cli_rules);
    match resolved.path.as_deref() {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let rules = Rules::parse_json(&content)?;
            rules.validate()?;
            let snapshot = RulesSnapshot::capture(&rules, &resolved, Some(&content));
            Ok((rules, snapshot))
        }
        None => {
            let rules = Rules::default();
            let snapshot = RulesSnapshot::capture(&rules, &resolved, None);
            Ok((rules, snapshot))
        }
    }
}

/// Get the XDG config directory for fare-watch.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}
