//! No-mock rules loading + resolution tests.
//!
//! Covers:
//! - Loading real rules files from disk
//! - Resolution order (CLI > env > config dir)
//! - Validation failures surfacing with field names

use fw_config::resolve::{
    load_rules, resolve_data_paths, resolve_rules, RulesSource, ENV_BASELINE_PATH,
    ENV_CONFIG_DIR, ENV_DATA_DIR, ENV_RULES_PATH, ENV_SAMPLE_PATH,
};
use fw_config::validate::ValidationError;
use fw_config::Rules;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let mut saved = Vec::with_capacity(keys.len());
        for key in keys {
            saved.push(env::var(key).ok());
            env::remove_var(key);
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (idx, key) in self.keys.iter().enumerate() {
            match self.saved.get(idx).and_then(|v| v.as_ref()) {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("env lock poisoned");
    f()
}

const ALL_KEYS: &[&str] = &[
    ENV_RULES_PATH,
    ENV_CONFIG_DIR,
    ENV_BASELINE_PATH,
    ENV_SAMPLE_PATH,
    ENV_DATA_DIR,
];

fn write_rules(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write rules");
    path
}

#[test]
fn cli_rules_file_is_loaded_and_hashed() {
    with_env_lock(|| {
        let _env = EnvGuard::new(ALL_KEYS);
        let tmp = TempDir::new().expect("tempdir");
        let path = write_rules(
            tmp.path(),
            "rules.json",
            r#"{"schema_version": "1.0.0", "fares": {"average_fare": 5.25}}"#,
        );

        let (rules, snapshot) = load_rules(Some(&path)).expect("load rules");
        assert_eq!(rules.fares.average_fare, 5.25);
        assert_eq!(rules.fares.penalty_fine, 250.0);
        assert_eq!(snapshot.source, "CLI argument");
        assert_eq!(snapshot.hash.len(), 64);
        assert_eq!(snapshot.summary.average_fare, 5.25);
    });
}

#[test]
fn env_rules_path_beats_config_dir() {
    with_env_lock(|| {
        let _env = EnvGuard::new(ALL_KEYS);
        let tmp = TempDir::new().expect("tempdir");
        let direct = write_rules(
            tmp.path(),
            "direct.json",
            r#"{"views": {"top_stations": 5}}"#,
        );
        let dir = tmp.path().join("cfg");
        fs::create_dir_all(&dir).expect("mkdir");
        write_rules(&dir, "rules.json", r#"{"views": {"top_stations": 7}}"#);

        env::set_var(ENV_RULES_PATH, &direct);
        env::set_var(ENV_CONFIG_DIR, &dir);

        let resolved = resolve_rules(None);
        assert_eq!(resolved.source, RulesSource::Environment);
        assert_eq!(resolved.path.as_deref(), Some(direct.as_path()));

        let (rules, _) = load_rules(None).expect("load");
        assert_eq!(rules.views.top_stations, 5);

        env::remove_var(ENV_RULES_PATH);
        let (rules, _) = load_rules(None).expect("load from config dir");
        assert_eq!(rules.views.top_stations, 7);
    });
}

#[test]
fn invalid_rules_report_field() {
    with_env_lock(|| {
        let _env = EnvGuard::new(ALL_KEYS);
        let tmp = TempDir::new().expect("tempdir");
        let path = write_rules(
            tmp.path(),
            "rules.json",
            r#"{"jitter": {"high": {"low": 1.3, "high": 1.1}}}"#,
        );

        let err = load_rules(Some(&path)).unwrap_err();
        match err {
            ValidationError::InvalidValue { field, .. } => assert_eq!(field, "jitter.high"),
            other => panic!("unexpected error: {other}"),
        }
    });
}

#[test]
fn malformed_json_is_parse_error() {
    with_env_lock(|| {
        let _env = EnvGuard::new(ALL_KEYS);
        let tmp = TempDir::new().expect("tempdir");
        let path = write_rules(tmp.path(), "rules.json", "{ not json");
        let err = load_rules(Some(&path)).unwrap_err();
        assert_eq!(err.code(), 61);
    });
}

#[test]
fn missing_cli_rules_is_io_error() {
    with_env_lock(|| {
        let _env = EnvGuard::new(ALL_KEYS);
        let err = load_rules(Some(Path::new("/definitely/not/here/rules.json"))).unwrap_err();
        assert!(matches!(err, ValidationError::IoError(_)));
    });
}

#[test]
fn data_paths_follow_env_then_default() {
    with_env_lock(|| {
        let _env = EnvGuard::new(ALL_KEYS);

        let paths = resolve_data_paths(None, None);
        assert_eq!(paths.baseline, PathBuf::from("data").join("expected.csv"));
        assert_eq!(
            paths.sample,
            PathBuf::from("data").join("sample_tap_on_dataset.csv")
        );
        assert_eq!(paths.baseline_source, RulesSource::BuiltinDefault);

        env::set_var(ENV_DATA_DIR, "/srv/ptv");
        let paths = resolve_data_paths(None, None);
        assert_eq!(paths.baseline, PathBuf::from("/srv/ptv/expected.csv"));
        assert_eq!(paths.sample_source, RulesSource::Environment);

        env::set_var(ENV_SAMPLE_PATH, "/tmp/taps.csv");
        let paths = resolve_data_paths(None, None);
        assert_eq!(paths.sample, PathBuf::from("/tmp/taps.csv"));
        assert_eq!(paths.baseline, PathBuf::from("/srv/ptv/expected.csv"));
    });
}

#[test]
fn defaults_round_trip_through_json() {
    let rules = Rules::default();
    let json = serde_json::to_string_pretty(&rules).expect("serialize");
    let parsed = Rules::parse_json(&json).expect("parse");
    assert_eq!(parsed, rules);
}
