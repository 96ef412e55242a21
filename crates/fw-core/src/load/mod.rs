//! Station baseline loading.
//!
//! Reads the declared-ridership baseline table and the sampled tap-on table
//! into typed records. This layer has no estimation logic.
//!
//! A missing or unreadable table is a load failure (`SourceUnavailable`);
//! callers degrade to the empty "no data" state. Malformed numeric cells
//! are recovered as unknown values and only counted.

mod records;
pub mod table;

pub use records::{LoadReport, LoadedData, SampleObservation, StationBaseline, TableReport};
pub use table::{coerce_f64, read_baseline, read_samples, Coerced};

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use fw_common::{Error, Result};
use fw_config::DataPaths;
use tracing::{span, Level};

use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};

/// Loads both input tables from resolved paths.
#[derive(Debug, Clone)]
pub struct StationBaselineLoader {
    paths: DataPaths,
}

impl StationBaselineLoader {
    pub fn new(paths: DataPaths) -> Self {
        StationBaselineLoader { paths }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// Read and type both tables.
    ///
    /// # Errors
    /// * `SourceUnavailable` if either file cannot be opened
    /// * `MissingColumn` if a required column is absent
    /// * `Csv` if the underlying reader fails mid-table
    pub fn load(&self, ctx: &LogContext) -> Result<LoadedData> {
        let _span = span!(Level::DEBUG, "load", stage = "load").entered();
        let baseline_path = self.paths.baseline.display().to_string();
        let sample_path = self.paths.sample.display().to_string();

        log_event!(
            ctx,
            INFO,
            event_names::LOAD_STARTED,
            Stage::Load,
            "reading input tables",
            baseline = baseline_path.as_str(),
            sample = sample_path.as_str()
        );

        let result = self.load_tables(ctx);
        match &result {
            Ok(data) => {
                if data.is_empty_baseline() {
                    log_event!(
                        ctx,
                        WARN,
                        event_names::LOAD_EMPTY_BASELINE,
                        Stage::Load,
                        "baseline table has no stations",
                        baseline = baseline_path.as_str()
                    );
                }
                log_event!(
                    ctx,
                    INFO,
                    event_names::LOAD_FINISHED,
                    Stage::Load,
                    "input tables loaded",
                    stations = data.baselines.len(),
                    observations = data.observations.len(),
                    malformed_cells = data.report.malformed_cells(),
                    skipped_rows = data.report.baseline.rows_skipped + data.report.sample.rows_skipped
                );
            }
            Err(e) => {
                let message = e.to_string();
                log_event!(
                    ctx,
                    ERROR,
                    event_names::LOAD_FAILED,
                    Stage::Load,
                    "input tables could not be loaded",
                    code = e.code(),
                    error = message.as_str()
                );
            }
        }
        result
    }

    fn load_tables(&self, ctx: &LogContext) -> Result<LoadedData> {
        // Open both before parsing so a missing sample table never yields
        // a half-built result.
        let baseline_file = open_source(&self.paths.baseline)?;
        let sample_file = open_source(&self.paths.sample)?;

        let (baselines, baseline_report) = read_baseline(BufReader::new(baseline_file), ctx)?;
        let (observations, sample_report) = read_samples(BufReader::new(sample_file), ctx)?;

        Ok(LoadedData {
            baselines,
            observations,
            report: LoadReport {
                baseline_path: self.paths.baseline.display().to_string(),
                sample_path: self.paths.sample.display().to_string(),
                baseline: baseline_report,
                sample: sample_report,
            },
        })
    }
}

fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::SourceUnavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fw_config::RulesSource;
    use std::fs;
    use tempfile::TempDir;

    fn paths(dir: &Path) -> DataPaths {
        DataPaths {
            baseline: dir.join("expected.csv"),
            baseline_source: RulesSource::CliArgument,
            sample: dir.join("sample.csv"),
            sample_source: RulesSource::CliArgument,
        }
    }

    fn ctx() -> LogContext {
        LogContext::new("run-test", "host-test")
    }

    #[test]
    fn test_load_reads_both_tables() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("expected.csv"),
            "Stop_name,Pax_annual,Pax_weekday\nRichmond,1000,50\n",
        )
        .unwrap();
        fs::write(
            tmp.path().join("sample.csv"),
            "Stop_name,time_bin,actual\nRichmond,interpeak,12\n",
        )
        .unwrap();

        let data = StationBaselineLoader::new(paths(tmp.path()))
            .load(&ctx())
            .unwrap();
        assert_eq!(data.baselines.len(), 1);
        assert_eq!(data.observations.len(), 1);
        assert!(data.report.baseline_path.ends_with("expected.csv"));
        assert_eq!(data.report.sample.rows_loaded, 1);
    }

    #[test]
    fn test_missing_sample_table_is_source_unavailable() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("expected.csv"), "Stop_name\nRichmond\n").unwrap();

        let err = StationBaselineLoader::new(paths(tmp.path()))
            .load(&ctx())
            .unwrap_err();
        match err {
            Error::SourceUnavailable { path, .. } => assert!(path.ends_with("sample.csv")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_baseline_table_is_load_failure() {
        let tmp = TempDir::new().unwrap();
        let err = StationBaselineLoader::new(paths(tmp.path()))
            .load(&ctx())
            .unwrap_err();
        assert!(err.is_load_failure());
        assert_eq!(err.code(), 20);
    }
}
