//! Typed records produced by the loader.

use fw_common::{StationName, TimeBin};
use serde::{Deserialize, Serialize};

/// Declared ridership for one station (one row of the baseline table).
///
/// Every numeric figure is `None` when the cell was empty or failed to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationBaseline {
    pub name: StationName,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub pax_annual: Option<f64>,
    pub pax_weekday: Option<f64>,
    pub pax_am_peak: Option<f64>,
    pub pax_pm_peak: Option<f64>,
    pub pax_saturday: Option<f64>,
    pub pax_sunday: Option<f64>,
}

impl StationBaseline {
    /// Baseline with only a name; every figure unknown.
    pub fn named(name: impl Into<StationName>) -> Self {
        StationBaseline {
            name: name.into(),
            latitude: None,
            longitude: None,
            pax_annual: None,
            pax_weekday: None,
            pax_am_peak: None,
            pax_pm_peak: None,
            pax_saturday: None,
            pax_sunday: None,
        }
    }
}

/// One observed tap-on count (one row of the sample table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleObservation {
    pub station: StationName,
    /// Resolved bin; `None` when the label is not one of the five known bins.
    pub time_bin: Option<TimeBin>,
    /// The label as it appeared in the table.
    pub time_bin_label: String,
    /// Observed count; `None` when the cell was empty or malformed.
    pub actual: Option<f64>,
}

impl SampleObservation {
    pub fn new(station: impl Into<StationName>, time_bin: TimeBin, actual: f64) -> Self {
        SampleObservation {
            station: station.into(),
            time_bin: Some(time_bin),
            time_bin_label: time_bin.label().to_string(),
            actual: Some(actual),
        }
    }

    /// Observed count with unknown treated as zero.
    pub fn actual_or_zero(&self) -> f64 {
        self.actual.unwrap_or(0.0)
    }
}

/// Row accounting for one input table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    /// Data rows seen (header excluded).
    pub rows_read: usize,
    /// Rows turned into records.
    pub rows_loaded: usize,
    /// Rows dropped (blank station name, duplicate station, undecodable row).
    pub rows_skipped: usize,
    /// Numeric cells that failed coercion and became unknown.
    pub malformed_cells: usize,
    /// Sample rows whose time-bin label was not recognized.
    #[serde(default)]
    pub unrecognized_bins: usize,
}

/// Accounting for a full load cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub baseline_path: String,
    pub sample_path: String,
    pub baseline: TableReport,
    pub sample: TableReport,
}

impl LoadReport {
    pub fn malformed_cells(&self) -> usize {
        self.baseline.malformed_cells + self.sample.malformed_cells
    }
}

/// Output of one successful load.
#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    pub baselines: Vec<StationBaseline>,
    pub observations: Vec<SampleObservation>,
    pub report: LoadReport,
}

impl LoadedData {
    pub fn is_empty_baseline(&self) -> bool {
        self.baselines.is_empty()
    }
}
