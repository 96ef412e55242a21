//! CSV readers for the baseline and sample tables.
//!
//! Readers are generic over `io::Read` so tests can feed in-memory tables.
//! Numeric cells go through [`coerce_f64`]: an empty cell is unknown, a cell
//! that fails to parse is unknown and counted as malformed. Neither rejects
//! the row.

use std::collections::HashSet;
use std::io;

use csv::{ReaderBuilder, StringRecord, Trim};
use fw_common::{Error, Result, StationName, TimeBin};

use super::records::{SampleObservation, StationBaseline, TableReport};
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};

pub const COL_STOP_NAME: &str = "Stop_name";
pub const COL_STOP_LAT: &str = "Stop_lat";
pub const COL_STOP_LONG: &str = "Stop_long";
pub const COL_PAX_ANNUAL: &str = "Pax_annual";
pub const COL_PAX_WEEKDAY: &str = "Pax_weekday";
pub const COL_PAX_AM_PEAK: &str = "Pax_AM_peak";
pub const COL_PAX_PM_PEAK: &str = "Pax_PM_peak";
pub const COL_PAX_SATURDAY: &str = "Pax_Saturday";
pub const COL_PAX_SUNDAY: &str = "Pax_Sunday";
pub const COL_TIME_BIN: &str = "time_bin";
pub const COL_ACTUAL: &str = "actual";

const BASELINE_TABLE: &str = "baseline";
const SAMPLE_TABLE: &str = "sample";

/// Result of coercing one cell to a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced {
    Value(f64),
    Empty,
    Malformed,
}

impl Coerced {
    pub fn value(self) -> Option<f64> {
        match self {
            Coerced::Value(v) => Some(v),
            Coerced::Empty | Coerced::Malformed => None,
        }
    }
}

/// Coerce a raw cell to a finite number.
pub fn coerce_f64(raw: Option<&str>) -> Coerced {
    let Some(text) = raw.map(str::trim) else {
        return Coerced::Empty;
    };
    if text.is_empty() {
        return Coerced::Empty;
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Coerced::Value(v),
        _ => Coerced::Malformed,
    }
}

fn reader<R: io::Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input)
}

/// Column positions resolved from a header row.
struct Header {
    record: StringRecord,
}

impl Header {
    fn read<R: io::Read>(rdr: &mut csv::Reader<R>) -> Result<Self> {
        let record = rdr
            .headers()
            .map_err(|e| Error::Csv(e.to_string()))?
            .clone();
        Ok(Header { record })
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.record
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == column)
    }

    fn require(&self, table: &str, column: &str) -> Result<usize> {
        self.position(column).ok_or_else(|| Error::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
    }
}

/// Per-row numeric coercion with malformed-cell accounting.
struct CellReader<'a> {
    ctx: &'a LogContext,
    report: &'a mut TableReport,
    table: &'static str,
    row: usize,
}

impl CellReader<'_> {
    fn number(&mut self, record: &StringRecord, column: Option<usize>, name: &str) -> Option<f64> {
        let raw = column.and_then(|idx| record.get(idx));
        match coerce_f64(raw) {
            Coerced::Value(v) => Some(v),
            Coerced::Empty => None,
            Coerced::Malformed => {
                self.report.malformed_cells += 1;
                log_event!(
                    self.ctx,
                    DEBUG,
                    event_names::LOAD_MALFORMED_VALUE,
                    Stage::Load,
                    "non-numeric cell treated as unknown",
                    table = self.table,
                    column = name,
                    row = self.row,
                    raw = raw.unwrap_or_default()
                );
                None
            }
        }
    }
}

fn skip_row(ctx: &LogContext, report: &mut TableReport, table: &str, row: usize, reason: &str) {
    report.rows_skipped += 1;
    log_event!(
        ctx,
        WARN,
        event_names::LOAD_ROW_SKIPPED,
        Stage::Load,
        "row skipped",
        table = table,
        row = row,
        reason = reason
    );
}

/// Read the baseline table.
///
/// `Stop_name` is required; every other column is optional and reads as
/// unknown when absent. The first row for a station wins.
pub fn read_baseline<R: io::Read>(
    input: R,
    ctx: &LogContext,
) -> Result<(Vec<StationBaseline>, TableReport)> {
    let mut rdr = reader(input);
    let header = Header::read(&mut rdr)?;
    let name_col = header.require(BASELINE_TABLE, COL_STOP_NAME)?;
    let lat_col = header.position(COL_STOP_LAT);
    let long_col = header.position(COL_STOP_LONG);
    let annual_col = header.position(COL_PAX_ANNUAL);
    let weekday_col = header.position(COL_PAX_WEEKDAY);
    let am_col = header.position(COL_PAX_AM_PEAK);
    let pm_col = header.position(COL_PAX_PM_PEAK);
    let sat_col = header.position(COL_PAX_SATURDAY);
    let sun_col = header.position(COL_PAX_SUNDAY);

    let mut report = TableReport::default();
    let mut stations = Vec::new();
    let mut seen: HashSet<StationName> = HashSet::new();

    for (idx, result) in rdr.records().enumerate() {
        let row = idx + 1;
        report.rows_read += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(Error::Csv(e.to_string())),
            Err(_) => {
                skip_row(ctx, &mut report, BASELINE_TABLE, row, "undecodable row");
                continue;
            }
        };

        let name = StationName::new(record.get(name_col).unwrap_or_default());
        if name.is_empty() {
            skip_row(ctx, &mut report, BASELINE_TABLE, row, "blank station name");
            continue;
        }
        if seen.contains(&name) {
            skip_row(ctx, &mut report, BASELINE_TABLE, row, "duplicate station");
            continue;
        }

        let mut cells = CellReader {
            ctx,
            report: &mut report,
            table: BASELINE_TABLE,
            row,
        };
        let baseline = StationBaseline {
            latitude: cells.number(&record, lat_col, COL_STOP_LAT),
            longitude: cells.number(&record, long_col, COL_STOP_LONG),
            pax_annual: cells.number(&record, annual_col, COL_PAX_ANNUAL),
            pax_weekday: cells.number(&record, weekday_col, COL_PAX_WEEKDAY),
            pax_am_peak: cells.number(&record, am_col, COL_PAX_AM_PEAK),
            pax_pm_peak: cells.number(&record, pm_col, COL_PAX_PM_PEAK),
            pax_saturday: cells.number(&record, sat_col, COL_PAX_SATURDAY),
            pax_sunday: cells.number(&record, sun_col, COL_PAX_SUNDAY),
            name: name.clone(),
        };

        seen.insert(name);
        stations.push(baseline);
        report.rows_loaded += 1;
    }

    Ok((stations, report))
}

/// Read the sample table.
///
/// `Stop_name`, `time_bin` and `actual` are all required columns.
/// Unrecognized time-bin labels are kept with `time_bin: None`.
pub fn read_samples<R: io::Read>(
    input: R,
    ctx: &LogContext,
) -> Result<(Vec<SampleObservation>, TableReport)> {
    let mut rdr = reader(input);
    let header = Header::read(&mut rdr)?;
    let name_col = header.require(SAMPLE_TABLE, COL_STOP_NAME)?;
    let bin_col = header.require(SAMPLE_TABLE, COL_TIME_BIN)?;
    let actual_col = header.require(SAMPLE_TABLE, COL_ACTUAL)?;

    let mut report = TableReport::default();
    let mut observations = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let row = idx + 1;
        report.rows_read += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(Error::Csv(e.to_string())),
            Err(_) => {
                skip_row(ctx, &mut report, SAMPLE_TABLE, row, "undecodable row");
                continue;
            }
        };

        let station = StationName::new(record.get(name_col).unwrap_or_default());
        if station.is_empty() {
            skip_row(ctx, &mut report, SAMPLE_TABLE, row, "blank station name");
            continue;
        }

        let label = record.get(bin_col).unwrap_or_default().to_string();
        let time_bin = label.parse::<TimeBin>().ok();
        if time_bin.is_none() {
            report.unrecognized_bins += 1;
        }

        let mut cells = CellReader {
            ctx,
            report: &mut report,
            table: SAMPLE_TABLE,
            row,
        };
        let actual = cells.number(&record, Some(actual_col), COL_ACTUAL);

        observations.push(SampleObservation {
            station,
            time_bin,
            time_bin_label: label,
            actual,
        });
        report.rows_loaded += 1;
    }

    Ok((observations, report))
}
