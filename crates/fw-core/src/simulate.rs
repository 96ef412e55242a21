//! Rolling 24-hour event synthesis.
//!
//! For every station and each trailing hourly mark ending at `now`, the mark's
//! hour picks a time bin, the station's first observation for that bin
//! supplies the actual count, and the station's baseline peak/weekday figures
//! supply the hourly expected count. Hours without an observation are
//! skipped. Each run produces a fresh [`RealtimeStream`]; nothing carries
//! over between runs.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime, Timelike};
use fw_common::{Severity, StationName, TimeBin};
use fw_config::rules::SeverityThresholds;
use fw_config::Rules;
use fw_math::{safe_div, shortfall};
use serde::{Deserialize, Serialize};

use crate::load::SampleObservation;
use crate::merge::{MergedStationRecord, StationSet};

/// One synthesized (station, hour) record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEventRecord {
    pub station: StationName,
    #[serde(with = "crate::timestamp")]
    pub timestamp: NaiveDateTime,
    pub hour: u32,
    pub time_bin: TimeBin,
    pub expected: u64,
    /// Observed count, never above `expected`.
    pub actual: u64,
    pub evasion_rate: f64,
    pub expected_fines: f64,
}

/// What produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSource {
    /// A single simulated hour.
    Hourly,
    /// A station's average rate.
    Station,
}

/// A threshold-triggered evasion alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvasionAlert {
    pub station: StationName,
    #[serde(with = "crate::timestamp")]
    pub timestamp: NaiveDateTime,
    pub evasion_rate: f64,
    pub severity: Severity,
    pub expected_fines: f64,
    pub source: AlertSource,
}

/// One generation of simulated events and their alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeStream {
    pub events: Vec<RealtimeEventRecord>,
    pub alerts: Vec<EvasionAlert>,
    #[serde(with = "crate::timestamp")]
    pub generated_at: NaiveDateTime,
}

impl RealtimeStream {
    pub fn empty(generated_at: NaiveDateTime) -> Self {
        RealtimeStream {
            events: Vec::new(),
            alerts: Vec::new(),
            generated_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Hourly expected count for a station in a bin, before truncation.
pub fn hourly_expected(station: &MergedStationRecord, bin: TimeBin) -> f64 {
    let am = station.pax_am_peak;
    let pm = station.pax_pm_peak;
    match bin {
        TimeBin::AmPeak | TimeBin::PmPeak => (am + pm) / 4.0,
        TimeBin::PreAmPeak => am / 2.0,
        TimeBin::Interpeak => (station.pax_weekday - am - pm) / 6.0,
        TimeBin::PmLate => pm / 2.0,
    }
}

/// Whole non-negative count; NaN and negatives become zero.
fn whole_count(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        value.trunc() as u64
    }
}

/// Generates [`RealtimeStream`]s.
#[derive(Debug, Clone)]
pub struct RealtimeSimulator {
    hours: u32,
    average_fare: f64,
    thresholds: SeverityThresholds,
}

impl RealtimeSimulator {
    pub fn new(rules: &Rules) -> Self {
        RealtimeSimulator {
            hours: rules.views.simulation_hours,
            average_fare: rules.fares.average_fare,
            thresholds: rules.alerts.hourly,
        }
    }

    /// Simulate the trailing window ending at `now` (inclusive).
    ///
    /// Events are grouped by station in canonical order and are
    /// chronological within a station.
    pub fn simulate(
        &self,
        stations: &StationSet,
        observations: &[SampleObservation],
        now: NaiveDateTime,
    ) -> RealtimeStream {
        // First observation per (station, bin) wins.
        let mut lookup: HashMap<(&str, TimeBin), Option<f64>> = HashMap::new();
        for obs in observations {
            if let Some(bin) = obs.time_bin {
                lookup
                    .entry((obs.station.as_str(), bin))
                    .or_insert(obs.actual);
            }
        }

        let mut stream = RealtimeStream::empty(now);
        let marks: Vec<NaiveDateTime> = (0..self.hours)
            .map(|i| now - Duration::hours(i64::from(self.hours - 1 - i)))
            .collect();

        for station in stations {
            for &timestamp in &marks {
                let hour = timestamp.hour();
                let bin = TimeBin::from_hour(hour);
                let Some(Some(observed)) = lookup.get(&(station.name.as_str(), bin)).copied()
                else {
                    continue;
                };

                let event = self.event(station, timestamp, bin, observed);
                if let Some(severity) = self.thresholds.classify(event.evasion_rate) {
                    stream.alerts.push(EvasionAlert {
                        station: event.station.clone(),
                        timestamp,
                        evasion_rate: event.evasion_rate,
                        severity,
                        expected_fines: event.expected_fines,
                        source: AlertSource::Hourly,
                    });
                }
                stream.events.push(event);
            }
        }

        stream
    }

    fn event(
        &self,
        station: &MergedStationRecord,
        timestamp: NaiveDateTime,
        bin: TimeBin,
        observed: f64,
    ) -> RealtimeEventRecord {
        let expected = whole_count(hourly_expected(station, bin));
        let actual = whole_count(observed).min(expected);
        let missing = expected - actual;
        let evasion_rate = safe_div(shortfall(expected as f64, actual as f64), expected as f64, 0.0);

        RealtimeEventRecord {
            station: station.name.clone(),
            timestamp,
            hour: timestamp.hour(),
            time_bin: bin,
            expected,
            actual,
            evasion_rate,
            expected_fines: missing as f64 * self.average_fare,
        }
    }
}
