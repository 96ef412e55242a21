//! Baseline/metrics join.
//!
//! Every baseline station appears exactly once in the output, whether or not
//! it was sampled. Stations without samples get the placeholder estimate
//! `total_expected = factor × weekday`, zero evasion and the fallback rate.
//! Metrics for names absent from the baseline are dropped.
//!
//! The resulting [`StationSet`] is sorted busiest first (descending annual
//! ridership); that order is what "busiest" and "quietest" refer to.

use std::collections::HashMap;

use fw_common::{StationName, VolumeTier};
use fw_config::rules::EstimationRules;
use fw_config::Rules;
use fw_math::safe_div;
use serde::{Deserialize, Serialize};

use crate::estimate::StationEvasionMetrics;
use crate::load::StationBaseline;

/// One station with baseline figures, evasion metrics and derived ratios.
///
/// Unknown baseline figures are zero here; coordinates stay optional so the
/// map view can skip unplaced stations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedStationRecord {
    pub name: StationName,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub pax_annual: f64,
    pub pax_weekday: f64,
    pub pax_am_peak: f64,
    pub pax_pm_peak: f64,
    pub pax_saturday: f64,
    pub pax_sunday: f64,

    pub total_actual: f64,
    pub total_expected: f64,
    pub total_evasion: f64,
    pub avg_evasion_rate: f64,
    pub observation_count: usize,
    /// `None` for stations with no samples.
    pub volume_tier: Option<VolumeTier>,

    /// `annual / days_per_year`.
    pub daily_avg: f64,
    /// `(AM + PM) / weekday`, zero when weekday is zero.
    pub peak_ratio: f64,
    /// `(Saturday + Sunday) / (2 × weekday)`, zero when weekday is zero.
    pub weekend_ratio: f64,
    pub has_sample_data: bool,
}

impl MergedStationRecord {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// The canonical station collection, busiest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationSet {
    records: Vec<MergedStationRecord>,
}

impl StationSet {
    /// Build a set, sorting by descending annual ridership.
    ///
    /// The sort is stable: equal ridership keeps baseline order.
    pub fn new(mut records: Vec<MergedStationRecord>) -> Self {
        records.sort_by(|a, b| b.pax_annual.total_cmp(&a.pax_annual));
        StationSet { records }
    }

    pub fn records(&self) -> &[MergedStationRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MergedStationRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn busiest(&self) -> Option<&MergedStationRecord> {
        self.records.first()
    }

    pub fn quietest(&self) -> Option<&MergedStationRecord> {
        self.records.last()
    }

    pub fn get(&self, name: &str) -> Option<&MergedStationRecord> {
        self.records.iter().find(|r| r.name.as_str() == name)
    }
}

impl<'a> IntoIterator for &'a StationSet {
    type Item = &'a MergedStationRecord;
    type IntoIter = std::slice::Iter<'a, MergedStationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Joins baselines with estimator output.
#[derive(Debug, Clone)]
pub struct StationMerger {
    estimation: EstimationRules,
}

impl StationMerger {
    pub fn new(rules: &Rules) -> Self {
        StationMerger {
            estimation: rules.estimation.clone(),
        }
    }

    pub fn merge(
        &self,
        baselines: &[StationBaseline],
        metrics: &[StationEvasionMetrics],
    ) -> StationSet {
        let by_station: HashMap<&str, &StationEvasionMetrics> = metrics
            .iter()
            .map(|m| (m.station.as_str(), m))
            .collect();

        let records: Vec<MergedStationRecord> = baselines
            .iter()
            .map(|b| self.merge_one(b, by_station.get(b.name.as_str()).copied()))
            .collect();

        StationSet::new(records)
    }

    fn merge_one(
        &self,
        baseline: &StationBaseline,
        metrics: Option<&StationEvasionMetrics>,
    ) -> MergedStationRecord {
        let annual = baseline.pax_annual.unwrap_or(0.0);
        let weekday = baseline.pax_weekday.unwrap_or(0.0);
        let am = baseline.pax_am_peak.unwrap_or(0.0);
        let pm = baseline.pax_pm_peak.unwrap_or(0.0);
        let saturday = baseline.pax_saturday.unwrap_or(0.0);
        let sunday = baseline.pax_sunday.unwrap_or(0.0);

        let mut record = MergedStationRecord {
            name: baseline.name.clone(),
            latitude: baseline.latitude,
            longitude: baseline.longitude,
            pax_annual: annual,
            pax_weekday: weekday,
            pax_am_peak: am,
            pax_pm_peak: pm,
            pax_saturday: saturday,
            pax_sunday: sunday,
            total_actual: 0.0,
            total_expected: self.estimation.missing_sample_expected_factor * weekday,
            total_evasion: 0.0,
            avg_evasion_rate: self.estimation.fallback_rate,
            observation_count: 0,
            volume_tier: None,
            daily_avg: safe_div(annual, self.estimation.days_per_year, 0.0),
            peak_ratio: safe_div(am + pm, weekday, 0.0),
            weekend_ratio: safe_div(saturday + sunday, 2.0 * weekday, 0.0),
            has_sample_data: false,
        };

        if let Some(m) = metrics {
            record.total_actual = m.total_actual;
            record.total_expected = m.total_expected;
            record.total_evasion = m.total_evasion;
            record.avg_evasion_rate = m.avg_evasion_rate;
            record.observation_count = m.observation_count;
            record.volume_tier = Some(m.volume_tier);
            record.has_sample_data = true;
        }

        record
    }
}
