//! Read views over the canonical station collection.
//!
//! Every view is freshly built; nothing here mutates the station set or the
//! realtime stream. An empty station set yields zeroed/empty views.

mod routes;

pub use routes::{classify_route, risk_level, RiskLevel, RouteType, RouteView};

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use fw_common::StationName;
use fw_config::Rules;
use fw_math::{mean, percentage};
use serde::{Deserialize, Serialize};

use crate::merge::{MergedStationRecord, StationSet};
use crate::simulate::{AlertSource, EvasionAlert, RealtimeEventRecord, RealtimeStream};

/// Network-wide statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationStats {
    pub total_stations: usize,
    pub total_annual_passengers: f64,
    /// Mean of per-station daily averages.
    pub avg_daily_passengers: f64,
    pub busiest_station: Option<StationName>,
    pub quietest_station: Option<StationName>,
    /// `100 × Σactual / Σexpected`, zero when nothing was expected.
    pub compliance_rate: f64,
    /// `Σevasion × average fare`.
    pub revenue_impact: f64,
}

/// Evasion figures for one station, without baseline detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvasionSummaryRow {
    pub station: StationName,
    pub total_expected: f64,
    pub total_actual: f64,
    pub total_evasion: f64,
    pub avg_evasion_rate: f64,
    pub observation_count: usize,
}

impl From<&MergedStationRecord> for EvasionSummaryRow {
    fn from(r: &MergedStationRecord) -> Self {
        EvasionSummaryRow {
            station: r.name.clone(),
            total_expected: r.total_expected,
            total_actual: r.total_actual,
            total_evasion: r.total_evasion,
            avg_evasion_rate: r.avg_evasion_rate,
            observation_count: r.observation_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Everything the dashboard landing page shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub stats: StationStats,
    pub top_stations: Vec<MergedStationRecord>,
    pub evasion_alerts: Vec<EvasionAlert>,
    pub total_evasion: f64,
    pub high_risk_stations: usize,
    pub active_alerts: usize,
    pub chart_data: Vec<EvasionSummaryRow>,
    /// Stations with both coordinates known, keyed by name.
    pub station_coordinates: BTreeMap<String, Coordinates>,
    #[serde(with = "crate::timestamp")]
    pub data_timestamp: NaiveDateTime,
}

/// Tail of the latest realtime stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeFeed {
    pub realtime_data: Vec<RealtimeEventRecord>,
    pub evasion_alerts: Vec<EvasionAlert>,
    #[serde(with = "crate::timestamp")]
    pub timestamp: NaiveDateTime,
}

fn tail<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    items[items.len().saturating_sub(n)..].to_vec()
}

/// Builds read views from a station set and the active rules.
#[derive(Debug, Clone, Copy)]
pub struct AggregationService<'a> {
    stations: &'a StationSet,
    rules: &'a Rules,
}

impl<'a> AggregationService<'a> {
    pub fn new(stations: &'a StationSet, rules: &'a Rules) -> Self {
        AggregationService { stations, rules }
    }

    /// Full canonical collection, busiest first.
    pub fn stations(&self) -> &'a [MergedStationRecord] {
        self.stations.records()
    }

    /// First `n` stations by annual ridership.
    pub fn top_stations(&self, n: usize) -> &'a [MergedStationRecord] {
        let records = self.stations.records();
        &records[..n.min(records.len())]
    }

    pub fn summary(&self) -> StationStats {
        let records = self.stations.records();
        let daily: Vec<f64> = records.iter().map(|r| r.daily_avg).collect();
        let total_expected: f64 = records.iter().map(|r| r.total_expected).sum();
        let total_actual: f64 = records.iter().map(|r| r.total_actual).sum();

        StationStats {
            total_stations: records.len(),
            total_annual_passengers: records.iter().map(|r| r.pax_annual).sum(),
            avg_daily_passengers: mean(&daily),
            busiest_station: self.stations.busiest().map(|r| r.name.clone()),
            quietest_station: self.stations.quietest().map(|r| r.name.clone()),
            compliance_rate: percentage(total_actual, total_expected),
            revenue_impact: self.total_evasion() * self.rules.fares.average_fare,
        }
    }

    pub fn total_evasion(&self) -> f64 {
        self.stations.iter().map(|r| r.total_evasion).sum()
    }

    /// Station-level alerts, highest rate first, capped at the view limit.
    ///
    /// Fines use the per-incident penalty, not the average fare.
    pub fn station_alerts(&self, now: NaiveDateTime) -> Vec<EvasionAlert> {
        let thresholds = self.rules.alerts.station;
        let mut alerts: Vec<EvasionAlert> = self
            .stations
            .iter()
            .filter_map(|r| {
                thresholds.classify(r.avg_evasion_rate).map(|severity| EvasionAlert {
                    station: r.name.clone(),
                    timestamp: now,
                    evasion_rate: r.avg_evasion_rate,
                    severity,
                    expected_fines: r.total_evasion * self.rules.fares.penalty_fine,
                    source: AlertSource::Station,
                })
            })
            .collect();

        alerts.sort_by(|a, b| b.evasion_rate.total_cmp(&a.evasion_rate));
        alerts.truncate(self.rules.views.station_alert_limit);
        alerts
    }

    /// Every station's evasion figures, largest evasion first.
    pub fn evasion_summary(&self) -> Vec<EvasionSummaryRow> {
        let mut rows: Vec<EvasionSummaryRow> =
            self.stations.iter().map(EvasionSummaryRow::from).collect();
        rows.sort_by(|a, b| b.total_evasion.total_cmp(&a.total_evasion));
        rows
    }

    pub fn routes(&self) -> Vec<RouteView> {
        routes::build_routes(
            &self.evasion_summary(),
            self.rules.views.route_rows,
            &self.rules.routes,
            &self.rules.fares,
        )
    }

    pub fn high_risk_stations(&self) -> usize {
        let cutoff = self.rules.alerts.high_risk_station_above;
        self.stations
            .iter()
            .filter(|r| r.avg_evasion_rate > cutoff)
            .count()
    }

    pub fn station_coordinates(&self) -> BTreeMap<String, Coordinates> {
        self.stations
            .iter()
            .filter_map(|r| {
                r.coordinates()
                    .map(|(lat, lng)| (r.name.to_string(), Coordinates { lat, lng }))
            })
            .collect()
    }

    pub fn overview(&self, now: NaiveDateTime) -> DashboardOverview {
        let evasion_alerts = self.station_alerts(now);
        let mut chart_data = self.evasion_summary();
        chart_data.truncate(self.rules.views.chart_rows);

        DashboardOverview {
            stats: self.summary(),
            top_stations: self.top_stations(self.rules.views.top_stations).to_vec(),
            active_alerts: evasion_alerts.len(),
            evasion_alerts,
            total_evasion: self.total_evasion(),
            high_risk_stations: self.high_risk_stations(),
            chart_data,
            station_coordinates: self.station_coordinates(),
            data_timestamp: now,
        }
    }

    /// The most recent events and alerts of a stream.
    pub fn realtime_feed(&self, stream: &RealtimeStream) -> RealtimeFeed {
        RealtimeFeed {
            realtime_data: tail(&stream.events, self.rules.views.realtime_event_window),
            evasion_alerts: tail(&stream.alerts, self.rules.views.realtime_alert_window),
            timestamp: stream.generated_at,
        }
    }
}
