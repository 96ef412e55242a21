//! Business rule types.
//!
//! Every constant the pipeline applies lives here with its production default.
//! A rules file only needs to name the fields it overrides.
//!
//! The hourly simulator prices evasion at the average fare while the
//! station-level alert view prices it at the penalty fine. Both are kept.

use fw_common::{Severity, TimeBin, VolumeTier};
use serde::{Deserialize, Serialize};

use crate::validate::{ValidationError, ValidationResult};

/// Complete rules document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub estimation: EstimationRules,
    #[serde(default)]
    pub jitter: JitterRules,
    #[serde(default)]
    pub fares: FareRules,
    #[serde(default)]
    pub alerts: AlertRules,
    #[serde(default)]
    pub views: ViewRules,
    #[serde(default)]
    pub routes: RouteRules,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            description: None,
            estimation: EstimationRules::default(),
            jitter: JitterRules::default(),
            fares: FareRules::default(),
            alerts: AlertRules::default(),
            views: ViewRules::default(),
            routes: RouteRules::default(),
        }
    }
}

impl Rules {
    /// Load rules from a JSON file.
    pub fn from_file(path: &std::path::Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_json(&content)
    }

    /// Parse rules from a JSON string.
    pub fn parse_json(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Validate semantically.
    pub fn validate(&self) -> ValidationResult<()> {
        crate::validate::validate_rules(self)
    }
}

/// Expected-count modeling constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationRules {
    /// Per-bin ratio of modeled expected to observed tap-ons.
    #[serde(default)]
    pub multipliers: BinMultipliers,

    /// Multiplier for observations whose label is not one of the five bins.
    #[serde(default = "default_unrecognized_multiplier")]
    pub unrecognized_multiplier: f64,

    /// Base rate when a station's total expected count is zero.
    #[serde(default = "default_fallback_rate")]
    pub fallback_rate: f64,

    #[serde(default = "default_min_rate")]
    pub min_rate: f64,

    #[serde(default = "default_max_rate")]
    pub max_rate: f64,

    /// Placeholder `total_expected = factor × weekday` for stations with no samples.
    #[serde(default = "default_missing_sample_factor")]
    pub missing_sample_expected_factor: f64,

    #[serde(default = "default_days_per_year")]
    pub days_per_year: f64,
}

fn default_unrecognized_multiplier() -> f64 {
    1.10
}
fn default_fallback_rate() -> f64 {
    0.05
}
fn default_min_rate() -> f64 {
    0.02
}
fn default_max_rate() -> f64 {
    0.40
}
fn default_missing_sample_factor() -> f64 {
    16.0
}
fn default_days_per_year() -> f64 {
    365.0
}

impl Default for EstimationRules {
    fn default() -> Self {
        Self {
            multipliers: BinMultipliers::default(),
            unrecognized_multiplier: default_unrecognized_multiplier(),
            fallback_rate: default_fallback_rate(),
            min_rate: default_min_rate(),
            max_rate: default_max_rate(),
            missing_sample_expected_factor: default_missing_sample_factor(),
            days_per_year: default_days_per_year(),
        }
    }
}

impl EstimationRules {
    /// Multiplier for an observation; `None` is an unrecognized label.
    pub fn multiplier(&self, bin: Option<TimeBin>) -> f64 {
        match bin {
            Some(bin) => self.multipliers.for_bin(bin),
            None => self.unrecognized_multiplier,
        }
    }
}

/// One multiplier per time bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinMultipliers {
    #[serde(rename = "pre_AM_peak")]
    pub pre_am_peak: f64,
    #[serde(rename = "AM_peak")]
    pub am_peak: f64,
    pub interpeak: f64,
    #[serde(rename = "PM_peak")]
    pub pm_peak: f64,
    #[serde(rename = "PM_late")]
    pub pm_late: f64,
}

impl Default for BinMultipliers {
    fn default() -> Self {
        Self {
            pre_am_peak: 1.10,
            am_peak: 1.15,
            interpeak: 1.05,
            pm_peak: 1.12,
            pm_late: 1.08,
        }
    }
}

impl BinMultipliers {
    pub fn for_bin(&self, bin: TimeBin) -> f64 {
        match bin {
            TimeBin::PreAmPeak => self.pre_am_peak,
            TimeBin::AmPeak => self.am_peak,
            TimeBin::Interpeak => self.interpeak,
            TimeBin::PmPeak => self.pm_peak,
            TimeBin::PmLate => self.pm_late,
        }
    }
}

/// Closed range a variance factor is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorRange {
    pub low: f64,
    pub high: f64,
}

impl FactorRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, factor: f64) -> bool {
        factor >= self.low && factor <= self.high
    }

    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

/// Volume-tiered variance applied to each station's base rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterRules {
    /// Stations observing more than this many tap-ons are `high` volume.
    pub high_volume_above: f64,
    /// Stations observing more than this (and not high) are `medium` volume.
    pub medium_volume_above: f64,
    pub high: FactorRange,
    pub medium: FactorRange,
    pub low: FactorRange,
}

impl Default for JitterRules {
    fn default() -> Self {
        Self {
            high_volume_above: 1000.0,
            medium_volume_above: 500.0,
            high: FactorRange::new(1.10, 1.30),
            medium: FactorRange::new(0.90, 1.20),
            low: FactorRange::new(0.70, 1.10),
        }
    }
}

impl JitterRules {
    pub fn tier(&self, total_actual: f64) -> VolumeTier {
        if total_actual > self.high_volume_above {
            VolumeTier::High
        } else if total_actual > self.medium_volume_above {
            VolumeTier::Medium
        } else {
            VolumeTier::Low
        }
    }

    pub fn range(&self, tier: VolumeTier) -> FactorRange {
        match tier {
            VolumeTier::High => self.high,
            VolumeTier::Medium => self.medium,
            VolumeTier::Low => self.low,
        }
    }
}

/// Monetary constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FareRules {
    /// Average fare; prices hourly shortfall and summary revenue impact.
    pub average_fare: f64,
    /// Penalty fine; prices shortfall in station-level alerts.
    pub penalty_fine: f64,
    /// Share of evaders assumed fined in the route view.
    pub route_fine_fraction: f64,
}

impl Default for FareRules {
    fn default() -> Self {
        Self {
            average_fare: 4.50,
            penalty_fine: 250.0,
            route_fine_fraction: 0.1,
        }
    }
}

/// Rate thresholds for raising an alert and assigning its severity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    /// No alert at or below this rate.
    pub alert_above: f64,
    pub medium_above: f64,
    pub high_above: f64,
}

impl SeverityThresholds {
    /// Severity for `rate`, or `None` when no alert should be raised.
    pub fn classify(&self, rate: f64) -> Option<Severity> {
        if rate.is_nan() || rate <= self.alert_above {
            None
        } else if rate > self.high_above {
            Some(Severity::High)
        } else if rate > self.medium_above {
            Some(Severity::Medium)
        } else {
            Some(Severity::Low)
        }
    }
}

/// Alerting thresholds for both alert sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertRules {
    pub hourly: SeverityThresholds,
    pub station: SeverityThresholds,
    /// Stations above this average rate count as high risk in the overview.
    pub high_risk_station_above: f64,
}

impl Default for AlertRules {
    fn default() -> Self {
        Self {
            hourly: SeverityThresholds {
                alert_above: 0.15,
                medium_above: 0.20,
                high_above: 0.30,
            },
            station: SeverityThresholds {
                alert_above: 0.10,
                medium_above: 0.15,
                high_above: 0.25,
            },
            high_risk_station_above: 0.15,
        }
    }
}

/// Sizes of the read views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewRules {
    pub top_stations: usize,
    pub station_alert_limit: usize,
    pub realtime_event_window: usize,
    pub realtime_alert_window: usize,
    pub chart_rows: usize,
    pub route_rows: usize,
    /// Trailing hourly marks simulated per station.
    pub simulation_hours: u32,
}

impl Default for ViewRules {
    fn default() -> Self {
        Self {
            top_stations: 10,
            station_alert_limit: 20,
            realtime_event_window: 100,
            realtime_alert_window: 20,
            chart_rows: 10,
            route_rows: 20,
            simulation_hours: 24,
        }
    }
}

/// Route view heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteRules {
    /// Substrings marking a train station, matched case-insensitively.
    pub train_keywords: Vec<String>,
    /// Substrings marking a bus stop, matched case-insensitively.
    pub bus_keywords: Vec<String>,
    pub peak_hours_label: String,
    pub risk_high_above: f64,
    pub risk_medium_above: f64,
}

impl Default for RouteRules {
    fn default() -> Self {
        Self {
            train_keywords: [
                "central",
                "flinders",
                "southern cross",
                "parliament",
                "melbourne central",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            bus_keywords: ["bus", "interchange"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            peak_hours_label: "7-9 AM, 5-7 PM".to_string(),
            risk_high_above: 0.6,
            risk_medium_above: 0.3,
        }
    }
}
