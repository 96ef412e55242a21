//! Simplified per-station "route" cards.
//!
//! Built from the head of the evasion summary. The type comes from name
//! keywords, not from network data.

use fw_config::rules::{FareRules, RouteRules};
use fw_math::round_to;
use serde::{Deserialize, Serialize};

use super::EvasionSummaryRow;

/// Transport mode guessed from the station name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    Train,
    Bus,
    Tram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// One route card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteView {
    /// `route_<n>`, 1-based in summary order.
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub route_type: RouteType,
    /// Percentage with one decimal.
    pub non_compliance_rate: f64,
    pub avg_daily_passengers: f64,
    pub expected_fines: u64,
    pub peak_hours: String,
    pub risk_level: RiskLevel,
}

/// Classify a station name by case-insensitive keyword match.
///
/// Train keywords are checked before bus keywords.
pub fn classify_route(name: &str, rules: &RouteRules) -> RouteType {
    let lower = name.to_lowercase();
    let matches = |keywords: &[String]| {
        keywords
            .iter()
            .any(|k| lower.contains(k.to_lowercase().as_str()))
    };
    if matches(&rules.train_keywords) {
        RouteType::Train
    } else if matches(&rules.bus_keywords) {
        RouteType::Bus
    } else {
        RouteType::Tram
    }
}

pub fn risk_level(rate: f64, rules: &RouteRules) -> RiskLevel {
    if rate > rules.risk_high_above {
        RiskLevel::High
    } else if rate > rules.risk_medium_above {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub(crate) fn build_routes(
    summary: &[EvasionSummaryRow],
    limit: usize,
    routes: &RouteRules,
    fares: &FareRules,
) -> Vec<RouteView> {
    summary
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, row)| {
            let fines = row.total_evasion * fares.route_fine_fraction;
            RouteView {
                id: format!("route_{}", i + 1),
                name: row.station.to_string(),
                route_type: classify_route(row.station.as_str(), routes),
                non_compliance_rate: round_to(row.avg_evasion_rate * 100.0, 1),
                avg_daily_passengers: row.total_expected,
                expected_fines: if fines > 0.0 { fines.trunc() as u64 } else { 0 },
                peak_hours: routes.peak_hours_label.clone(),
                risk_level: risk_level(row.avg_evasion_rate, routes),
            }
        })
        .collect()
}
