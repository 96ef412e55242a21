//! Rules snapshots for output provenance.
//!
//! A snapshot records which rules produced a payload, so two dashboards can
//! be compared without diffing the rules files themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::RulesPath;
use crate::Rules;

/// A frozen record of the rules in effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    pub schema_version: String,

    /// Path the rules were loaded from (None for built-in rules).
    #[serde(default)]
    pub path: Option<String>,

    /// Where the path came from.
    pub source: String,

    /// SHA-256 of the file content, or of the canonical JSON for built-ins.
    pub hash: String,

    pub summary: RulesSummary,
}

/// Key values for quick reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesSummary {
    pub min_rate: f64,
    pub max_rate: f64,
    pub average_fare: f64,
    pub penalty_fine: f64,
    pub hourly_alert_above: f64,
    pub station_alert_above: f64,
}

impl RulesSnapshot {
    /// Capture a snapshot; `content` is the raw file text when one was read.
    pub fn capture(rules: &Rules, resolved: &RulesPath, content: Option<&str>) -> Self {
        let hash = match content {
            Some(text) => compute_sha256(text),
            None => compute_sha256(&serde_json::to_string(rules).unwrap_or_default()),
        };

        RulesSnapshot {
            timestamp: Utc::now(),
            schema_version: rules.schema_version.clone(),
            path: resolved
                .path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            source: resolved.source.to_string(),
            hash,
            summary: RulesSummary {
                min_rate: rules.estimation.min_rate,
                max_rate: rules.estimation.max_rate,
                average_fare: rules.fares.average_fare,
                penalty_fine: rules.fares.penalty_fine,
                hourly_alert_above: rules.alerts.hourly.alert_above,
                station_alert_above: rules.alerts.station.alert_above,
            },
        }
    }

    /// Whether two snapshots were produced by identical rules.
    pub fn same_rules(&self, other: &RulesSnapshot) -> bool {
        self.hash == other.hash
    }
}

/// Compute the SHA-256 hash of a string.
pub fn compute_sha256(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
