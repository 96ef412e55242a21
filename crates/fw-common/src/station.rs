//! Station identity, volume tiers, and alert severities.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Station identifier (the `Stop_name` column). Unique key across both tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationName(String);

impl StationName {
    /// Create a station name, trimming surrounding whitespace.
    pub fn new(name: impl AsRef<str>) -> Self {
        StationName(name.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for StationName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for StationName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StationName {
    fn from(s: &str) -> Self {
        StationName::new(s)
    }
}

impl From<String> for StationName {
    fn from(s: String) -> Self {
        StationName::new(s)
    }
}

/// Observed-volume tier of a station, used to pick the variance range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTier {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for VolumeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VolumeTier::Low => write!(f, "low"),
            VolumeTier::Medium => write!(f, "medium"),
            VolumeTier::High => write!(f, "high"),
        }
    }
}

/// Alert severity tier.
///
/// Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_name_trims() {
        let name = StationName::new("  Flinders Street ");
        assert_eq!(name.as_str(), "Flinders Street");
        assert_eq!(name.to_string(), "Flinders Street");
    }

    #[test]
    fn test_station_name_serializes_as_string() {
        let name = StationName::from("Richmond");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"Richmond\"");
    }

    #[test]
    fn test_severity_ordering_and_serde() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"HIGH\"");
        assert_eq!(Severity::Low.to_string(), "LOW");
    }

    #[test]
    fn test_volume_tier_display() {
        assert_eq!(VolumeTier::Medium.to_string(), "medium");
        assert_eq!(
            serde_json::to_string(&VolumeTier::High).unwrap(),
            "\"high\""
        );
    }
}
