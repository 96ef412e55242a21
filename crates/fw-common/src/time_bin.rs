//! The five fixed daily periods used to bucket tap-on observations.
//!
//! Labels match the sample table verbatim (`pre_AM_peak`, `AM_peak`, ...), so
//! the same strings round-trip through CSV input and JSON output.

use serde::{Deserialize, Serialize};

/// A fixed daily period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeBin {
    /// 06:00-07:59
    #[serde(rename = "pre_AM_peak")]
    PreAmPeak,
    /// 08:00-09:59
    #[serde(rename = "AM_peak")]
    AmPeak,
    /// 10:00-15:59
    #[serde(rename = "interpeak")]
    Interpeak,
    /// 16:00-17:59
    #[serde(rename = "PM_peak")]
    PmPeak,
    /// Every other hour of the day.
    #[serde(rename = "PM_late")]
    PmLate,
}

impl TimeBin {
    /// All bins in chronological order of their first hour.
    pub const ALL: [TimeBin; 5] = [
        TimeBin::PreAmPeak,
        TimeBin::AmPeak,
        TimeBin::Interpeak,
        TimeBin::PmPeak,
        TimeBin::PmLate,
    ];

    /// Resolve the bin for an hour of the day (0-23).
    ///
    /// Hours outside 6..=17 (including out-of-range values) fall into `PmLate`.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6 | 7 => TimeBin::PreAmPeak,
            8 | 9 => TimeBin::AmPeak,
            10..=15 => TimeBin::Interpeak,
            16 | 17 => TimeBin::PmPeak,
            _ => TimeBin::PmLate,
        }
    }

    /// The label used in the sample table.
    pub fn label(&self) -> &'static str {
        match self {
            TimeBin::PreAmPeak => "pre_AM_peak",
            TimeBin::AmPeak => "AM_peak",
            TimeBin::Interpeak => "interpeak",
            TimeBin::PmPeak => "PM_peak",
            TimeBin::PmLate => "PM_late",
        }
    }

    /// Whether this bin is one of the two commuter peaks.
    pub fn is_peak(&self) -> bool {
        matches!(self, TimeBin::AmPeak | TimeBin::PmPeak)
    }
}

impl std::fmt::Display for TimeBin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for TimeBin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pre_AM_peak" => Ok(TimeBin::PreAmPeak),
            "AM_peak" => Ok(TimeBin::AmPeak),
            "interpeak" => Ok(TimeBin::Interpeak),
            "PM_peak" => Ok(TimeBin::PmPeak),
            "PM_late" => Ok(TimeBin::PmLate),
            other => Err(format!("unknown time bin: {}", other)),
        }
    }
}
