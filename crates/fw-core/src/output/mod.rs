//! Payload rendering for the CLI.
//!
//! JSON payloads are wrapped in an envelope carrying the schema version, run
//! id, data status and the rules snapshot. Markdown renders each view as a
//! table; summary renders one line.

mod markdown;

pub use markdown::{fmt_count, fmt_money, fmt_percent, fmt_rate, table};

use chrono::Utc;
use fw_common::{OutputFormat, Result, SCHEMA_VERSION};
use fw_config::RulesSnapshot;
use serde::Serialize;

use crate::aggregate::{DashboardOverview, EvasionSummaryRow, RealtimeFeed, RouteView, StationStats};
use crate::context::DataStatus;
use crate::merge::MergedStationRecord;
use crate::simulate::EvasionAlert;

/// Per-invocation metadata attached to every payload.
#[derive(Debug, Clone, Copy)]
pub struct RenderMeta<'a> {
    pub command: &'a str,
    pub run_id: &'a str,
    pub status: DataStatus,
    pub rules: &'a RulesSnapshot,
}

/// A view that can be printed as Markdown or as a one-line summary.
pub trait Render {
    fn markdown(&self) -> String;
    fn summary_line(&self) -> String;
}

/// Render a view in the requested format.
pub fn render<T>(format: OutputFormat, meta: &RenderMeta<'_>, view: &T) -> Result<String>
where
    T: Serialize + Render + ?Sized,
{
    match format {
        OutputFormat::Json => {
            let value = envelope(meta, view)?;
            Ok(serde_json::to_string_pretty(&value)?)
        }
        OutputFormat::Md => {
            let mut out = format!("# fw-core {}\n\n", meta.command);
            if meta.status != DataStatus::Loaded {
                out.push_str(&format!("> data status: {}\n\n", status_label(meta.status)));
            }
            out.push_str(&view.markdown());
            Ok(out)
        }
        OutputFormat::Summary => Ok(format!(
            "[{}] {}: {}",
            meta.run_id,
            meta.command,
            view.summary_line()
        )),
    }
}

/// The JSON envelope around a view.
pub fn envelope<T: Serialize + ?Sized>(
    meta: &RenderMeta<'_>,
    view: &T,
) -> Result<serde_json::Value> {
    Ok(serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "run_id": meta.run_id,
        "generated_at": Utc::now().to_rfc3339(),
        "command": meta.command,
        "status": meta.status,
        "rules": meta.rules,
        "data": serde_json::to_value(view)?,
    }))
}

pub fn status_label(status: DataStatus) -> &'static str {
    match status {
        DataStatus::NoData => "no data",
        DataStatus::EmptyBaseline => "empty baseline",
        DataStatus::Loaded => "loaded",
    }
}

fn name_or_dash(name: Option<&fw_common::StationName>) -> String {
    name.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string())
}

impl Render for StationStats {
    fn markdown(&self) -> String {
        table(
            &["Metric", "Value"],
            vec![
                vec!["Stations".into(), self.total_stations.to_string()],
                vec![
                    "Annual passengers".into(),
                    fmt_count(self.total_annual_passengers),
                ],
                vec![
                    "Avg daily passengers".into(),
                    fmt_count(self.avg_daily_passengers),
                ],
                vec![
                    "Busiest station".into(),
                    name_or_dash(self.busiest_station.as_ref()),
                ],
                vec![
                    "Quietest station".into(),
                    name_or_dash(self.quietest_station.as_ref()),
                ],
                vec!["Compliance rate".into(), fmt_percent(self.compliance_rate)],
                vec!["Revenue impact".into(), fmt_money(self.revenue_impact)],
            ],
        )
    }

    fn summary_line(&self) -> String {
        format!(
            "{} stations, compliance {}, revenue impact {}",
            self.total_stations,
            fmt_percent(self.compliance_rate),
            fmt_money(self.revenue_impact)
        )
    }
}

impl Render for [MergedStationRecord] {
    fn markdown(&self) -> String {
        table(
            &["#", "Station", "Annual", "Daily avg", "Peak ratio", "Evasion rate", "Sampled"],
            self.iter()
                .enumerate()
                .map(|(i, r)| {
                    vec![
                        (i + 1).to_string(),
                        r.name.to_string(),
                        fmt_count(r.pax_annual),
                        fmt_count(r.daily_avg),
                        format!("{:.2}", r.peak_ratio),
                        fmt_rate(r.avg_evasion_rate),
                        if r.has_sample_data { "yes" } else { "no" }.to_string(),
                    ]
                })
                .collect(),
        )
    }

    fn summary_line(&self) -> String {
        match self.first() {
            Some(first) => format!("{} stations, busiest {}", self.len(), first.name),
            None => "0 stations".to_string(),
        }
    }
}

impl Render for [EvasionSummaryRow] {
    fn markdown(&self) -> String {
        table(
            &["Station", "Expected", "Actual", "Evasion", "Rate", "Observations"],
            self.iter()
                .map(|r| {
                    vec![
                        r.station.to_string(),
                        fmt_count(r.total_expected),
                        fmt_count(r.total_actual),
                        fmt_count(r.total_evasion),
                        fmt_rate(r.avg_evasion_rate),
                        r.observation_count.to_string(),
                    ]
                })
                .collect(),
        )
    }

    fn summary_line(&self) -> String {
        let total: f64 = self.iter().map(|r| r.total_evasion).sum();
        format!("{} stations, total evasion {}", self.len(), fmt_count(total))
    }
}

impl Render for [EvasionAlert] {
    fn markdown(&self) -> String {
        table(
            &["Station", "Time", "Rate", "Severity", "Fines"],
            self.iter()
                .map(|a| {
                    vec![
                        a.station.to_string(),
                        crate::timestamp::format(&a.timestamp),
                        fmt_rate(a.evasion_rate),
                        a.severity.to_string(),
                        fmt_money(a.expected_fines),
                    ]
                })
                .collect(),
        )
    }

    fn summary_line(&self) -> String {
        let high = self
            .iter()
            .filter(|a| a.severity == fw_common::Severity::High)
            .count();
        format!("{} alerts ({} high)", self.len(), high)
    }
}

impl Render for [RouteView] {
    fn markdown(&self) -> String {
        table(
            &["Id", "Name", "Type", "Non-compliance", "Daily passengers", "Fines", "Risk"],
            self.iter()
                .map(|r| {
                    vec![
                        r.id.clone(),
                        r.name.clone(),
                        format!("{:?}", r.route_type).to_lowercase(),
                        format!("{:.1}%", r.non_compliance_rate),
                        fmt_count(r.avg_daily_passengers),
                        r.expected_fines.to_string(),
                        format!("{:?}", r.risk_level).to_lowercase(),
                    ]
                })
                .collect(),
        )
    }

    fn summary_line(&self) -> String {
        format!("{} routes", self.len())
    }
}

impl Render for RealtimeFeed {
    fn markdown(&self) -> String {
        let mut out = format!(
            "Generated at {}\n\n## Events\n\n",
            crate::timestamp::format(&self.timestamp)
        );
        out.push_str(&table(
            &["Station", "Time", "Bin", "Expected", "Actual", "Rate", "Fines"],
            self.realtime_data
                .iter()
                .map(|e| {
                    vec![
                        e.station.to_string(),
                        crate::timestamp::format(&e.timestamp),
                        e.time_bin.label().to_string(),
                        e.expected.to_string(),
                        e.actual.to_string(),
                        fmt_rate(e.evasion_rate),
                        fmt_money(e.expected_fines),
                    ]
                })
                .collect(),
        ));
        out.push_str("\n## Alerts\n\n");
        out.push_str(&self.evasion_alerts.markdown());
        out
    }

    fn summary_line(&self) -> String {
        format!(
            "{} events, {} alerts at {}",
            self.realtime_data.len(),
            self.evasion_alerts.len(),
            crate::timestamp::format(&self.timestamp)
        )
    }
}

impl Render for DashboardOverview {
    fn markdown(&self) -> String {
        let mut out = String::from("## Statistics\n\n");
        out.push_str(&self.stats.markdown());
        out.push_str(&format!(
            "\nTotal evasion: {} | High-risk stations: {} | Active alerts: {}\n",
            fmt_count(self.total_evasion),
            self.high_risk_stations,
            self.active_alerts
        ));
        out.push_str("\n## Top stations\n\n");
        out.push_str(&self.top_stations.markdown());
        out.push_str("\n## Evasion alerts\n\n");
        out.push_str(&self.evasion_alerts.markdown());
        out.push_str("\n## Evasion chart\n\n");
        out.push_str(&self.chart_data.markdown());
        out
    }

    fn summary_line(&self) -> String {
        format!(
            "{} stations, {} high-risk, {} active alerts, evasion {}",
            self.stats.total_stations,
            self.high_risk_stations,
            self.active_alerts,
            fmt_count(self.total_evasion)
        )
    }
}
