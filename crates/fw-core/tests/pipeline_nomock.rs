//! End-to-end pipeline tests over real CSV files.
//!
//! Each test writes both tables into a temp directory, runs the context
//! through reload and refresh, and checks the published views.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use fw_common::{Severity, TimeBin};
use fw_config::{DataPaths, Rules, RulesSource};
use fw_core::context::{DataStatus, PipelineContext};
use fw_core::estimate::{FixedFactorSampler, UniformSampler, VarianceSampler};
use fw_core::logging::LogContext;
use tempfile::TempDir;

const BASELINE_HEADER: &str =
    "Stop_name,Stop_lat,Stop_long,Pax_annual,Pax_weekday,Pax_AM_peak,Pax_PM_peak,Pax_Saturday,Pax_Sunday";
const SAMPLE_HEADER: &str = "Stop_name,time_bin,actual";

fn write_tables(dir: &Path, baseline: &str, sample: &str) -> DataPaths {
    let baseline_path = dir.join("expected.csv");
    let sample_path = dir.join("sample_tap_on_dataset.csv");
    fs::write(&baseline_path, baseline).unwrap();
    fs::write(&sample_path, sample).unwrap();
    DataPaths {
        baseline: baseline_path,
        baseline_source: RulesSource::CliArgument,
        sample: sample_path,
        sample_source: RulesSource::CliArgument,
    }
}

fn context(paths: DataPaths, sampler: Box<dyn VarianceSampler>) -> PipelineContext {
    PipelineContext::new(
        Rules::default(),
        paths,
        sampler,
        LogContext::new("run-nomock", "host-nomock"),
    )
}

fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 2)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn flinders_tables(dir: &Path, sample_rows: &str) -> DataPaths {
    write_tables(
        dir,
        &format!(
            "{BASELINE_HEADER}\nFlinders Street,-37.8183,144.9671,365000,1000,200,250,600,400\n"
        ),
        &format!("{SAMPLE_HEADER}\n{sample_rows}"),
    )
}

/// Thirty stations, each sampled in the AM and PM peaks.
fn network_tables(dir: &Path) -> DataPaths {
    let mut baseline = format!("{BASELINE_HEADER}\n");
    let mut sample = format!("{SAMPLE_HEADER}\n");
    for i in 0..30u32 {
        let annual = 100_000 + (i * 7919) % 50_000;
        writeln!(
            baseline,
            "Station {i},-37.{i:02},144.{i:02},{annual},2000,400,400,900,700"
        )
        .unwrap();
        writeln!(sample, "Station {i},AM_peak,{}", 60 + i * 5).unwrap();
        writeln!(sample, "Station {i},PM_peak,{}", 100 + i * 4).unwrap();
    }
    write_tables(dir, &baseline, &sample)
}

#[test]
fn flinders_street_scenario() {
    let tmp = TempDir::new().unwrap();
    let ctx = context(
        flinders_tables(tmp.path(), "Flinders Street,AM_peak,150\n"),
        Box::new(UniformSampler::seeded(2024)),
    );

    let snapshot = ctx.reload().unwrap();
    assert_eq!(snapshot.status, DataStatus::Loaded);

    let station = snapshot.stations.get("Flinders Street").unwrap();
    assert!((station.total_expected - 172.5).abs() < 1e-9);
    assert!((station.total_evasion - 22.5).abs() < 1e-9);
    assert!((0.02..=0.40).contains(&station.avg_evasion_rate));
    assert_eq!(station.observation_count, 1);

    let metrics = &snapshot.metrics[0];
    assert!((metrics.base_rate - 22.5 / 172.5).abs() < 1e-12);
}

#[test]
fn flinders_street_pinned_variance() {
    let tmp = TempDir::new().unwrap();
    let ctx = context(
        flinders_tables(tmp.path(), "Flinders Street,AM_peak,150\n"),
        Box::new(FixedFactorSampler::identity()),
    );

    let snapshot = ctx.reload().unwrap();
    let views = snapshot.views(ctx.rules());
    let stats = views.summary();

    assert_eq!(stats.total_stations, 1);
    assert_eq!(stats.busiest_station.as_ref().unwrap().as_str(), "Flinders Street");
    assert!((stats.avg_daily_passengers - 1000.0).abs() < 1e-9);
    assert!((stats.compliance_rate - 100.0 * 150.0 / 172.5).abs() < 1e-9);
    assert!((stats.revenue_impact - 22.5 * 4.5).abs() < 1e-9);

    // 0.1304 is above the station alert threshold but below MEDIUM.
    let alerts = views.station_alerts(noon());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::Low);
    assert!((alerts[0].expected_fines - 22.5 * 250.0).abs() < 1e-9);
}

#[test]
fn empty_baseline_yields_zero_views() {
    let tmp = TempDir::new().unwrap();
    let paths = write_tables(
        tmp.path(),
        &format!("{BASELINE_HEADER}\n"),
        &format!("{SAMPLE_HEADER}\nFlinders Street,AM_peak,150\n"),
    );
    let ctx = context(paths, Box::new(FixedFactorSampler::identity()));

    let snapshot = ctx.reload().unwrap();
    assert_eq!(snapshot.status, DataStatus::EmptyBaseline);

    let stats = snapshot.views(ctx.rules()).summary();
    assert_eq!(stats.total_stations, 0);
    assert_eq!(stats.compliance_rate, 0.0);
    assert_eq!(stats.revenue_impact, 0.0);
    assert!(stats.busiest_station.is_none());
    assert!(stats.quietest_station.is_none());

    assert!(ctx.refresh_realtime(noon()).is_empty());
}

#[test]
fn zero_expected_falls_back() {
    let tmp = TempDir::new().unwrap();
    let ctx = context(
        flinders_tables(tmp.path(), "Flinders Street,AM_peak,0\n"),
        Box::new(FixedFactorSampler::identity()),
    );

    let snapshot = ctx.reload().unwrap();
    let station = snapshot.stations.get("Flinders Street").unwrap();
    assert_eq!(station.total_expected, 0.0);
    assert_eq!(station.total_evasion, 0.0);
    assert_eq!(station.avg_evasion_rate, 0.05);
    assert_eq!(snapshot.views(ctx.rules()).summary().compliance_rate, 0.0);
}

#[test]
fn malformed_cells_become_missing() {
    let tmp = TempDir::new().unwrap();
    let paths = write_tables(
        tmp.path(),
        &format!(
            "{BASELINE_HEADER}\nFlinders Street,n/a,144.9671,365000,1000,200,250,600,400\nRichmond,-37.82,145.0,abc,500,100,120,200,150\n"
        ),
        &format!("{SAMPLE_HEADER}\nFlinders Street,AM_peak,150\nRichmond,PM_peak,lots\n"),
    );
    let ctx = context(paths, Box::new(FixedFactorSampler::identity()));

    let snapshot = ctx.reload().unwrap();
    assert_eq!(snapshot.report.malformed_cells(), 3);
    assert_eq!(snapshot.stations.len(), 2);

    let flinders = snapshot.stations.get("Flinders Street").unwrap();
    assert_eq!(flinders.coordinates(), None);
    let richmond = snapshot.stations.get("Richmond").unwrap();
    assert_eq!(richmond.pax_annual, 0.0);
    assert_eq!(richmond.total_actual, 0.0);
    assert_eq!(richmond.observation_count, 1);

    // Only stations with both coordinates reach the map.
    let coords = snapshot.views(ctx.rules()).station_coordinates();
    assert_eq!(coords.len(), 1);
    assert!(coords.contains_key("Richmond"));
}

#[test]
fn missing_source_degrades_to_no_data() {
    let tmp = TempDir::new().unwrap();
    let paths = flinders_tables(tmp.path(), "Flinders Street,AM_peak,150\n");
    let sample_path = paths.sample.clone();
    let ctx = context(paths, Box::new(FixedFactorSampler::identity()));

    ctx.reload().unwrap();
    assert!(!ctx.refresh_realtime(noon()).events.is_empty());

    fs::remove_file(&sample_path).unwrap();
    let err = ctx.reload().unwrap_err();
    assert!(err.is_load_failure());
    assert_eq!(err.code(), 20);

    // The stream built from the old tables is gone before any refresh.
    let stream = ctx.realtime();
    assert!(stream.events.is_empty());
    assert!(stream.alerts.is_empty());

    let snapshot = ctx.stations();
    assert_eq!(snapshot.status, DataStatus::NoData);
    let views = snapshot.views(ctx.rules());
    assert!(views.realtime_feed(&stream).realtime_data.is_empty());
    assert_eq!(views.summary().total_stations, 0);
    assert!(views.station_alerts(noon()).is_empty());
    assert!(views.routes().is_empty());
    assert!(ctx.refresh_realtime(noon()).is_empty());
}

#[test]
fn merged_collection_is_sorted_and_complete() {
    let tmp = TempDir::new().unwrap();
    let ctx = context(network_tables(tmp.path()), Box::new(UniformSampler::seeded(11)));
    let snapshot = ctx.reload().unwrap();
    let stations = &snapshot.stations;

    assert_eq!(stations.len(), 30);
    for pair in stations.records().windows(2) {
        assert!(pair[0].pax_annual >= pair[1].pax_annual);
    }
    assert_eq!(
        stations.busiest().unwrap().name,
        stations.records()[0].name
    );
    assert_eq!(
        stations.quietest().unwrap().name,
        stations.records()[29].name
    );

    for record in stations {
        assert!(record.has_sample_data);
        assert!((0.02..=0.40).contains(&record.avg_evasion_rate));
        assert_eq!(
            record.total_evasion,
            (record.total_expected - record.total_actual).max(0.0)
        );
    }
}

#[test]
fn station_alerts_are_thresholded_sorted_and_capped() {
    let tmp = TempDir::new().unwrap();
    let ctx = context(
        network_tables(tmp.path()),
        Box::new(FixedFactorSampler::identity()),
    );
    let snapshot = ctx.reload().unwrap();
    let views = snapshot.views(ctx.rules());

    let eligible = snapshot
        .stations
        .iter()
        .filter(|r| r.avg_evasion_rate > 0.10)
        .count();
    assert!(eligible > 20);

    let alerts = views.station_alerts(noon());
    assert_eq!(alerts.len(), 20);
    for pair in alerts.windows(2) {
        assert!(pair[0].evasion_rate >= pair[1].evasion_rate);
    }
    for alert in &alerts {
        let expected = if alert.evasion_rate > 0.25 {
            Severity::High
        } else if alert.evasion_rate > 0.15 {
            Severity::Medium
        } else {
            Severity::Low
        };
        assert_eq!(alert.severity, expected);
        assert_eq!(alert.timestamp, noon());
    }

    let overview = views.overview(noon());
    assert_eq!(overview.active_alerts, 20);
    assert_eq!(overview.top_stations.len(), 10);
    assert_eq!(overview.chart_data.len(), 10);
    assert_eq!(overview.station_coordinates.len(), 30);
}

#[test]
fn realtime_events_and_alerts() {
    let tmp = TempDir::new().unwrap();
    let ctx = context(network_tables(tmp.path()), Box::new(UniformSampler::seeded(3)));
    ctx.reload().unwrap();

    let stream = ctx.refresh_realtime(noon());
    // AM peak hours 8-9 and PM peak hours 16-17 each appear once in the window.
    assert_eq!(stream.events.len(), 30 * 4);

    for event in &stream.events {
        assert!(event.actual <= event.expected);
        assert_eq!(TimeBin::from_hour(event.hour), event.time_bin);
    }

    let over: Vec<_> = stream
        .events
        .iter()
        .filter(|e| e.evasion_rate > 0.15)
        .collect();
    assert_eq!(over.len(), stream.alerts.len());
    for (event, alert) in over.iter().zip(&stream.alerts) {
        assert_eq!(alert.station, event.station);
        assert_eq!(alert.timestamp, event.timestamp);
        let expected = if event.evasion_rate > 0.30 {
            Severity::High
        } else if event.evasion_rate > 0.20 {
            Severity::Medium
        } else {
            Severity::Low
        };
        assert_eq!(alert.severity, expected);
    }

    let feed = snapshot_feed(&ctx);
    assert_eq!(feed.0, 100);
    assert_eq!(feed.1, stream.alerts.len().min(20));
}

fn snapshot_feed(ctx: &PipelineContext) -> (usize, usize) {
    let stations = ctx.stations();
    let stream = ctx.realtime();
    let feed = stations.views(ctx.rules()).realtime_feed(&stream);
    (feed.realtime_data.len(), feed.evasion_alerts.len())
}

#[test]
fn realtime_refresh_replaces_previous_stream() {
    let tmp = TempDir::new().unwrap();
    let ctx = context(network_tables(tmp.path()), Box::new(UniformSampler::seeded(5)));
    ctx.reload().unwrap();

    let first = ctx.refresh_realtime(noon());
    let second = ctx.refresh_realtime(noon());
    assert_eq!(first.events.len(), second.events.len());
    assert_eq!(first.events, second.events);
    assert_eq!(ctx.realtime().events.len(), second.events.len());

    for name in ["Station 0", "Station 17"] {
        let per_station = ctx
            .realtime()
            .events
            .iter()
            .filter(|e| e.station.as_str() == name)
            .count();
        assert!(per_station <= 24);
    }
}

#[test]
fn reload_picks_up_changed_tables() {
    let tmp = TempDir::new().unwrap();
    let paths = flinders_tables(tmp.path(), "Flinders Street,AM_peak,150\n");
    let sample_path = paths.sample.clone();
    let ctx = context(paths, Box::new(FixedFactorSampler::identity()));

    let before = ctx.reload().unwrap();
    fs::write(
        &sample_path,
        format!("{SAMPLE_HEADER}\nFlinders Street,AM_peak,150\nFlinders Street,PM_peak,100\n"),
    )
    .unwrap();
    let after = ctx.reload().unwrap();

    assert_eq!(before.stations.records()[0].observation_count, 1);
    assert_eq!(after.stations.records()[0].observation_count, 2);
    assert_eq!(ctx.stations().stations.records()[0].observation_count, 2);
}
