//! Process-wide pipeline state.
//!
//! [`PipelineContext`] holds the latest station snapshot and the latest
//! realtime stream. Each is rebuilt off to the side and published by swapping
//! an `Arc`, so a reader sees either the old or the new generation, never a
//! mix. Readers clone the `Arc` and release the lock immediately.

use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use fw_common::Result;
use fw_config::{DataPaths, Rules};
use serde::Serialize;

use crate::aggregate::AggregationService;
use crate::estimate::{EvasionEstimator, StationEvasionMetrics, VarianceSampler};
use crate::load::{LoadReport, LoadedData, SampleObservation, StationBaselineLoader};
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use crate::merge::{StationMerger, StationSet};
use crate::simulate::{RealtimeSimulator, RealtimeStream};

/// Whether a snapshot holds usable data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    /// Nothing loaded yet, or the last load failed.
    NoData,
    /// Tables loaded but the baseline had no stations.
    EmptyBaseline,
    Loaded,
}

/// One generation of loaded and merged station data.
#[derive(Debug, Clone, Serialize)]
pub struct StationSnapshot {
    pub status: DataStatus,
    pub stations: StationSet,
    pub metrics: Vec<StationEvasionMetrics>,
    pub observations: Vec<SampleObservation>,
    pub report: LoadReport,
    pub loaded_at: DateTime<Utc>,
}

impl StationSnapshot {
    /// The degraded state every view falls back to.
    pub fn no_data() -> Self {
        StationSnapshot {
            status: DataStatus::NoData,
            stations: StationSet::default(),
            metrics: Vec::new(),
            observations: Vec::new(),
            report: LoadReport::default(),
            loaded_at: Utc::now(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.status == DataStatus::Loaded
    }

    pub fn views<'a>(&'a self, rules: &'a Rules) -> AggregationService<'a> {
        AggregationService::new(&self.stations, rules)
    }
}

/// Latest simulated stream.
pub type RealtimeSnapshot = RealtimeStream;

/// Owns the rules, data paths, variance sampler and both published generations.
pub struct PipelineContext {
    rules: Rules,
    paths: DataPaths,
    sampler: Mutex<Box<dyn VarianceSampler>>,
    stations: RwLock<Arc<StationSnapshot>>,
    realtime: RwLock<Arc<RealtimeSnapshot>>,
    log: LogContext,
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("paths", &self.paths)
            .field("run_id", &self.log.run_id)
            .field("sampler", &"...")
            .finish()
    }
}

impl PipelineContext {
    /// Context in the no-data state; call [`reload`](Self::reload) to populate.
    pub fn new(
        rules: Rules,
        paths: DataPaths,
        sampler: Box<dyn VarianceSampler>,
        log: LogContext,
    ) -> Self {
        PipelineContext {
            rules,
            paths,
            sampler: Mutex::new(sampler),
            stations: RwLock::new(Arc::new(StationSnapshot::no_data())),
            realtime: RwLock::new(Arc::new(RealtimeStream::empty(Local::now().naive_local()))),
            log,
        }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn log_context(&self) -> &LogContext {
        &self.log
    }

    /// Latest station generation.
    pub fn stations(&self) -> Arc<StationSnapshot> {
        let guard = self.stations.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Latest realtime generation.
    pub fn realtime(&self) -> Arc<RealtimeSnapshot> {
        let guard = self.realtime.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Load both tables and publish a new station generation.
    ///
    /// On a load failure the no-data snapshot and an empty realtime stream
    /// are published and the error returned, so every view degrades to empty
    /// results.
    pub fn reload(&self) -> Result<Arc<StationSnapshot>> {
        let loader = StationBaselineLoader::new(self.paths.clone());
        match loader.load(&self.log) {
            Ok(data) => Ok(self.rebuild(data)),
            Err(e) => {
                self.publish_stations(Arc::new(StationSnapshot::no_data()));
                self.publish_realtime(Arc::new(RealtimeStream::empty(
                    Local::now().naive_local(),
                )));
                Err(e)
            }
        }
    }

    /// Estimate and merge already-loaded tables, then publish.
    pub fn rebuild(&self, data: LoadedData) -> Arc<StationSnapshot> {
        let metrics = {
            let mut sampler = self.sampler.lock().unwrap_or_else(|e| e.into_inner());
            EvasionEstimator::new(&self.rules).estimate(&data.observations, &mut **sampler)
        };
        log_event!(
            self.log,
            INFO,
            event_names::ESTIMATE_FINISHED,
            Stage::Estimate,
            "evasion metrics estimated",
            stations = metrics.len()
        );

        let stations = StationMerger::new(&self.rules).merge(&data.baselines, &metrics);
        let sampled = stations.iter().filter(|r| r.has_sample_data).count();
        log_event!(
            self.log,
            INFO,
            event_names::MERGE_FINISHED,
            Stage::Merge,
            "baseline and metrics joined",
            stations = stations.len(),
            sampled = sampled,
            unmatched_metrics = metrics.len().saturating_sub(sampled)
        );

        let status = if data.baselines.is_empty() {
            DataStatus::EmptyBaseline
        } else {
            DataStatus::Loaded
        };
        let snapshot = Arc::new(StationSnapshot {
            status,
            stations,
            metrics,
            observations: data.observations,
            report: data.report,
            loaded_at: Utc::now(),
        });
        self.publish_stations(Arc::clone(&snapshot));
        snapshot
    }

    /// Regenerate the realtime stream from the current station generation.
    ///
    /// Replaces the previous stream entirely.
    pub fn refresh_realtime(&self, now: NaiveDateTime) -> Arc<RealtimeSnapshot> {
        let stations = self.stations();
        let stream = if stations.stations.is_empty() {
            RealtimeStream::empty(now)
        } else {
            RealtimeSimulator::new(&self.rules).simulate(
                &stations.stations,
                &stations.observations,
                now,
            )
        };
        log_event!(
            self.log,
            INFO,
            event_names::SIMULATE_FINISHED,
            Stage::Simulate,
            "realtime stream generated",
            events = stream.events.len(),
            alerts = stream.alerts.len()
        );

        let snapshot = Arc::new(stream);
        self.publish_realtime(Arc::clone(&snapshot));
        snapshot
    }

    fn publish_stations(&self, snapshot: Arc<StationSnapshot>) {
        let mut guard = self.stations.write().unwrap_or_else(|e| e.into_inner());
        *guard = snapshot;
    }

    fn publish_realtime(&self, snapshot: Arc<RealtimeSnapshot>) {
        let mut guard = self.realtime.write().unwrap_or_else(|e| e.into_inner());
        *guard = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::FixedFactorSampler;
    use crate::load::StationBaseline;
    use chrono::NaiveDate;
    use fw_common::TimeBin;
    use fw_config::RulesSource;
    use std::path::PathBuf;

    fn context(paths: DataPaths) -> PipelineContext {
        PipelineContext::new(
            Rules::default(),
            paths,
            Box::new(FixedFactorSampler::identity()),
            LogContext::new("run-test", "host-test"),
        )
    }

    fn missing_paths() -> DataPaths {
        DataPaths {
            baseline: PathBuf::from("/nonexistent/expected.csv"),
            baseline_source: RulesSource::CliArgument,
            sample: PathBuf::from("/nonexistent/sample.csv"),
            sample_source: RulesSource::CliArgument,
        }
    }

    fn loaded() -> LoadedData {
        LoadedData {
            baselines: vec![StationBaseline {
                pax_annual: Some(365000.0),
                pax_weekday: Some(1000.0),
                pax_am_peak: Some(200.0),
                pax_pm_peak: Some(250.0),
                ..StationBaseline::named("Flinders Street")
            }],
            observations: vec![SampleObservation::new(
                "Flinders Street",
                TimeBin::AmPeak,
                90.0,
            )],
            report: LoadReport::default(),
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_starts_without_data() {
        let ctx = context(missing_paths());
        assert_eq!(ctx.stations().status, DataStatus::NoData);
        assert!(ctx.realtime().is_empty());
    }

    #[test]
    fn test_failed_reload_publishes_no_data() {
        let ctx = context(missing_paths());
        ctx.rebuild(loaded());
        assert!(ctx.stations().has_data());

        ctx.refresh_realtime(noon());
        assert!(!ctx.realtime().is_empty());

        let err = ctx.reload().unwrap_err();
        assert!(err.is_load_failure());
        assert!(ctx.realtime().is_empty());
        assert!(ctx.realtime().alerts.is_empty());
        let snapshot = ctx.stations();
        assert_eq!(snapshot.status, DataStatus::NoData);
        assert!(snapshot.stations.is_empty());
        assert_eq!(snapshot.views(ctx.rules()).summary().total_stations, 0);
    }

    #[test]
    fn test_rebuild_publishes_new_generation() {
        let ctx = context(missing_paths());
        let before = ctx.stations();
        let after = ctx.rebuild(loaded());

        assert!(!Arc::ptr_eq(&before, &after));
        assert!(Arc::ptr_eq(&after, &ctx.stations()));
        // Old readers keep their generation.
        assert_eq!(before.status, DataStatus::NoData);
        assert_eq!(after.stations.len(), 1);
    }

    #[test]
    fn test_refresh_replaces_stream() {
        let ctx = context(missing_paths());
        ctx.rebuild(loaded());

        let first = ctx.refresh_realtime(noon());
        let second = ctx.refresh_realtime(noon());
        assert_eq!(first.events.len(), 2);
        assert_eq!(second.events.len(), first.events.len());
        assert!(Arc::ptr_eq(&second, &ctx.realtime()));
    }

    #[test]
    fn test_refresh_without_data_is_empty() {
        let ctx = context(missing_paths());
        let stream = ctx.refresh_realtime(noon());
        assert!(stream.is_empty());
        assert!(stream.alerts.is_empty());
        assert_eq!(stream.generated_at, noon());
    }

    #[test]
    fn test_empty_baseline_status() {
        let ctx = context(missing_paths());
        let snapshot = ctx.rebuild(LoadedData::default());
        assert_eq!(snapshot.status, DataStatus::EmptyBaseline);
        assert!(!snapshot.has_data());
    }

    #[test]
    fn test_context_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PipelineContext>();
    }
}
