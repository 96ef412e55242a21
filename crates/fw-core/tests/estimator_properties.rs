//! Property-based tests for estimation and merge properties.

use fw_common::TimeBin;
use fw_config::Rules;
use fw_core::estimate::{EvasionEstimator, UniformSampler};
use fw_core::load::{SampleObservation, StationBaseline};
use fw_core::merge::StationMerger;
use proptest::prelude::*;

const STATIONS: [&str; 5] = [
    "Flinders Street",
    "Southern Cross",
    "Richmond",
    "Box Hill Bus Interchange",
    "Camberwell",
];

fn observation() -> impl Strategy<Value = SampleObservation> {
    (
        0..STATIONS.len(),
        0..TimeBin::ALL.len(),
        prop::option::weighted(0.9, 0.0f64..5_000.0),
    )
        .prop_map(|(s, b, actual)| SampleObservation {
            station: STATIONS[s].into(),
            time_bin: Some(TimeBin::ALL[b]),
            time_bin_label: TimeBin::ALL[b].label().to_string(),
            actual,
        })
}

fn baseline() -> impl Strategy<Value = StationBaseline> {
    (0..STATIONS.len(), 0.0f64..5_000_000.0, 0.0f64..20_000.0).prop_map(|(s, annual, weekday)| {
        StationBaseline {
            pax_annual: Some(annual),
            pax_weekday: Some(weekday),
            pax_am_peak: Some(weekday * 0.2),
            pax_pm_peak: Some(weekday * 0.25),
            ..StationBaseline::named(STATIONS[s])
        }
    })
}

proptest! {
    #[test]
    fn rate_always_within_bounds(
        observations in prop::collection::vec(observation(), 1..40),
        seed in any::<u64>(),
    ) {
        let rules = Rules::default();
        let metrics = EvasionEstimator::new(&rules)
            .estimate(&observations, &mut UniformSampler::seeded(seed));

        prop_assert!(!metrics.is_empty());
        for m in &metrics {
            prop_assert!(m.avg_evasion_rate >= 0.02);
            prop_assert!(m.avg_evasion_rate <= 0.40);
        }
    }

    #[test]
    fn evasion_is_nonnegative_shortfall(
        observations in prop::collection::vec(observation(), 1..40),
        seed in any::<u64>(),
    ) {
        let rules = Rules::default();
        let metrics = EvasionEstimator::new(&rules)
            .estimate(&observations, &mut UniformSampler::seeded(seed));

        for m in &metrics {
            prop_assert!(m.total_evasion >= 0.0);
            prop_assert_eq!(m.total_evasion, (m.total_expected - m.total_actual).max(0.0));
        }
        let counted: usize = metrics.iter().map(|m| m.observation_count).sum();
        prop_assert_eq!(counted, observations.len());
    }

    #[test]
    fn merged_set_sorted_and_complete(
        baselines in prop::collection::vec(baseline(), 0..12),
        observations in prop::collection::vec(observation(), 0..40),
        seed in any::<u64>(),
    ) {
        // The loader keeps only the first row per name.
        let mut unique: Vec<StationBaseline> = Vec::new();
        for b in baselines {
            if !unique.iter().any(|u| u.name == b.name) {
                unique.push(b);
            }
        }

        let rules = Rules::default();
        let metrics = EvasionEstimator::new(&rules)
            .estimate(&observations, &mut UniformSampler::seeded(seed));
        let set = StationMerger::new(&rules).merge(&unique, &metrics);

        prop_assert_eq!(set.len(), unique.len());
        for pair in set.records().windows(2) {
            prop_assert!(pair[0].pax_annual >= pair[1].pax_annual);
        }
        for record in &set {
            prop_assert!(record.avg_evasion_rate >= 0.02 && record.avg_evasion_rate <= 0.40);
            if record.has_sample_data {
                prop_assert_eq!(
                    record.total_evasion,
                    (record.total_expected - record.total_actual).max(0.0)
                );
            } else {
                prop_assert_eq!(record.total_evasion, 0.0);
                prop_assert_eq!(record.observation_count, 0);
            }
        }
    }

    #[test]
    fn same_seed_same_estimates(
        observations in prop::collection::vec(observation(), 1..20),
        seed in any::<u64>(),
    ) {
        let rules = Rules::default();
        let estimator = EvasionEstimator::new(&rules);
        let a = estimator.estimate(&observations, &mut UniformSampler::seeded(seed));
        let b = estimator.estimate(&observations, &mut UniformSampler::seeded(seed));
        prop_assert_eq!(a, b);
    }
}
