//! Per-station evasion estimation.
//!
//! For each station with at least one observation:
//! 1. `total_actual` is the sum of observed counts
//! 2. `total_expected` sums `observed × multiplier(bin)`
//! 3. `total_evasion = max(0, total_expected − total_actual)`
//! 4. the base rate is `total_evasion / total_expected`, or the fallback
//!    rate when nothing was expected
//! 5. the base rate is scaled by a variance factor drawn for the station's
//!    volume tier and clamped into `[min_rate, max_rate]`
//!
//! Because of step 5 the output is not deterministic unless the sampler is.

pub mod variance;

pub use variance::{FixedFactorSampler, MidpointSampler, UniformSampler, VarianceSampler};

use std::collections::HashMap;

use fw_common::{StationName, VolumeTier};
use fw_config::rules::{EstimationRules, JitterRules};
use fw_config::Rules;
use fw_math::{clamp_closed, safe_div, shortfall};
use serde::{Deserialize, Serialize};
use tracing::{trace, trace_span};

use crate::load::SampleObservation;
use crate::logging::{event_names, Stage};

/// Aggregate evasion figures for one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationEvasionMetrics {
    pub station: StationName,
    pub total_actual: f64,
    pub total_expected: f64,
    /// Always `max(0, total_expected − total_actual)`.
    pub total_evasion: f64,
    /// Jittered and clamped rate.
    pub avg_evasion_rate: f64,
    pub observation_count: usize,
    pub volume_tier: VolumeTier,
    /// Rate before jitter and clamping.
    pub base_rate: f64,
    pub variance_factor: f64,
}

#[derive(Debug)]
struct Accumulator {
    station: StationName,
    total_actual: f64,
    total_expected: f64,
    count: usize,
}

/// Computes [`StationEvasionMetrics`] from sample observations.
#[derive(Debug, Clone)]
pub struct EvasionEstimator {
    estimation: EstimationRules,
    jitter: JitterRules,
}

impl EvasionEstimator {
    pub fn new(rules: &Rules) -> Self {
        EvasionEstimator {
            estimation: rules.estimation.clone(),
            jitter: rules.jitter.clone(),
        }
    }

    /// Estimate every station that has observations.
    ///
    /// Output follows the order in which stations first appear in
    /// `observations`. Unknown counts contribute zero but still count as an
    /// observation.
    pub fn estimate(
        &self,
        observations: &[SampleObservation],
        sampler: &mut dyn VarianceSampler,
    ) -> Vec<StationEvasionMetrics> {
        let mut index: HashMap<&StationName, usize> = HashMap::new();
        let mut accumulators: Vec<Accumulator> = Vec::new();

        for obs in observations {
            let slot = *index.entry(&obs.station).or_insert_with(|| {
                accumulators.push(Accumulator {
                    station: obs.station.clone(),
                    total_actual: 0.0,
                    total_expected: 0.0,
                    count: 0,
                });
                accumulators.len() - 1
            });

            let actual = obs.actual_or_zero();
            let acc = &mut accumulators[slot];
            acc.total_actual += actual;
            acc.total_expected += actual * self.estimation.multiplier(obs.time_bin);
            acc.count += 1;
        }

        accumulators
            .into_iter()
            .map(|acc| self.finalize(acc, sampler))
            .collect()
    }

    fn finalize(&self, acc: Accumulator, sampler: &mut dyn VarianceSampler) -> StationEvasionMetrics {
        let total_evasion = shortfall(acc.total_expected, acc.total_actual);
        let base_rate = safe_div(total_evasion, acc.total_expected, self.estimation.fallback_rate);

        let tier = self.jitter.tier(acc.total_actual);
        let factor = sampler.sample(tier, self.jitter.range(tier));
        let avg_evasion_rate = clamp_closed(
            base_rate * factor,
            self.estimation.min_rate,
            self.estimation.max_rate,
        );

        {
            let _span = trace_span!(
                "estimate_station",
                station = acc.station.as_str(),
                stage = %Stage::Estimate
            )
            .entered();
            trace!(
                target: event_names::ESTIMATE_STATION,
                base_rate,
                factor,
                rate = avg_evasion_rate,
                "station estimated"
            );
        }

        StationEvasionMetrics {
            station: acc.station,
            total_actual: acc.total_actual,
            total_expected: acc.total_expected,
            total_evasion,
            avg_evasion_rate,
            observation_count: acc.count,
            volume_tier: tier,
            base_rate,
            variance_factor: factor,
        }
    }
}
