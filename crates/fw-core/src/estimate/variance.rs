//! Variance samplers for the per-station rate jitter.
//!
//! The estimator draws one multiplicative factor per station from the range
//! configured for its volume tier. Production runs draw uniformly; tests pin
//! the factor with [`FixedFactorSampler`] or seed a [`UniformSampler`].

use fw_common::VolumeTier;
use fw_config::rules::FactorRange;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of per-station variance factors.
pub trait VarianceSampler: Send {
    /// Draw a factor for a station of the given tier from `range`.
    fn sample(&mut self, tier: VolumeTier, range: FactorRange) -> f64;
}

/// Draws uniformly from the closed range.
#[derive(Debug, Clone)]
pub struct UniformSampler {
    rng: StdRng,
}

impl UniformSampler {
    /// Sampler seeded from the operating system.
    pub fn from_entropy() -> Self {
        UniformSampler {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible sampler.
    pub fn seeded(seed: u64) -> Self {
        UniformSampler {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl VarianceSampler for UniformSampler {
    fn sample(&mut self, _tier: VolumeTier, range: FactorRange) -> f64 {
        // Degenerate or inverted ranges collapse to the lower bound.
        if range.low.is_nan() || range.high.is_nan() || range.low >= range.high {
            return range.low;
        }
        self.rng.random_range(range.low..=range.high)
    }
}

/// Returns the same factor for every station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedFactorSampler {
    factor: f64,
}

impl FixedFactorSampler {
    pub fn new(factor: f64) -> Self {
        FixedFactorSampler { factor }
    }

    /// Factor 1.0: the base rate passes through unchanged (before clamping).
    pub fn identity() -> Self {
        FixedFactorSampler::new(1.0)
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl VarianceSampler for FixedFactorSampler {
    fn sample(&mut self, _tier: VolumeTier, _range: FactorRange) -> f64 {
        self.factor
    }
}

/// Always returns the midpoint of the tier's range.
#[derive(Debug, Clone, Copy, Default)]
pub struct MidpointSampler;

impl VarianceSampler for MidpointSampler {
    fn sample(&mut self, _tier: VolumeTier, range: FactorRange) -> f64 {
        range.midpoint()
    }
}
