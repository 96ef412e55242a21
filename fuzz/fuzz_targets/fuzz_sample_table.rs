//! Fuzz target for sample table reading followed by estimation.
//!
//! Whatever the table holds, estimated rates stay inside the configured bounds
//! and evasion is the non-negative shortfall.

#![no_main]

use fw_config::Rules;
use fw_core::estimate::{EvasionEstimator, FixedFactorSampler};
use fw_core::load::read_samples;
use fw_core::logging::LogContext;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let ctx = LogContext::new("run-fuzz", "host-fuzz");
    let Ok((observations, _)) = read_samples(data, &ctx) else {
        return;
    };

    let rules = Rules::default();
    let metrics = EvasionEstimator::new(&rules)
        .estimate(&observations, &mut FixedFactorSampler::new(1.3));
    for m in &metrics {
        assert!(m.avg_evasion_rate >= rules.estimation.min_rate);
        assert!(m.avg_evasion_rate <= rules.estimation.max_rate);
        assert!(m.total_evasion >= 0.0);
    }
});
