//! Property-based tests for fw-math primitives.
//!
//! Uses proptest to verify the guarantees the estimator relies on hold across
//! many random inputs.

use fw_math::{clamp_closed, mean, percentage, safe_div, shortfall};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// safe_div never yields NaN or infinity when the fallback is finite.
    #[test]
    fn safe_div_is_finite(n in -1e12..1e12f64, d in -1e6..1e6f64, fb in -1.0..1.0f64) {
        let q = safe_div(n, d, fb);
        prop_assert!(q.is_finite(), "safe_div({}, {}, {}) = {}", n, d, fb, q);
    }

    /// A non-positive denominator always yields the fallback.
    #[test]
    fn safe_div_non_positive_denominator(n in -1e6..1e6f64, d in -1e6..=0.0f64) {
        prop_assert_eq!(safe_div(n, d, 0.05), 0.05);
    }

    /// clamp_closed lands inside the interval for any input.
    #[test]
    fn clamp_closed_in_bounds(v in proptest::num::f64::ANY, lo in 0.0..0.5f64, width in 0.0..0.5f64) {
        let hi = lo + width;
        let c = clamp_closed(v, lo, hi);
        prop_assert!(c >= lo && c <= hi, "clamp({}) = {} not in [{}, {}]", v, c, lo, hi);
    }

    /// shortfall is non-negative and equals the difference when positive.
    #[test]
    fn shortfall_identity(e in 0.0..1e9f64, a in 0.0..1e9f64) {
        let s = shortfall(e, a);
        prop_assert!(s >= 0.0);
        if e > a {
            prop_assert_eq!(s, e - a);
        } else {
            prop_assert_eq!(s, 0.0);
        }
    }

    /// The mean lies between the min and max of its inputs.
    #[test]
    fn mean_is_bounded(values in proptest::collection::vec(-1e6..1e6f64, 1..50)) {
        let m = mean(&values);
        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(m >= lo - 1e-6 && m <= hi + 1e-6);
    }

    /// A part no larger than the whole is at most 100 percent.
    #[test]
    fn percentage_of_subset(whole in 1.0..1e9f64, frac in 0.0..=1.0f64) {
        let p = percentage(whole * frac, whole);
        prop_assert!(p >= 0.0 && p <= 100.0 + 1e-9);
    }
}
