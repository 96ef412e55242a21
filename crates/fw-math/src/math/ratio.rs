//! Ratio, clamping, and aggregation primitives that never divide by zero.

/// `numerator / denominator`, or `fallback` when the denominator is not
/// strictly positive or the quotient is not finite.
pub fn safe_div(numerator: f64, denominator: f64, fallback: f64) -> f64 {
    if denominator.is_nan() || denominator <= 0.0 {
        return fallback;
    }
    let q = numerator / denominator;
    if q.is_finite() {
        q
    } else {
        fallback
    }
}

/// Clamp `value` into `[lo, hi]`. NaN maps to `lo`.
///
/// Callers must ensure `lo <= hi`.
pub fn clamp_closed(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return lo;
    }
    value.max(lo).min(hi)
}

/// Non-negative shortfall `max(0, expected - actual)`.
pub fn shortfall(expected: f64, actual: f64) -> f64 {
    let d = expected - actual;
    if d > 0.0 {
        d
    } else {
        0.0
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentage `100 * part / whole`, 0.0 when `whole` is not positive.
pub fn percentage(part: f64, whole: f64) -> f64 {
    100.0 * safe_div(part, whole, 0.0)
}
