pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Inverse of [`lerp`]; returns `0` for an empty span.
pub(crate) fn inverse_lerp(a: f64, b: f64, v: f64) -> f64 {
    let span = b - a;
    if span.abs() <= f64::EPSILON {
        return if v >= b { 1.0 } else { 0.0 };
    }
    (v - a) / span
}

/// Frame-rate independent exponential smoothing of `current` toward `target`.
///
/// `lambda` is the decay rate per second; `dt` is elapsed seconds.
pub(crate) fn damp(current: f64, target: f64, lambda: f64, dt: f64) -> f64 {
    if lambda <= 0.0 || !lambda.is_finite() {
        return target;
    }
    lerp(current, target, 1.0 - (-lambda * dt.max(0.0)).exp())
}
