//! Clamped interpolation helpers shared by every system.

use std::time::Duration;

/// Longest single step accepted when converting host seconds into a duration.
const MAX_STEP_SECONDS: f32 = 86_400.0;

/// Clamps `value` into `[0, 1]`, mapping NaN to zero.
#[must_use]
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Interpolates between `from` and `to` with `t` clamped into `[0, 1]`.
#[must_use]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    let t = clamp_unit(t);
    let value = from + (to - from) * t;
    if !(from.is_finite() && to.is_finite()) {
        return value;
    }
    // Rounding must never push the result past either endpoint.
    value.clamp(from.min(to), from.max(to))
}

/// Returns where `value` sits between `from` and `to`, clamped into `[0, 1]`.
///
/// `from` may be greater than `to`, which inverts the mapping. A degenerate
/// range yields zero.
#[must_use]
pub fn inverse_lerp(from: f32, to: f32, value: f32) -> f32 {
    let span = to - from;
    if span == 0.0 || !span.is_finite() {
        return 0.0;
    }
    clamp_unit((value - from) / span)
}

/// Converts host-supplied seconds into a duration.
///
/// Negative, zero and non-finite inputs become [`Duration::ZERO`] so a paused
/// or misbehaving host clock never rewinds the simulation.
#[must_use]
pub fn duration_from_seconds(seconds: f32) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f32(seconds.min(MAX_STEP_SECONDS))
}
