//! Finite-only vector math
//!
//! Every helper here returns finite, non-NaN components no matter what it is
//! fed. Frame deltas, callback results and save data are all untrusted, so the
//! rest of the simulation routes arithmetic on them through these functions
//! instead of raw `glam` calls.

use glam::Vec2;

use crate::consts::MAX_FRAME_DT;

/// True when both components are finite
#[inline]
pub fn is_finite_vec(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

/// Replace a non-finite scalar with `fallback`
#[inline]
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Replace a vector with any non-finite component by zero
#[inline]
pub fn sanitize(v: Vec2) -> Vec2 {
    if is_finite_vec(v) { v } else { Vec2::ZERO }
}

/// Unit vector in the direction of `v`, or zero for degenerate input
pub fn normalize(v: Vec2) -> Vec2 {
    if !is_finite_vec(v) {
        return Vec2::ZERO;
    }
    let mag = v.length();
    if !mag.is_finite() || mag <= f32::EPSILON {
        return Vec2::ZERO;
    }
    let n = v / mag;
    // Subnormal inputs can still overflow the division
    sanitize(n)
}

/// Rescale `v` down to `max` when longer; zero when `max` or `v` is unusable
pub fn limit_magnitude(v: Vec2, max: f32) -> Vec2 {
    if !max.is_finite() || max < 0.0 || !is_finite_vec(v) {
        return Vec2::ZERO;
    }
    let mag = v.length();
    if !mag.is_finite() {
        return Vec2::ZERO;
    }
    if mag > max {
        sanitize(v * (max / mag))
    } else {
        v
    }
}

/// Clamp that never yields NaN, even for NaN input or inverted bounds
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    let lo = finite_or(min, f32::MIN);
    let hi = finite_or(max, f32::MAX);
    let (lo, hi) = if lo > hi { (hi, lo) } else { (lo, hi) };
    if value.is_nan() {
        // Pick the bound nearest zero so garbage in stays small
        return 0.0f32.max(lo).min(hi);
    }
    value.max(lo).min(hi)
}

/// Distance between two points, `f32::INFINITY` if either is not finite
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    if !is_finite_vec(a) || !is_finite_vec(b) {
        return f32::INFINITY;
    }
    let d = (a - b).length();
    if d.is_nan() { f32::INFINITY } else { d }
}

/// Squared distance, `f32::INFINITY` if either point is not finite
pub fn distance_squared(a: Vec2, b: Vec2) -> f32 {
    if !is_finite_vec(a) || !is_finite_vec(b) {
        return f32::INFINITY;
    }
    let d = (a - b).length_squared();
    if d.is_nan() { f32::INFINITY } else { d }
}

/// Clamp an untrusted frame delta into `[0, MAX_FRAME_DT]`
pub fn sanitize_dt(dt: f32) -> f32 {
    if !dt.is_finite() || dt <= 0.0 {
        return 0.0;
    }
    dt.min(MAX_FRAME_DT)
}
