//! Interpolation helpers for temporal smoothing.
//!
//! Used by the autofocus controller to ease the focal distance toward its
//! target without visible jitter.

/// Linear interpolation between `a` and `b` at parameter `t`.
///
/// `t` is not clamped; callers that need clamping do it themselves.
#[inline]
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite smoothstep: `3t² - 2t³` with input clamped to `[0, 1]`.
///
/// Zero first derivative at both endpoints, so eased values approach their
/// target without a visible stop.
#[inline]
#[must_use]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
