//! Camera autofocus: nearest-intersection focal distance with temporal
//! smoothing.
//!
//! Each frame the controller is fed the raw distance of whatever the
//! camera's forward ray hits first (any sphere, any light, or the ground
//! plane) and eases the focal distance toward it. Without smoothing the
//! depth-of-field target snaps every time the ray slips on or off an
//! object edge, which reads as focus flicker.

use glam::Vec3;

use crate::trace::{ground_hit, sphere_hit, Ray};
use crate::util::ease::{lerp, smoothstep};

/// Gap between smoothed and target distance under which the controller
/// counts as settled.
pub const SETTLE_THRESHOLD: f32 = 0.05;

/// Focal distance reported when the forward ray hits nothing.
///
/// Low pass counts produce noisy depth-of-field, so the miss distance grows
/// as passes shrink to avoid over-focusing a sparsely sampled frame.
#[must_use]
pub fn default_distance(passes: u32) -> f32 {
    12.0 - (passes as f32 * 1.75).min(8.0)
}

/// Nearest hit distance along `ray` over all scene spheres (renderable and
/// lights alike) and the implicit ground plane at y = 0.
///
/// Starts from [`default_distance`] so a miss still yields a usable focal
/// distance.
#[must_use]
pub fn nearest_hit(ray: &Ray, spheres: &[(Vec3, f32)], passes: u32) -> f32 {
    let mut nearest = default_distance(passes);
    for &(center, radius) in spheres {
        if let Some(t) = sphere_hit(ray, center, radius) {
            nearest = nearest.min(t);
        }
    }
    if let Some(t) = ground_hit(ray) {
        nearest = nearest.min(t);
    }
    nearest
}

/// Whether the controller is still moving toward the current target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusState {
    /// Interpolating from the settled baseline toward the target.
    Converging,
    /// Within [`SETTLE_THRESHOLD`] of the target; baseline updated.
    #[default]
    Settled,
}

/// Temporal smoothing of the raw autofocus distance.
pub struct AutofocusController {
    /// Last converged focal distance, the interpolation baseline.
    settled: f32,
    /// Seconds since the last settle event.
    elapsed: f32,
    state: FocusState,
}

impl AutofocusController {
    /// Controller settled at the given initial focal distance.
    #[must_use]
    pub fn new(initial: f32) -> Self {
        Self {
            settled: initial,
            elapsed: 0.0,
            state: FocusState::Settled,
        }
    }

    /// Advance by `dt` seconds toward the raw distance and return the
    /// smoothed focal distance for this frame.
    ///
    /// Raw distances under 1.0 get a non-linear near-field correction
    /// (`raw * lerp(1.75, 1.0, raw)`, floored at 0.1) — close focus needs a
    /// wider margin than the raw hit distance provides. Progress toward the
    /// target follows a smoothstep over elapsed time since the last settle
    /// event; once the output is within [`SETTLE_THRESHOLD`] of the target
    /// it becomes the new settled baseline and the clock resets.
    pub fn update(&mut self, raw: f32, dt: f32) -> f32 {
        let target = if raw < 1.0 {
            (raw * lerp(1.75, 1.0, raw)).max(0.1)
        } else {
            raw
        };

        self.elapsed += dt;
        let progress = smoothstep(self.elapsed);
        let smoothed = lerp(self.settled, target, progress);

        if (smoothed - target).abs() < SETTLE_THRESHOLD {
            self.settled = smoothed;
            self.elapsed = 0.0;
            self.state = FocusState::Settled;
        } else {
            self.state = FocusState::Converging;
        }
        smoothed
    }

    /// Current settled baseline distance.
    #[must_use]
    pub fn settled(&self) -> f32 {
        self.settled
    }

    /// Current convergence state.
    #[must_use]
    pub fn state(&self) -> FocusState {
        self.state
    }
}

impl Default for AutofocusController {
    fn default() -> Self {
        Self::new(default_distance(1))
    }
}
