//! Analytic ray–sphere and ray–ground intersection.
//!
//! Pure, stateless math shared by the autofocus controller. The GPU kernel
//! performs its own intersection in the shader; these functions exist so the
//! CPU can ask "what is the camera looking at" without a readback.

use glam::Vec3;

/// Bias subtracted from every hit distance so a secondary ray starting at
/// the hit point cannot immediately re-intersect the same surface.
pub const HIT_EPSILON: f32 = 0.001;

/// A ray with an origin and a direction.
///
/// The intersection math treats `dir` as unit length; callers normalize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin in world space.
    pub origin: Vec3,
    /// Ray direction, normalized by the caller.
    pub dir: Vec3,
}

impl Ray {
    /// Ray from `origin` along `dir`, normalizing the direction.
    #[must_use]
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: dir.normalize_or_zero(),
        }
    }
}

/// Distance along `ray` to the sphere `(center, radius)`, or `None`.
///
/// Rejects spheres whose center lies behind the ray origin relative to the
/// ray direction. This is a conservative approximation: a ray originating
/// inside a sphere but pointing away from its center also reports no hit.
///
/// A hit just behind the origin (ray starts inside the sphere, pointing at
/// its center) clamps to `0.0` rather than going negative.
#[must_use]
pub fn sphere_hit(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let d = center - ray.origin;
    let b = d.dot(ray.dir);
    if b < 0.0 {
        return None;
    }
    let c = d.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    Some((b - disc.sqrt() - HIT_EPSILON).max(0.0))
}

/// Distance along `ray` to the implicit ground plane at `y = 0`, or `None`.
///
/// Only descending rays starting above the plane (or ascending rays below
/// it) produce a positive distance; everything else misses.
#[must_use]
pub fn ground_hit(ray: &Ray) -> Option<f32> {
    if ray.dir.y == 0.0 {
        return None;
    }
    let t = -ray.origin.y / ray.dir.y;
    (t > 0.0).then_some(t)
}
