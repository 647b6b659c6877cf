//! Perspective camera producing the matrix pair the compute kernel needs.
//!
//! The kernel reconstructs primary rays from a camera-to-world matrix and
//! an inverse projection matrix; both come from here. The forward axis
//! additionally seeds the autofocus ray.

use glam::{Mat4, Vec3};

/// Perspective camera defined by eye position, target, and projection
/// parameters.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye (camera) position in world space.
    pub eye: Vec3,
    /// Look-at target position.
    pub target: Vec3,
    /// Up direction vector.
    pub up: Vec3,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
}

impl Camera {
    /// Camera at `eye` looking at `target` with the given aspect ratio.
    #[must_use]
    pub fn new(eye: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            aspect,
            fovy: 45.0,
            znear: 0.1,
            zfar: 1000.0,
        }
    }

    /// Camera-to-world transform (inverse of the view matrix).
    #[must_use]
    pub fn camera_to_world(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up).inverse()
    }

    /// Inverse of the projection matrix.
    ///
    /// perspective_rh already uses [0,1] depth range (wgpu/Vulkan
    /// convention).
    #[must_use]
    pub fn inverse_projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fovy.to_radians(),
            self.aspect,
            self.znear,
            self.zfar,
        )
        .inverse()
    }

    /// Normalized forward axis (from eye toward target).
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }
}
