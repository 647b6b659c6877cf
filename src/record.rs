//! GPU-layout entity records and CPU-side material attributes.
//!
//! One record shape serves both renderable spheres and spherical light
//! sources: the two categories partition the entity set but share a layout,
//! so the compute kernel indexes both arrays with the same struct.

use glam::Vec3;

/// Fixed byte stride of one [`SphereRecord`] in a GPU storage buffer.
pub const SPHERE_STRIDE: usize = size_of::<SphereRecord>();

/// One sphere entity as uploaded to the GPU.
///
/// For renderable spheres `color` is the diffuse color and the remaining
/// material channels are meaningful; for lights `color` is radiant emission
/// and the material channels are left at their defaults.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SphereRecord {
    /// World-space center.
    pub position: [f32; 3],
    /// Sphere radius (> 0).
    pub radius: f32,
    /// Diffuse color (renderable spheres) or radiant emission (lights).
    pub color: [f32; 3],
    /// Surface smoothness in `[0, 1]`.
    pub smoothness: f32,
    /// Surface opacity in `[0, 1]`.
    pub opacity: f32,
    /// Refraction index in `[1, 4]`.
    pub refraction_index: f32,
}

impl SphereRecord {
    /// Record for a renderable sphere with the given material.
    #[must_use]
    pub fn surface(position: Vec3, radius: f32, material: &RayMaterial) -> Self {
        Self {
            position: position.to_array(),
            radius,
            color: material.color,
            smoothness: material.smoothness,
            opacity: material.opacity,
            refraction_index: material.refraction_index,
        }
    }

    /// Record for a spherical light with the given emission.
    ///
    /// Emission is deliberately not clamped: values above 1 are physically
    /// meaningful for lights.
    #[must_use]
    pub fn emitter(position: Vec3, radius: f32, emission: [f32; 3]) -> Self {
        Self {
            position: position.to_array(),
            radius,
            color: emission,
            smoothness: 0.0,
            opacity: 1.0,
            refraction_index: 1.0,
        }
    }

    /// World-space center as a vector.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// CPU-side surface material for a renderable sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayMaterial {
    /// Linear diffuse color.
    pub color: [f32; 3],
    /// Surface smoothness in `[0, 1]`.
    pub smoothness: f32,
    /// Surface opacity in `[0, 1]`.
    pub opacity: f32,
    /// Refraction index in `[1, 4]`.
    pub refraction_index: f32,
}

impl RayMaterial {
    /// Material with all channels clamped into their valid ranges.
    #[must_use]
    pub fn new(
        color: [f32; 3],
        smoothness: f32,
        opacity: f32,
        refraction_index: f32,
    ) -> Self {
        Self {
            color,
            smoothness: smoothness.clamp(0.0, 1.0),
            opacity: opacity.clamp(0.0, 1.0),
            refraction_index: refraction_index.clamp(1.0, 4.0),
        }
    }
}

impl Default for RayMaterial {
    fn default() -> Self {
        Self {
            color: [0.8, 0.8, 0.8],
            smoothness: 0.5,
            opacity: 1.0,
            refraction_index: 1.0,
        }
    }
}

/// Convert an 8-bit RGB triple to a linear `[0, 1]` color vector.
#[must_use]
pub fn rgb8_to_vec3(r: u8, g: u8, b: u8) -> [f32; 3] {
    [
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_matches_gpu_layout() {
        // position(12) + radius(4) + color(12) + smoothness(4) + opacity(4)
        // + refraction_index(4)
        assert_eq!(SPHERE_STRIDE, 40);
    }

    #[test]
    fn material_channels_are_clamped() {
        let m = RayMaterial::new([1.0, 0.0, 0.0], 1.5, -0.2, 0.5);
        assert_eq!(m.smoothness, 1.0);
        assert_eq!(m.opacity, 0.0);
        assert_eq!(m.refraction_index, 1.0);
    }

    #[test]
    fn emitter_keeps_raw_emission() {
        let r = SphereRecord::emitter(Vec3::ZERO, 1.0, [8.0, 4.0, 2.0]);
        assert_eq!(r.color, [8.0, 4.0, 2.0]);
    }

    #[test]
    fn rgb8_conversion() {
        assert_eq!(rgb8_to_vec3(255, 0, 255), [1.0, 0.0, 1.0]);
        let mid = rgb8_to_vec3(128, 128, 128);
        assert!((mid[0] - 128.0 / 255.0).abs() < 1e-6);
    }
}
