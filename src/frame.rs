//! Per-frame update: pull entity state, reconcile buffers, assemble kernel
//! parameters.
//!
//! [`PathTraceEngine::begin_frame`] is the composition point for the whole
//! crate: it applies pending registration changes, refreshes every entity
//! record from its binding, reconciles both category buffers, derives the
//! focal distance, and packages the scalar/matrix set the external compute
//! kernel consumes.

use glam::Mat4;

use crate::camera::Camera;
use crate::error::OrbrayError;
use crate::focus::{nearest_hit, AutofocusController};
use crate::gpu::entity_buffer::{BufferHeap, EntityBuffer};
use crate::options::Options;
use crate::record::SphereRecord;
use crate::scene::{ObjectHandle, ObjectId, SceneRegistry};
use crate::trace::Ray;

/// Jitter offset used when noise mode is off: the pixel center.
const FIXED_PIXEL_OFFSET: [f32; 2] = [0.5, 0.5];
/// Seed used when noise mode is off, for deterministic output.
const FIXED_SEED: f32 = 0.5;

/// Everything the external compute kernel needs for one frame, besides the
/// two entity buffers.
#[derive(Debug, Clone)]
pub struct FrameParams {
    /// Camera-to-world transform for primary ray origins.
    pub camera_to_world: Mat4,
    /// Inverse projection for primary ray directions.
    pub camera_inverse_projection: Mat4,
    /// Renderable-sphere entity count (0 disables sphere sampling).
    pub sphere_count: u32,
    /// Light entity count (0 disables light sampling).
    pub light_count: u32,
    /// Sub-pixel jitter offset for this frame.
    pub pixel_offset: [f32; 2],
    /// Per-frame random seed (fixed when noise mode is off).
    pub seed: f32,
    /// Render passes per frame.
    pub passes: u32,
    /// Shadow sampling quality.
    pub shadow_quality: f32,
    /// Shadow ray jitter amount.
    pub shadow_randomness: f32,
    /// Ground plane smoothness.
    pub ground_smoothness: f32,
    /// Ambient light color.
    pub ambient: [f32; 3],
    /// Skybox sample intensity multiplier.
    pub skybox_strength: f32,
    /// Focal distance for depth of field.
    pub focal_distance: f32,
}

impl FrameParams {
    /// Pack into the GPU uniform block layout.
    #[must_use]
    pub fn to_uniform(&self) -> FrameUniform {
        FrameUniform {
            camera_to_world: self.camera_to_world.to_cols_array_2d(),
            camera_inverse_projection: self
                .camera_inverse_projection
                .to_cols_array_2d(),
            ambient: self.ambient,
            ground_smoothness: self.ground_smoothness,
            pixel_offset: self.pixel_offset,
            seed: self.seed,
            focal_distance: self.focal_distance,
            sphere_count: self.sphere_count,
            light_count: self.light_count,
            passes: self.passes,
            shadow_quality: self.shadow_quality,
            shadow_randomness: self.shadow_randomness,
            skybox_strength: self.skybox_strength,
            _pad: [0.0; 2],
        }
    }
}

/// GPU uniform block holding the per-frame scalar/matrix parameters.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    /// Camera-to-world transform.
    pub camera_to_world: [[f32; 4]; 4],
    /// Inverse projection matrix.
    pub camera_inverse_projection: [[f32; 4]; 4],
    /// Ambient light color.
    pub ambient: [f32; 3],
    /// Ground plane smoothness.
    pub ground_smoothness: f32,
    /// Sub-pixel jitter offset.
    pub pixel_offset: [f32; 2],
    /// Per-frame random seed.
    pub seed: f32,
    /// Focal distance for depth of field.
    pub focal_distance: f32,
    /// Renderable-sphere entity count.
    pub sphere_count: u32,
    /// Light entity count.
    pub light_count: u32,
    /// Render passes per frame.
    pub passes: u32,
    /// Shadow sampling quality.
    pub shadow_quality: f32,
    /// Shadow ray jitter amount.
    pub shadow_randomness: f32,
    /// Skybox sample intensity multiplier.
    pub skybox_strength: f32,
    pub(crate) _pad: [f32; 2],
}

/// Seam to the external compute kernel.
///
/// The kernel is an opaque collaborator: it consumes the frame parameters
/// and the two entity buffers and produces pixels. This crate ships no
/// implementation; the embedding renderer provides one.
pub trait TraceKernel<H: BufferHeap> {
    /// Record and submit the compute dispatch for one frame.
    fn dispatch(
        &mut self,
        params: &FrameParams,
        spheres: &EntityBuffer<SphereRecord, H>,
        lights: &EntityBuffer<SphereRecord, H>,
    );
}

/// The per-frame update engine.
///
/// Owns the scene registry, both category buffers, and the autofocus
/// controller. All mutation happens on the single synchronous
/// [`PathTraceEngine::begin_frame`] path, once per external frame tick.
pub struct PathTraceEngine<H: BufferHeap> {
    scene: SceneRegistry,
    sphere_buffer: EntityBuffer<SphereRecord, H>,
    light_buffer: EntityBuffer<SphereRecord, H>,
    autofocus: AutofocusController,
    options: Options,
}

impl<H: BufferHeap> PathTraceEngine<H> {
    /// Engine with an empty scene and the given options.
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            scene: SceneRegistry::new(),
            sphere_buffer: EntityBuffer::new("Sphere Entities"),
            light_buffer: EntityBuffer::new("Light Entities"),
            autofocus: AutofocusController::default(),
            options,
        }
    }

    /// Register an external object in the scene.
    pub fn register(&mut self, handle: &ObjectHandle) -> ObjectId {
        self.scene.register(handle)
    }

    /// Unregister a previously registered object.
    pub fn unregister(&mut self, id: ObjectId) {
        self.scene.unregister(id);
    }

    /// Run one frame's update and return the kernel parameters.
    ///
    /// Applies pending registration changes, refreshes every entity record
    /// from its bound external object, reconciles and re-uploads both
    /// category buffers, and derives the focal distance (smoothed autofocus
    /// or the manual scalar).
    ///
    /// # Errors
    ///
    /// Returns [`OrbrayError::BufferAlloc`] when a GPU buffer cannot be
    /// allocated; the frame must not be rendered in that case.
    pub fn begin_frame(
        &mut self,
        heap: &H,
        camera: &Camera,
        dt: f32,
    ) -> Result<FrameParams, OrbrayError> {
        if self.scene.apply_pending() {
            log::debug!(
                "scene changed: {} spheres, {} lights",
                self.scene.sphere_count(),
                self.scene.light_count()
            );
        }
        self.scene.refresh();

        let spheres_changed = self
            .sphere_buffer
            .reconcile(heap, &self.scene.sphere_records())?;
        let lights_changed = self
            .light_buffer
            .reconcile(heap, &self.scene.light_records())?;
        if spheres_changed || lights_changed {
            log::debug!("entity buffers reshaped; bind groups are stale");
        }

        let focal_distance = if self.options.focus.autofocus {
            let ray = Ray::new(camera.eye, camera.forward());
            let raw = nearest_hit(
                &ray,
                &self.scene.bounding_spheres(),
                self.options.quality.passes,
            );
            self.autofocus.update(raw, dt)
        } else {
            self.options.focus.focal_distance
        };

        let (pixel_offset, seed) = if self.options.quality.noise {
            (
                [rand::random::<f32>(), rand::random::<f32>()],
                rand::random::<f32>(),
            )
        } else {
            (FIXED_PIXEL_OFFSET, FIXED_SEED)
        };

        Ok(FrameParams {
            camera_to_world: camera.camera_to_world(),
            camera_inverse_projection: camera.inverse_projection(),
            sphere_count: self.scene.sphere_count() as u32,
            light_count: self.scene.light_count() as u32,
            pixel_offset,
            seed,
            passes: self.options.quality.passes,
            shadow_quality: self.options.quality.shadow_quality,
            shadow_randomness: self.options.quality.shadow_randomness,
            ground_smoothness: self.options.quality.ground_smoothness,
            ambient: self.options.ambient.ambient,
            skybox_strength: self.options.ambient.skybox_strength,
            focal_distance,
        })
    }

    /// Hand the frame to the external kernel.
    pub fn dispatch<K: TraceKernel<H>>(
        &mut self,
        kernel: &mut K,
        params: &FrameParams,
    ) {
        kernel.dispatch(params, &self.sphere_buffer, &self.light_buffer);
    }

    /// Read access to the scene registry.
    #[must_use]
    pub fn scene(&self) -> &SceneRegistry {
        &self.scene
    }

    /// Write access to the scene registry.
    pub fn scene_mut(&mut self) -> &mut SceneRegistry {
        &mut self.scene
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Write access to options.
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// The renderable-sphere entity buffer.
    #[must_use]
    pub fn sphere_buffer(&self) -> &EntityBuffer<SphereRecord, H> {
        &self.sphere_buffer
    }

    /// The light entity buffer.
    #[must_use]
    pub fn light_buffer(&self) -> &EntityBuffer<SphereRecord, H> {
        &self.light_buffer
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use glam::Vec3;

    use super::*;
    use crate::gpu::entity_buffer::BufferAllocError;
    use crate::options::{FocusOptions, QualityOptions};
    use crate::record::{RayMaterial, SPHERE_STRIDE};
    use crate::scene::ObjectState;

    /// Heap that counts allocations and never touches a GPU.
    #[derive(Default)]
    struct TestHeap {
        allocs: Cell<u32>,
    }

    impl BufferHeap for TestHeap {
        type Handle = ();

        fn alloc(&self, _label: &str, _size: u64) -> Result<(), BufferAllocError> {
            self.allocs.set(self.allocs.get() + 1);
            Ok(())
        }

        fn release(&self, _handle: ()) {}

        fn upload(&self, _handle: &(), _bytes: &[u8]) {}
    }

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO, 1.6)
    }

    fn sphere(pos: Vec3, radius: f32) -> ObjectHandle {
        ObjectState::surface(pos, radius, RayMaterial::default()).into_handle()
    }

    fn light(pos: Vec3) -> ObjectHandle {
        ObjectState::emitter(pos, 0.5, [4.0, 4.0, 4.0]).into_handle()
    }

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn buffer_shapes_follow_categories() {
        let heap = TestHeap::default();
        let mut engine = PathTraceEngine::new(Options::default());

        let handles = vec![
            sphere(Vec3::new(-1.0, 1.0, 0.0), 1.0),
            sphere(Vec3::new(0.0, 1.0, 0.0), 1.0),
            sphere(Vec3::new(1.0, 1.0, 0.0), 1.0),
        ];
        let lights = vec![
            light(Vec3::new(0.0, 5.0, 0.0)),
            light(Vec3::new(2.0, 5.0, 0.0)),
        ];
        for h in handles.iter().chain(lights.iter()) {
            let _ = engine.register(h);
        }

        let params = engine.begin_frame(&heap, &camera(), DT).unwrap();
        assert_eq!(params.sphere_count, 3);
        assert_eq!(params.light_count, 2);
        assert_eq!(engine.sphere_buffer().count(), 3);
        assert_eq!(engine.light_buffer().count(), 2);
        assert_eq!(engine.sphere_buffer().stride(), SPHERE_STRIDE);
        assert_eq!(engine.light_buffer().stride(), SPHERE_STRIDE);
    }

    #[test]
    fn unregister_all_empties_buffers_without_realloc() {
        let heap = TestHeap::default();
        let mut engine = PathTraceEngine::new(Options::default());

        let handles: Vec<_> =
            (0..4).map(|i| sphere(Vec3::new(i as f32, 1.0, 0.0), 1.0)).collect();
        let ids: Vec<_> = handles.iter().map(|h| engine.register(h)).collect();
        let _ = engine.begin_frame(&heap, &camera(), DT).unwrap();
        assert_eq!(heap.allocs.get(), 1);

        for id in ids {
            engine.unregister(id);
        }
        let params = engine.begin_frame(&heap, &camera(), DT).unwrap();
        assert_eq!(params.sphere_count, 0);
        assert!(engine.sphere_buffer().is_empty());

        // Empty collections must not allocate on subsequent frames.
        let _ = engine.begin_frame(&heap, &camera(), DT).unwrap();
        assert_eq!(heap.allocs.get(), 1);
    }

    #[test]
    fn refresh_reaches_the_uploaded_records() {
        let heap = TestHeap::default();
        let mut engine = PathTraceEngine::new(Options::default());
        let h = sphere(Vec3::ZERO, 1.0);
        let _ = engine.register(&h);
        let _ = engine.begin_frame(&heap, &camera(), DT).unwrap();

        h.borrow_mut().position = Vec3::new(0.0, 9.0, 0.0);
        let _ = engine.begin_frame(&heap, &camera(), DT).unwrap();
        assert_eq!(
            engine.scene().sphere_records()[0].position,
            [0.0, 9.0, 0.0]
        );
    }

    #[test]
    fn noise_off_is_deterministic() {
        let heap = TestHeap::default();
        let opts = Options {
            quality: QualityOptions {
                noise: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut engine = PathTraceEngine::new(opts);

        let a = engine.begin_frame(&heap, &camera(), DT).unwrap();
        let b = engine.begin_frame(&heap, &camera(), DT).unwrap();
        assert_eq!(a.seed, b.seed);
        assert_eq!(a.pixel_offset, b.pixel_offset);
        assert_eq!(a.pixel_offset, [0.5, 0.5]);
    }

    #[test]
    fn manual_focal_distance_when_autofocus_off() {
        let heap = TestHeap::default();
        let opts = Options {
            focus: FocusOptions {
                autofocus: false,
                focal_distance: 3.25,
            },
            ..Default::default()
        };
        let mut engine = PathTraceEngine::new(opts);

        let params = engine.begin_frame(&heap, &camera(), DT).unwrap();
        assert_eq!(params.focal_distance, 3.25);
    }

    #[test]
    fn autofocus_converges_on_looked_at_sphere() {
        let heap = TestHeap::default();
        let mut engine = PathTraceEngine::new(Options::default());
        let h = sphere(Vec3::ZERO, 0.5);
        let _ = engine.register(&h);

        let cam = camera();
        let mut focal = 0.0;
        for _ in 0..180 {
            focal = engine.begin_frame(&heap, &cam, DT).unwrap().focal_distance;
        }
        // Analytic hit distance is 5 - 0.5 - 0.001.
        assert!((focal - 4.499).abs() < 0.06, "focal = {focal}");
    }

    #[test]
    fn uniform_layout_is_16_byte_aligned() {
        assert_eq!(size_of::<FrameUniform>() % 16, 0);
    }
}
