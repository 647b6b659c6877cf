//! Authoritative scene registry: sphere and light entities in lock-step
//! with their externally-owned bindings.
//!
//! Each tracked entity pairs its GPU record with the weak binding it
//! mirrors, in one struct — insertion and removal can never desynchronize
//! a record from its source. Registration classifies the object once, by
//! its [`SurfaceKind`] variant; unregistration queues a removal that is
//! applied at the start of the next frame, never mid-reconciliation.

mod object;

use glam::Vec3;
pub use object::{ObjectHandle, ObjectState, SurfaceKind};
use object::ObjectBinding;
use std::rc::Rc;

use crate::record::SphereRecord;

/// Identifier assigned to an object at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u32);

/// One registered entity: GPU record plus the binding it mirrors.
struct Tracked {
    id: ObjectId,
    record: SphereRecord,
    binding: ObjectBinding,
}

impl Tracked {
    /// Snapshot the live state into a fresh record.
    fn snapshot(state: &ObjectState) -> SphereRecord {
        match state.surface {
            SurfaceKind::Material(ref m) => {
                SphereRecord::surface(state.position, state.radius, m)
            }
            SurfaceKind::Emitter(emission) => {
                SphereRecord::emitter(state.position, state.radius, emission)
            }
        }
    }
}

/// The live collections of sphere and light entities.
///
/// A single owned instance passed explicitly to the per-frame update —
/// there is no global registry. The rebuild flag is written here by
/// registration events and read-and-cleared exactly once per frame by
/// [`SceneRegistry::apply_pending`].
pub struct SceneRegistry {
    /// Renderable-sphere entities, insertion order.
    spheres: Vec<Tracked>,
    /// Light entities, insertion order.
    lights: Vec<Tracked>,
    /// Unregistered IDs awaiting removal on the next frame.
    pending_removals: Vec<ObjectId>,
    /// Set by any registration/unregistration event since the last frame.
    rebuild_needed: bool,
    next_id: u32,
}

impl SceneRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            spheres: Vec::new(),
            lights: Vec::new(),
            pending_removals: Vec::new(),
            rebuild_needed: false,
            next_id: 0,
        }
    }

    /// Register an external object, classifying it by its surface variant.
    ///
    /// Snapshots the object's current state into a new entity record,
    /// appends it to the matching category, and flags a rebuild. Returns
    /// the ID to pass to [`SceneRegistry::unregister`] later.
    pub fn register(&mut self, handle: &ObjectHandle) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;

        let state = handle.borrow();
        let tracked = Tracked {
            id,
            record: Tracked::snapshot(&state),
            binding: Rc::downgrade(handle),
        };
        match state.surface {
            SurfaceKind::Material(_) => self.spheres.push(tracked),
            SurfaceKind::Emitter(_) => self.lights.push(tracked),
        }
        self.rebuild_needed = true;
        id
    }

    /// Queue an object for removal and flag a rebuild.
    ///
    /// The entity/binding pair is removed by identity during
    /// [`SceneRegistry::apply_pending`] on the next frame, so removal never
    /// happens mid-reconciliation.
    pub fn unregister(&mut self, id: ObjectId) {
        self.pending_removals.push(id);
        self.rebuild_needed = true;
    }

    /// Apply queued removals and consume the rebuild flag.
    ///
    /// Must be called exactly once per frame, before reconciliation; this
    /// is the flag's only reader. Returns whether any registration event
    /// occurred since the previous frame.
    pub fn apply_pending(&mut self) -> bool {
        if !self.pending_removals.is_empty() {
            let removals = std::mem::take(&mut self.pending_removals);
            let before = self.spheres.len() + self.lights.len();
            self.spheres.retain(|t| !removals.contains(&t.id));
            self.lights.retain(|t| !removals.contains(&t.id));
            let removed = before - (self.spheres.len() + self.lights.len());
            if removed != removals.len() {
                log::warn!(
                    "{} of {} queued removals matched no entity",
                    removals.len() - removed,
                    removals.len()
                );
            }
        }
        let rebuilt = self.rebuild_needed;
        self.rebuild_needed = false;
        rebuilt
    }

    /// Refresh every entity record from its bound object's current state.
    ///
    /// Called once per frame so no record carries stale attributes into the
    /// upload. An entity whose binding has been destroyed without an
    /// unregister event keeps its last snapshot; that inconsistency is
    /// logged, not fatal.
    pub fn refresh(&mut self) {
        for tracked in self.spheres.iter_mut().chain(self.lights.iter_mut()) {
            match tracked.binding.upgrade() {
                Some(state) => {
                    tracked.record = Tracked::snapshot(&state.borrow());
                }
                None => {
                    log::warn!(
                        "entity {:?} lost its binding without unregistering; \
                         keeping last snapshot",
                        tracked.id
                    );
                }
            }
        }
    }

    /// Current sphere records, upload order.
    #[must_use]
    pub fn sphere_records(&self) -> Vec<SphereRecord> {
        self.spheres.iter().map(|t| t.record).collect()
    }

    /// Current light records, upload order.
    #[must_use]
    pub fn light_records(&self) -> Vec<SphereRecord> {
        self.lights.iter().map(|t| t.record).collect()
    }

    /// Number of renderable-sphere entities.
    #[must_use]
    pub fn sphere_count(&self) -> usize {
        self.spheres.len()
    }

    /// Number of light entities.
    #[must_use]
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Whether both categories are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty() && self.lights.is_empty()
    }

    /// All entity centers and radii (spheres then lights), for intersection
    /// queries against the whole scene.
    #[must_use]
    pub fn bounding_spheres(&self) -> Vec<(Vec3, f32)> {
        self.spheres
            .iter()
            .chain(self.lights.iter())
            .map(|t| (t.record.center(), t.record.radius))
            .collect()
    }
}

impl Default for SceneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RayMaterial;

    fn sphere_at(x: f32) -> ObjectHandle {
        ObjectState::surface(
            Vec3::new(x, 0.0, 0.0),
            1.0,
            RayMaterial::default(),
        )
        .into_handle()
    }

    fn light_at(x: f32) -> ObjectHandle {
        ObjectState::emitter(Vec3::new(x, 5.0, 0.0), 0.5, [4.0, 4.0, 4.0])
            .into_handle()
    }

    #[test]
    fn classification_splits_categories() {
        let mut reg = SceneRegistry::new();
        let s1 = sphere_at(0.0);
        let s2 = sphere_at(1.0);
        let s3 = sphere_at(2.0);
        let l1 = light_at(0.0);
        let l2 = light_at(1.0);
        for h in [&s1, &s2, &s3, &l1, &l2] {
            let _ = reg.register(h);
        }
        assert_eq!(reg.sphere_count(), 3);
        assert_eq!(reg.light_count(), 2);
    }

    #[test]
    fn rebuild_flag_set_and_cleared_once() {
        let mut reg = SceneRegistry::new();
        let h = sphere_at(0.0);
        let _ = reg.register(&h);
        assert!(reg.apply_pending());
        // Second read in the same quiescent state: flag already consumed.
        assert!(!reg.apply_pending());
    }

    #[test]
    fn unregister_removes_pair_on_next_frame() {
        let mut reg = SceneRegistry::new();
        let handles: Vec<_> = (0..4).map(|i| sphere_at(i as f32)).collect();
        let ids: Vec<_> = handles.iter().map(|h| reg.register(h)).collect();
        let _ = reg.apply_pending();

        for id in ids {
            reg.unregister(id);
        }
        // Removal is deferred: collections untouched until the frame step.
        assert_eq!(reg.sphere_count(), 4);
        assert!(reg.apply_pending());
        assert!(reg.is_empty());
    }

    #[test]
    fn unregister_targets_only_matching_identity() {
        let mut reg = SceneRegistry::new();
        let a = sphere_at(0.0);
        let b = sphere_at(1.0);
        let id_a = reg.register(&a);
        let _id_b = reg.register(&b);
        reg.unregister(id_a);
        let _ = reg.apply_pending();

        assert_eq!(reg.sphere_count(), 1);
        assert_eq!(reg.sphere_records()[0].position, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn refresh_pulls_current_state() {
        let mut reg = SceneRegistry::new();
        let h = sphere_at(0.0);
        let _ = reg.register(&h);

        h.borrow_mut().position = Vec3::new(0.0, 3.0, 0.0);
        h.borrow_mut().radius = 2.5;
        reg.refresh();

        let records = reg.sphere_records();
        assert_eq!(records[0].position, [0.0, 3.0, 0.0]);
        assert_eq!(records[0].radius, 2.5);
    }

    #[test]
    fn dead_binding_keeps_last_snapshot() {
        let mut reg = SceneRegistry::new();
        let h = sphere_at(7.0);
        let _ = reg.register(&h);
        drop(h);

        // Must not panic; record retains the registration snapshot.
        reg.refresh();
        assert_eq!(reg.sphere_records()[0].position, [7.0, 0.0, 0.0]);
    }

    #[test]
    fn emission_snapshot_for_lights() {
        let mut reg = SceneRegistry::new();
        let l = light_at(0.0);
        let _ = reg.register(&l);
        assert_eq!(reg.light_records()[0].color, [4.0, 4.0, 4.0]);
    }
}
