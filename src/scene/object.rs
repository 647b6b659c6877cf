//! Externally-owned scene objects.
//!
//! The engine never owns object transforms or materials; the embedding
//! application does. An [`ObjectHandle`] is the shared, mutable state the
//! owner updates between frames, and the registry holds only a weak
//! binding to it so a destroyed object is observable instead of dangling.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec3;

use crate::record::RayMaterial;

/// How an object interacts with light.
///
/// Resolved exactly once at registration: an object is either a reflective
/// surface or an emitter, never both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceKind {
    /// Renderable sphere with a surface material.
    Material(RayMaterial),
    /// Spherical light with a radiant emission color.
    Emitter([f32; 3]),
}

/// Live state of one external scene object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectState {
    /// World-space center.
    pub position: Vec3,
    /// Bounding sphere radius.
    pub radius: f32,
    /// Surface classification and attributes.
    pub surface: SurfaceKind,
}

impl ObjectState {
    /// State for a renderable sphere.
    #[must_use]
    pub fn surface(position: Vec3, radius: f32, material: RayMaterial) -> Self {
        Self {
            position,
            radius,
            surface: SurfaceKind::Material(material),
        }
    }

    /// State for a spherical light.
    #[must_use]
    pub fn emitter(position: Vec3, radius: f32, emission: [f32; 3]) -> Self {
        Self {
            position,
            radius,
            surface: SurfaceKind::Emitter(emission),
        }
    }

    /// Wrap into a shared handle the owner can keep mutating.
    #[must_use]
    pub fn into_handle(self) -> ObjectHandle {
        Rc::new(RefCell::new(self))
    }
}

/// Shared, owner-mutable handle to an object's live state.
///
/// `Rc`, not `Arc`: the whole update path is single-threaded by contract.
pub type ObjectHandle = Rc<RefCell<ObjectState>>;

/// Weak binding held by the registry.
pub(crate) type ObjectBinding = Weak<RefCell<ObjectState>>;
