// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Real-time GPU path tracing engine for dynamic sphere scenes, built on
//! wgpu.
//!
//! Orbray keeps a live, mutable scene of spherical objects and spherical
//! light sources synchronized with GPU-visible storage buffers, recomputing
//! per-frame shader inputs from externally-owned transform and material
//! state. It also derives a camera focal distance from analytic ray–sphere
//! intersections, smoothed over time to avoid visible jitter.
//!
//! # Key entry points
//!
//! - [`frame::PathTraceEngine`] - the per-frame update engine
//! - [`scene::SceneRegistry`] - the live sphere/light entity registry
//! - [`options::Options`] - runtime configuration (quality, focus, ambient)
//! - [`trace`] - analytic ray–sphere intersection
//!
//! # Architecture
//!
//! The engine runs one synchronous update per externally-driven frame tick:
//! pending registration changes are applied, every entity record is
//! refreshed from its bound external object, both category buffers are
//! reconciled against their collections and re-uploaded, and the resulting
//! buffers plus a packed parameter block are handed to an external compute
//! kernel behind the [`frame::TraceKernel`] seam. The kernel itself, the
//! window, and input handling live outside this crate.

pub mod camera;
pub mod error;
pub mod focus;
pub mod frame;
pub mod gpu;
pub mod options;
pub mod record;
pub mod scene;
pub mod trace;
pub mod util;
