//! GPU resource ownership and scene buffer synchronization.

pub mod entity_buffer;
pub mod render_context;
