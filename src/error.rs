//! Crate-level error types.

use std::fmt;

use crate::gpu::entity_buffer::BufferAllocError;
use crate::gpu::render_context::RenderContextError;

/// Errors produced by the orbray crate.
#[derive(Debug)]
pub enum OrbrayError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// GPU entity buffer allocation failure. Fatal for the frame: the
    /// compute kernel cannot run without its scene buffers.
    BufferAlloc(BufferAllocError),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Generic I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for OrbrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::BufferAlloc(e) => {
                write!(f, "entity buffer allocation failed: {e}")
            }
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for OrbrayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::BufferAlloc(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::OptionsParse(_) => None,
        }
    }
}

impl From<RenderContextError> for OrbrayError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<BufferAllocError> for OrbrayError {
    fn from(e: BufferAllocError) -> Self {
        Self::BufferAlloc(e)
    }
}

impl From<std::io::Error> for OrbrayError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
