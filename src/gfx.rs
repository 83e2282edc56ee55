pub mod builder;
pub mod mesh;
pub mod shader;

use crate::gfx::builder::StateError;

/// Errors produced by the GPU-resident geometry layer.
#[derive(Debug, thiserror::Error)]
pub enum GfxError {
    /// The driver refused to allocate a buffer/vertex-array object.
    #[error("failed to allocate GPU object: {0}")]
    Allocation(String),
    #[error(transparent)]
    State(#[from] StateError),
}
