pub mod axis;
pub mod camera;
pub mod quad;
pub mod teapot;

use crate::gfx::GfxError;
use crate::gfx::builder::StateError;
use crate::gfx::shader::ShaderError;
use crate::io::image::DecodeError;
use crate::io::obj_loader::ObjError;

/// Any failure while constructing a scene object (shader compilation,
/// asset decoding, geometry upload). Propagated to the application layer;
/// the core never substitutes placeholder assets.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Gfx(#[from] GfxError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Obj(#[from] ObjError),
    #[error("texture upload failed: {0}")]
    Texture(String),
}
