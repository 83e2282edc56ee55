use glow::HasContext;
use log::debug;
use nalgebra::{Matrix4, Vector3};
use std::collections::BTreeMap;
use std::path::Path;

/// One programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
}

impl ShaderStage {
    fn to_gl(self) -> u32 {
        match self {
            Self::Vertex => glow::VERTEX_SHADER,
            Self::Fragment => glow::FRAGMENT_SHADER,
            Self::Geometry => glow::GEOMETRY_SHADER,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Geometry => "geometry",
        }
    }
}

/// Shader construction failure. Compile and link variants carry the driver's
/// info log verbatim so shader bugs stay diagnosable.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read {stage} shader source '{path}': {source}")]
    Io {
        stage: &'static str,
        path: String,
        source: std::io::Error,
    },
    #[error("failed to allocate shader object: {0}")]
    Allocation(String),
    #[error("{stage} shader compilation failed:\n{log}")]
    Compile { stage: &'static str, log: String },
    #[error("shader program link failed:\n{log}")]
    Link { log: String },
}

/// Accumulates per-stage sources, then compiles and links them into a
/// [`Program`]. Setting a stage twice replaces the earlier source.
#[derive(Debug, Default)]
pub struct ShaderBuilder {
    sources: BTreeMap<ShaderStage, String>,
}

impl ShaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in-memory source text for one stage.
    pub fn set_source(&mut self, stage: ShaderStage, source: &str) -> &mut Self {
        self.sources.insert(stage, source.to_owned());
        self
    }

    /// Reads source text for one stage from a file.
    pub fn set_file<P: AsRef<Path>>(
        &mut self,
        stage: ShaderStage,
        path: P,
    ) -> Result<&mut Self, ShaderError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ShaderError::Io {
            stage: stage.name(),
            path: path.display().to_string(),
            source: e,
        })?;
        self.sources.insert(stage, source);
        Ok(self)
    }

    /// Compiles each recorded stage and links them into a program.
    pub fn build(&self, gl: &glow::Context) -> Result<Program, ShaderError> {
        let program = unsafe { gl.create_program() }.map_err(ShaderError::Allocation)?;
        let mut shaders = Vec::with_capacity(self.sources.len());

        for (&stage, source) in &self.sources {
            let shader =
                unsafe { gl.create_shader(stage.to_gl()) }.map_err(ShaderError::Allocation)?;
            unsafe {
                gl.shader_source(shader, source);
                gl.compile_shader(shader);
            }
            if !unsafe { gl.get_shader_compile_status(shader) } {
                let log = unsafe { gl.get_shader_info_log(shader) };
                unsafe {
                    gl.delete_shader(shader);
                    for s in shaders {
                        gl.delete_shader(s);
                    }
                    gl.delete_program(program);
                }
                return Err(ShaderError::Compile {
                    stage: stage.name(),
                    log,
                });
            }
            unsafe { gl.attach_shader(program, shader) };
            shaders.push(shader);
        }

        unsafe { gl.link_program(program) };
        let linked = unsafe { gl.get_program_link_status(program) };

        // Stage objects are no longer needed once the program exists (or
        // failed to); release them either way.
        for shader in shaders {
            unsafe {
                gl.detach_shader(program, shader);
                gl.delete_shader(shader);
            }
        }

        if !linked {
            let log = unsafe { gl.get_program_info_log(program) };
            unsafe { gl.delete_program(program) };
            return Err(ShaderError::Link { log });
        }

        debug!("Linked shader program with {} stage(s)", self.sources.len());
        Ok(Program { handle: program })
    }
}

/// A compiled and linked shader program.
pub struct Program {
    handle: glow::Program,
}

impl Program {
    pub fn bind(&self, gl: &glow::Context) {
        unsafe { gl.use_program(Some(self.handle)) };
    }

    /// Looks up a uniform by name. Returns `None` when the uniform does not
    /// exist or was optimized out; callers must tolerate that.
    pub fn uniform_location(&self, gl: &glow::Context, name: &str) -> Option<glow::UniformLocation> {
        unsafe { gl.get_uniform_location(self.handle, name) }
    }

    /// Writes a 4x4 matrix uniform. A missing uniform is a no-op, mirroring
    /// GL's invalid-location semantics.
    pub fn set_mat4(&self, gl: &glow::Context, name: &str, value: &Matrix4<f32>) {
        let location = self.uniform_location(gl, name);
        unsafe { gl.uniform_matrix_4_f32_slice(location.as_ref(), false, value.as_slice()) };
    }

    /// Writes a vec3 uniform; no-op when missing.
    pub fn set_vec3(&self, gl: &glow::Context, name: &str, value: &Vector3<f32>) {
        let location = self.uniform_location(gl, name);
        unsafe { gl.uniform_3_f32(location.as_ref(), value.x, value.y, value.z) };
    }

    /// Writes an integer uniform (also used for sampler units); no-op when
    /// missing.
    pub fn set_int(&self, gl: &glow::Context, name: &str, value: i32) {
        let location = self.uniform_location(gl, name);
        unsafe { gl.uniform_1_i32(location.as_ref(), value) };
    }

    pub fn destroy(self, gl: &glow::Context) {
        unsafe { gl.delete_program(self.handle) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_a_stage_twice_replaces_it() {
        let mut builder = ShaderBuilder::new();
        builder.set_source(ShaderStage::Vertex, "first");
        builder.set_source(ShaderStage::Vertex, "second");
        assert_eq!(builder.sources.len(), 1);
        assert_eq!(builder.sources[&ShaderStage::Vertex], "second");
    }

    #[test]
    fn missing_source_file_reports_path() {
        let mut builder = ShaderBuilder::new();
        let err = builder
            .set_file(ShaderStage::Fragment, "/nonexistent/shader.frag")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("fragment"));
        assert!(message.contains("/nonexistent/shader.frag"));
    }
}
