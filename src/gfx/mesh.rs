use crate::core::geometry::Vertex;
use crate::gfx::GfxError;
use glow::HasContext;

/// Interleaved layout: position (3) + normal (3) + texcoord (2).
pub const FLOATS_PER_VERTEX: usize = 8;

/// Raw GL draw-mode value that does not name any known primitive topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized draw mode enum 0x{0:04X}")]
pub struct InvalidModeError(pub u32);

/// Primitive topology used for a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    LinesAdjacency,
    LineStripAdjacency,
    Triangles,
    TriangleStrip,
    TriangleFan,
    TrianglesAdjacency,
    TriangleStripAdjacency,
    Patches,
}

impl DrawMode {
    /// Maps a raw GL enum to a draw mode, rejecting anything unknown.
    pub fn from_gl(mode: u32) -> Result<Self, InvalidModeError> {
        match mode {
            glow::POINTS => Ok(Self::Points),
            glow::LINES => Ok(Self::Lines),
            glow::LINE_STRIP => Ok(Self::LineStrip),
            glow::LINE_LOOP => Ok(Self::LineLoop),
            glow::LINES_ADJACENCY => Ok(Self::LinesAdjacency),
            glow::LINE_STRIP_ADJACENCY => Ok(Self::LineStripAdjacency),
            glow::TRIANGLES => Ok(Self::Triangles),
            glow::TRIANGLE_STRIP => Ok(Self::TriangleStrip),
            glow::TRIANGLE_FAN => Ok(Self::TriangleFan),
            glow::TRIANGLES_ADJACENCY => Ok(Self::TrianglesAdjacency),
            glow::TRIANGLE_STRIP_ADJACENCY => Ok(Self::TriangleStripAdjacency),
            glow::PATCHES => Ok(Self::Patches),
            other => Err(InvalidModeError(other)),
        }
    }

    pub fn to_gl(self) -> u32 {
        match self {
            Self::Points => glow::POINTS,
            Self::Lines => glow::LINES,
            Self::LineStrip => glow::LINE_STRIP,
            Self::LineLoop => glow::LINE_LOOP,
            Self::LinesAdjacency => glow::LINES_ADJACENCY,
            Self::LineStripAdjacency => glow::LINE_STRIP_ADJACENCY,
            Self::Triangles => glow::TRIANGLES,
            Self::TriangleStrip => glow::TRIANGLE_STRIP,
            Self::TriangleFan => glow::TRIANGLE_FAN,
            Self::TrianglesAdjacency => glow::TRIANGLES_ADJACENCY,
            Self::TriangleStripAdjacency => glow::TRIANGLE_STRIP_ADJACENCY,
            Self::Patches => glow::PATCHES,
        }
    }

    /// Number of primitives implied by `index_count` indices under this mode.
    ///
    /// `patch_vertices` is only consulted for `Patches` (the GL patch size in
    /// effect at upload time); pass 1 otherwise.
    pub fn primitive_count(self, index_count: usize, patch_vertices: usize) -> usize {
        match self {
            Self::Points | Self::LineLoop => index_count,
            Self::Lines | Self::LinesAdjacency | Self::LineStrip | Self::LineStripAdjacency => {
                index_count.saturating_sub(1)
            }
            Self::Triangles | Self::TrianglesAdjacency => index_count / 3,
            Self::TriangleFan | Self::TriangleStrip | Self::TriangleStripAdjacency => {
                index_count.saturating_sub(2)
            }
            Self::Patches => index_count / patch_vertices.max(1),
        }
    }
}

/// GPU-side realization of a mesh. Created lazily, owned exclusively.
struct GpuMesh {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ibo: glow::Buffer,
    primitive_count: usize,
}

/// A collection of vertices and indices representing a drawable 3D object.
///
/// CPU-side data is the source of truth; `upload` realizes it as a vertex
/// array + vertex/index buffer pair, and `draw` uploads on first use.
pub struct Mesh {
    /// List of vertices.
    pub vertices: Vec<Vertex>,
    /// List of indices into `vertices`; each must be in range at upload time.
    pub indices: Vec<u32>,
    /// Primitive topology for draw calls.
    pub mode: DrawMode,
    /// Render with line polygon mode instead of fill.
    pub wireframe: bool,
    gpu: Option<GpuMesh>,
}

impl Mesh {
    pub fn new(mode: DrawMode) -> Self {
        Self::with_data(mode, Vec::new(), Vec::new())
    }

    pub fn with_data(mode: DrawMode, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            mode,
            wireframe: false,
            gpu: None,
        }
    }

    /// Whether GPU handles currently exist for this mesh.
    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    /// Primitive count computed at the last upload, if any.
    pub fn primitive_count(&self) -> Option<usize> {
        self.gpu.as_ref().map(|g| g.primitive_count)
    }

    /// (Re)uploads the CPU-side data to the GPU.
    ///
    /// Handles are created on first call and reused afterwards; buffer
    /// contents are rewritten unconditionally and the primitive count is
    /// recomputed. Safe to call repeatedly.
    pub fn upload(&mut self, gl: &glow::Context) -> Result<(), GfxError> {
        debug_assert!(
            self.indices
                .iter()
                .all(|&i| (i as usize) < self.vertices.len()),
            "mesh index out of range"
        );

        let (vao, vbo, ibo) = match &self.gpu {
            Some(gpu) => (gpu.vao, gpu.vbo, gpu.ibo),
            None => unsafe {
                (
                    gl.create_vertex_array().map_err(GfxError::Allocation)?,
                    gl.create_buffer().map_err(GfxError::Allocation)?,
                    gl.create_buffer().map_err(GfxError::Allocation)?,
                )
            },
        };

        let mut vertex_data: Vec<f32> = Vec::with_capacity(self.vertices.len() * FLOATS_PER_VERTEX);
        for v in &self.vertices {
            vertex_data.extend_from_slice(&[
                v.position.x,
                v.position.y,
                v.position.z,
                v.normal.x,
                v.normal.y,
                v.normal.z,
                v.texcoord.x,
                v.texcoord.y,
            ]);
        }

        let stride = (FLOATS_PER_VERTEX * size_of::<f32>()) as i32;
        unsafe {
            gl.bind_vertex_array(Some(vao));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&vertex_data),
                glow::STATIC_DRAW,
            );
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, 3 * size_of::<f32>() as i32);
            gl.enable_vertex_attrib_array(2);
            gl.vertex_attrib_pointer_f32(2, 2, glow::FLOAT, false, stride, 6 * size_of::<f32>() as i32);

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(&self.indices),
                glow::STATIC_DRAW,
            );

            // The element-array binding sticks to the VAO, so unbind the VAO
            // before unbinding the array buffer.
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }

        let patch_vertices = if self.mode == DrawMode::Patches {
            unsafe { gl.get_parameter_i32(glow::PATCH_VERTICES) }.max(1) as usize
        } else {
            1
        };
        let primitive_count = self.mode.primitive_count(self.indices.len(), patch_vertices);

        self.gpu = Some(GpuMesh {
            vao,
            vbo,
            ibo,
            primitive_count,
        });
        Ok(())
    }

    /// Draws the mesh, uploading first if it has never been uploaded.
    pub fn draw(&mut self, gl: &glow::Context) -> Result<(), GfxError> {
        if self.gpu.is_none() {
            self.upload(gl)?;
        }
        if let Some(gpu) = &self.gpu {
            unsafe {
                gl.polygon_mode(
                    glow::FRONT_AND_BACK,
                    if self.wireframe { glow::LINE } else { glow::FILL },
                );
                gl.bind_vertex_array(Some(gpu.vao));
                gl.draw_elements(
                    self.mode.to_gl(),
                    self.indices.len() as i32,
                    glow::UNSIGNED_INT,
                    0,
                );
            }
        }
        Ok(())
    }

    /// Releases the GPU handles. The CPU-side data is kept, so a later
    /// `upload` realizes the mesh again with fresh handles.
    pub fn destroy(&mut self, gl: &glow::Context) {
        if let Some(gpu) = self.gpu.take() {
            unsafe {
                gl.delete_buffer(gpu.ibo);
                gl.delete_buffer(gpu.vbo);
                gl.delete_vertex_array(gpu.vao);
            }
        }
    }
}

impl Clone for Mesh {
    /// Clones the CPU-side data only. The clone owns no GPU handles and
    /// realizes its own on the next upload/draw.
    fn clone(&self) -> Self {
        Self {
            vertices: self.vertices.clone(),
            indices: self.indices.clone(),
            mode: self.mode,
            wireframe: self.wireframe,
            gpu: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    const COUNTS: [usize; 6] = [0, 1, 3, 4, 6, 100];

    #[test]
    fn primitive_count_matches_table() {
        for n in COUNTS {
            assert_eq!(DrawMode::Points.primitive_count(n, 1), n);
            assert_eq!(DrawMode::LineLoop.primitive_count(n, 1), n);
            assert_eq!(DrawMode::Lines.primitive_count(n, 1), n.saturating_sub(1));
            assert_eq!(
                DrawMode::LinesAdjacency.primitive_count(n, 1),
                n.saturating_sub(1)
            );
            assert_eq!(
                DrawMode::LineStrip.primitive_count(n, 1),
                n.saturating_sub(1)
            );
            assert_eq!(
                DrawMode::LineStripAdjacency.primitive_count(n, 1),
                n.saturating_sub(1)
            );
            assert_eq!(DrawMode::Triangles.primitive_count(n, 1), n / 3);
            assert_eq!(DrawMode::TrianglesAdjacency.primitive_count(n, 1), n / 3);
            assert_eq!(
                DrawMode::TriangleFan.primitive_count(n, 1),
                n.saturating_sub(2)
            );
            assert_eq!(
                DrawMode::TriangleStrip.primitive_count(n, 1),
                n.saturating_sub(2)
            );
            assert_eq!(
                DrawMode::TriangleStripAdjacency.primitive_count(n, 1),
                n.saturating_sub(2)
            );
            assert_eq!(DrawMode::Patches.primitive_count(n, 4), n / 4);
        }
    }

    #[test]
    fn unknown_gl_mode_is_rejected() {
        assert!(DrawMode::from_gl(glow::TRIANGLES).is_ok());
        let err = DrawMode::from_gl(0xDEAD).unwrap_err();
        assert_eq!(err, InvalidModeError(0xDEAD));
    }

    #[test]
    fn gl_mode_round_trip() {
        for mode in [
            DrawMode::Points,
            DrawMode::Lines,
            DrawMode::LineStrip,
            DrawMode::LineLoop,
            DrawMode::LinesAdjacency,
            DrawMode::LineStripAdjacency,
            DrawMode::Triangles,
            DrawMode::TriangleStrip,
            DrawMode::TriangleFan,
            DrawMode::TrianglesAdjacency,
            DrawMode::TriangleStripAdjacency,
            DrawMode::Patches,
        ] {
            assert_eq!(DrawMode::from_gl(mode.to_gl()), Ok(mode));
        }
    }

    #[test]
    fn quad_counts_two_triangles() {
        // 4 vertices, 6 indices, triangles mode.
        assert_eq!(DrawMode::Triangles.primitive_count(6, 1), 2);
    }

    #[test]
    fn clone_is_unrealized() {
        let mesh = Mesh::with_data(
            DrawMode::Triangles,
            vec![
                Vertex::from_position(Point3::new(0.0, 0.0, 0.0)),
                Vertex::from_position(Point3::new(1.0, 0.0, 0.0)),
                Vertex::from_position(Point3::new(0.0, 1.0, 0.0)),
            ],
            vec![0, 1, 2],
        );
        let copy = mesh.clone();
        assert!(!copy.is_uploaded());
        assert_eq!(copy.vertices.len(), 3);
        assert_eq!(copy.indices, mesh.indices);
        assert_eq!(copy.mode, mesh.mode);
    }
}
