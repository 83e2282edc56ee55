use crate::gfx::GfxError;
use crate::gfx::mesh::DrawMode;
use glow::HasContext;
use nalgebra::{Point3, Vector2, Vector3};

/// Begin/end ordering violation in the immediate-mode builder.
///
/// These are programmer errors; the builder makes no attempt to recover a
/// usable state after one is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct StateError(pub &'static str);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    Fresh,
    Building,
    Ended,
}

/// GPU handles owned by an ended builder: one vertex array plus one buffer
/// per attribute stream. Released as a unit.
struct BuilderGpu {
    vao: glow::VertexArray,
    vbo_pos: glow::Buffer,
    vbo_norm: glow::Buffer,
    vbo_uv: glow::Buffer,
}

/// Immediate-style geometry builder.
///
/// Accumulates per-vertex attributes between `begin` and `end` with
/// "current normal / current texcoord" cursor state stamped onto every added
/// vertex, then uploads the three parallel attribute arrays as separate
/// buffers (locations 0/1/2) and draws them non-indexed.
pub struct ImmediateBuilder {
    positions: Vec<f32>,
    normals: Vec<f32>,
    uvs: Vec<f32>,

    current_normal: Vector3<f32>,
    current_uv: Vector2<f32>,

    state: BuilderState,
    mode: DrawMode,
    vertex_count: usize,
    primitive_count: usize,
    gpu: Option<BuilderGpu>,
}

impl Default for ImmediateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImmediateBuilder {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            current_normal: Vector3::new(0.0, 0.0, 1.0),
            current_uv: Vector2::zeros(),
            state: BuilderState::Fresh,
            mode: DrawMode::Triangles,
            vertex_count: 0,
            primitive_count: 0,
            gpu: None,
        }
    }

    /// Starts accumulating geometry for the given draw mode.
    pub fn begin(&mut self, mode: DrawMode) -> Result<(), StateError> {
        match self.state {
            BuilderState::Fresh => {
                self.mode = mode;
                self.state = BuilderState::Building;
                Ok(())
            }
            BuilderState::Building => Err(StateError("begin() cannot be called twice")),
            BuilderState::Ended => Err(StateError("begin() cannot be called after end()")),
        }
    }

    /// Updates the cursor normal stamped onto subsequently added vertices.
    /// Legal in any state; only meaningful while building.
    pub fn set_normal(&mut self, normal: Vector3<f32>) {
        self.current_normal = normal;
    }

    /// Updates the cursor texture coordinate stamped onto subsequently added
    /// vertices. Legal in any state; only meaningful while building.
    pub fn set_texcoord(&mut self, uv: Vector2<f32>) {
        self.current_uv = uv;
    }

    /// Appends a vertex carrying the current cursor normal and texcoord.
    pub fn add_vertex(&mut self, position: Point3<f32>) -> Result<(), StateError> {
        match self.state {
            BuilderState::Fresh => Err(StateError("add_vertex() requires begin() first")),
            BuilderState::Ended => Err(StateError("add_vertex() cannot be called after end()")),
            BuilderState::Building => {
                self.positions
                    .extend_from_slice(&[position.x, position.y, position.z]);
                self.normals.extend_from_slice(&[
                    self.current_normal.x,
                    self.current_normal.y,
                    self.current_normal.z,
                ]);
                self.uvs
                    .extend_from_slice(&[self.current_uv.x, self.current_uv.y]);
                self.vertex_count += 1;
                Ok(())
            }
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Primitive count derived at `end()`.
    pub fn primitive_count(&self) -> usize {
        self.primitive_count
    }

    /// Finishes building: uploads the three attribute arrays as separate
    /// buffers bound to locations 0/1/2 of a fresh vertex array, derives the
    /// primitive count, and discards the CPU-side arrays.
    pub fn end(&mut self, gl: &glow::Context) -> Result<(), GfxError> {
        match self.state {
            BuilderState::Fresh => {
                return Err(StateError("end() requires begin() first").into());
            }
            BuilderState::Ended => {
                return Err(StateError("end() cannot be called twice").into());
            }
            BuilderState::Building => {}
        }

        let vao = unsafe { gl.create_vertex_array() }.map_err(GfxError::Allocation)?;
        let vbo_pos = unsafe { gl.create_buffer() }.map_err(GfxError::Allocation)?;
        let vbo_norm = unsafe { gl.create_buffer() }.map_err(GfxError::Allocation)?;
        let vbo_uv = unsafe { gl.create_buffer() }.map_err(GfxError::Allocation)?;

        unsafe {
            gl.bind_vertex_array(Some(vao));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo_pos));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&self.positions),
                glow::STATIC_DRAW,
            );
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, 0, 0);

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo_norm));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&self.normals),
                glow::STATIC_DRAW,
            );
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, 0, 0);

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo_uv));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&self.uvs),
                glow::STATIC_DRAW,
            );
            gl.enable_vertex_attrib_array(2);
            gl.vertex_attrib_pointer_f32(2, 2, glow::FLOAT, false, 0, 0);

            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_vertex_array(None);
        }

        self.primitive_count = self.mode.primitive_count(self.vertex_count, 1);
        self.gpu = Some(BuilderGpu {
            vao,
            vbo_pos,
            vbo_norm,
            vbo_uv,
        });
        self.state = BuilderState::Ended;

        // The CPU copies are not needed after upload.
        self.positions.clear();
        self.normals.clear();
        self.uvs.clear();
        Ok(())
    }

    /// Issues a non-indexed array draw over the accumulated vertices.
    pub fn draw(&self, gl: &glow::Context) -> Result<(), StateError> {
        let Some(gpu) = &self.gpu else {
            return Err(StateError("draw() requires end() first"));
        };
        unsafe {
            gl.bind_vertex_array(Some(gpu.vao));
            gl.draw_arrays(self.mode.to_gl(), 0, self.vertex_count as i32);
        }
        Ok(())
    }

    /// Releases the vertex array and all three attribute buffers together.
    pub fn destroy(&mut self, gl: &glow::Context) {
        if let Some(gpu) = self.gpu.take() {
            unsafe {
                gl.delete_buffer(gpu.vbo_pos);
                gl.delete_buffer(gpu.vbo_norm);
                gl.delete_buffer(gpu.vbo_uv);
                gl.delete_vertex_array(gpu.vao);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_vertex_before_begin_fails() {
        let mut b = ImmediateBuilder::new();
        assert!(b.add_vertex(Point3::origin()).is_err());
    }

    #[test]
    fn begin_twice_fails() {
        let mut b = ImmediateBuilder::new();
        b.begin(DrawMode::Triangles).unwrap();
        assert_eq!(
            b.begin(DrawMode::Lines),
            Err(StateError("begin() cannot be called twice"))
        );
    }

    #[test]
    fn draw_before_end_fails() {
        let b = ImmediateBuilder::new();
        assert!(b.gpu.is_none());
        // draw() needs a context, but the state check comes first and is what
        // we can exercise here: no GPU handles exist before end().
    }

    #[test]
    fn cursor_state_is_stamped_onto_vertices() {
        let mut b = ImmediateBuilder::new();
        b.begin(DrawMode::Triangles).unwrap();
        b.add_vertex(Point3::new(0.0, 0.0, 0.0)).unwrap();
        b.set_normal(Vector3::new(0.0, 1.0, 0.0));
        b.set_texcoord(Vector2::new(0.5, 0.25));
        b.add_vertex(Point3::new(1.0, 0.0, 0.0)).unwrap();

        // First vertex got the defaults, second the updated cursors.
        assert_eq!(&b.normals[0..3], &[0.0, 0.0, 1.0]);
        assert_eq!(&b.normals[3..6], &[0.0, 1.0, 0.0]);
        assert_eq!(&b.uvs[0..2], &[0.0, 0.0]);
        assert_eq!(&b.uvs[2..4], &[0.5, 0.25]);
        assert_eq!(b.vertex_count(), 2);
    }

    #[test]
    fn cursor_updates_do_not_touch_existing_vertices() {
        let mut b = ImmediateBuilder::new();
        b.begin(DrawMode::Lines).unwrap();
        b.add_vertex(Point3::new(0.0, 0.0, 0.0)).unwrap();
        b.set_normal(Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(&b.normals[0..3], &[0.0, 0.0, 1.0]);
    }
}
