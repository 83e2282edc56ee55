use crate::core::geometry::Vertex;
use crate::gfx::GfxError;
use crate::gfx::mesh::Mesh;
use crate::gfx::shader::{Program, ShaderBuilder, ShaderStage};
use crate::io::image::PixelBuffer;
use crate::io::obj_loader::load_obj;
use crate::scene::SceneError;
use glow::HasContext;
use log::info;
use nalgebra::{Matrix4, Point3};
use std::path::Path;

const BOX_EDGES: i32 = 12;

/// The loaded showcase model: a textured OBJ mesh plus an optional
/// bounding-box outline pass.
pub struct Teapot {
    program: Program,
    bounds_program: Program,
    texture: Option<glow::Texture>,
    mesh: Mesh,
    /// Attribute-less vertex array for the instanced outline draw.
    bounds_vao: glow::VertexArray,
    bounds: (Point3<f32>, Point3<f32>),
}

impl Teapot {
    pub fn create<P: AsRef<Path>>(
        gl: &glow::Context,
        model_path: P,
        texture_image: Option<&PixelBuffer>,
    ) -> Result<Self, SceneError> {
        let mut builder = ShaderBuilder::new();
        builder
            .set_source(
                ShaderStage::Vertex,
                include_str!("../../res/shaders/textured.vert"),
            )
            .set_source(
                ShaderStage::Fragment,
                include_str!("../../res/shaders/textured.frag"),
            );
        let program = builder.build(gl)?;

        let mut bounds_builder = ShaderBuilder::new();
        bounds_builder
            .set_source(
                ShaderStage::Vertex,
                include_str!("../../res/shaders/bounds.vert"),
            )
            .set_source(
                ShaderStage::Fragment,
                include_str!("../../res/shaders/bounds.frag"),
            );
        let bounds_program = bounds_builder.build(gl)?;

        let texture = match texture_image {
            Some(image) => Some(
                image
                    .upload_texture(gl, glow::RGBA8 as i32, None)
                    .map_err(SceneError::Texture)?,
            ),
            None => None,
        };

        let mut mesh = load_obj(model_path)?;
        // Scanned once at load; only a geometry reload would change it.
        let bounds = compute_bounds(&mesh.vertices);
        info!(
            "Model bounds: min {:?}, max {:?}",
            bounds.0.coords.as_slice(),
            bounds.1.coords.as_slice()
        );
        mesh.upload(gl)?;

        let bounds_vao = unsafe { gl.create_vertex_array() }
            .map_err(|e| SceneError::Gfx(GfxError::Allocation(e)))?;

        Ok(Self {
            program,
            bounds_program,
            texture,
            mesh,
            bounds_vao,
            bounds,
        })
    }

    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        self.bounds
    }

    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.mesh.wireframe = wireframe;
    }

    pub fn draw(
        &mut self,
        gl: &glow::Context,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
        show_bounds: bool,
    ) -> Result<(), SceneError> {
        self.program.bind(gl);
        self.program.set_mat4(gl, "uProjectionMatrix", projection);
        self.program.set_mat4(gl, "uModelViewMatrix", view);

        if let Some(texture) = self.texture {
            unsafe {
                gl.active_texture(glow::TEXTURE0);
                gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            }
            self.program.set_int(gl, "uTexture0", 0);
        }

        self.mesh.draw(gl)?;

        if show_bounds {
            self.draw_bounds(gl, view, projection);
        }
        Ok(())
    }

    /// Outline pass: the 12 box edges are synthesized in the vertex shader
    /// from the two corner uniforms, so the draw binds no vertex data beyond
    /// an empty VAO.
    fn draw_bounds(&self, gl: &glow::Context, view: &Matrix4<f32>, projection: &Matrix4<f32>) {
        self.bounds_program.bind(gl);
        self.bounds_program
            .set_mat4(gl, "uProjectionMatrix", projection);
        self.bounds_program.set_mat4(gl, "uModelViewMatrix", view);
        self.bounds_program
            .set_vec3(gl, "uMin", &self.bounds.0.coords);
        self.bounds_program
            .set_vec3(gl, "uMax", &self.bounds.1.coords);

        unsafe {
            gl.polygon_mode(glow::FRONT_AND_BACK, glow::FILL);
            gl.bind_vertex_array(Some(self.bounds_vao));
            gl.draw_arrays_instanced(glow::LINES, 0, 2, BOX_EDGES);
            gl.bind_vertex_array(None);
        }
    }

    pub fn destroy(mut self, gl: &glow::Context) {
        self.mesh.destroy(gl);
        unsafe {
            gl.delete_vertex_array(self.bounds_vao);
            if let Some(texture) = self.texture {
                gl.delete_texture(texture);
            }
        }
        self.bounds_program.destroy(gl);
        self.program.destroy(gl);
    }
}

/// Component-wise min/max reduction over all vertex positions.
fn compute_bounds(vertices: &[Vertex]) -> (Point3<f32>, Point3<f32>) {
    if vertices.is_empty() {
        return (Point3::origin(), Point3::origin());
    }

    let mut min_bound = Point3::new(f32::MAX, f32::MAX, f32::MAX);
    let mut max_bound = Point3::new(f32::MIN, f32::MIN, f32::MIN);

    for vertex in vertices {
        min_bound.x = min_bound.x.min(vertex.position.x);
        min_bound.y = min_bound.y.min(vertex.position.y);
        min_bound.z = min_bound.z.min(vertex.position.z);

        max_bound.x = max_bound.x.max(vertex.position.x);
        max_bound.y = max_bound.y.max(vertex.position.y);
        max_bound.z = max_bound.z.max(vertex.position.z);
    }

    (min_bound, max_bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_all_positions() {
        let vertices = vec![
            Vertex::from_position(Point3::new(-1.0, 2.0, 0.5)),
            Vertex::from_position(Point3::new(3.0, -4.0, 0.0)),
            Vertex::from_position(Point3::new(0.0, 0.0, -2.5)),
        ];
        let (min_bound, max_bound) = compute_bounds(&vertices);
        assert_eq!(min_bound, Point3::new(-1.0, -4.0, -2.5));
        assert_eq!(max_bound, Point3::new(3.0, 2.0, 0.5));
    }

    #[test]
    fn empty_mesh_collapses_to_origin() {
        let (min_bound, max_bound) = compute_bounds(&[]);
        assert_eq!(min_bound, Point3::origin());
        assert_eq!(max_bound, Point3::origin());
    }
}
