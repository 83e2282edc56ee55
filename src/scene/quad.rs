use crate::gfx::builder::ImmediateBuilder;
use crate::gfx::mesh::DrawMode;
use crate::gfx::shader::{Program, ShaderBuilder, ShaderStage};
use crate::io::image::PixelBuffer;
use crate::scene::SceneError;
use glow::HasContext;
use nalgebra::{Matrix4, Point3, Vector2, Vector3};

/// A textured unit quad in the XY plane, built through the immediate-mode
/// geometry path.
pub struct TestQuad {
    program: Program,
    texture: glow::Texture,
    geometry: ImmediateBuilder,
}

impl TestQuad {
    pub fn create(gl: &glow::Context, texture_image: &PixelBuffer) -> Result<Self, SceneError> {
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

        let texture = texture_image
            .upload_texture(gl, glow::RGBA8 as i32, None)
            .map_err(SceneError::Texture)?;

        // Two triangles spanning [-1, 1]^2, facing +Z.
        let corners = [
            (Point3::new(-1.0, -1.0, 0.0), Vector2::new(0.0, 0.0)),
            (Point3::new(1.0, -1.0, 0.0), Vector2::new(1.0, 0.0)),
            (Point3::new(1.0, 1.0, 0.0), Vector2::new(1.0, 1.0)),
            (Point3::new(-1.0, 1.0, 0.0), Vector2::new(0.0, 1.0)),
        ];

        let mut geometry = ImmediateBuilder::new();
        geometry.begin(DrawMode::Triangles)?;
        geometry.set_normal(Vector3::new(0.0, 0.0, 1.0));
        for corner in [0, 1, 2, 3, 0, 2] {
            let (position, uv) = corners[corner];
            geometry.set_texcoord(uv);
            geometry.add_vertex(position)?;
        }
        geometry.end(gl)?;

        Ok(Self {
            program,
            texture,
            geometry,
        })
    }

    pub fn draw(
        &mut self,
        gl: &glow::Context,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Result<(), SceneError> {
        self.program.bind(gl);
        self.program.set_mat4(gl, "uProjectionMatrix", projection);
        self.program.set_mat4(gl, "uModelViewMatrix", view);

        unsafe {
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
        }
        self.program.set_int(gl, "uTexture0", 0);

        self.geometry.draw(gl)?;
        Ok(())
    }

    pub fn destroy(mut self, gl: &glow::Context) {
        self.geometry.destroy(gl);
        unsafe { gl.delete_texture(self.texture) };
        self.program.destroy(gl);
    }
}
