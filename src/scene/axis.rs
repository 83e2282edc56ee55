use crate::core::geometry::Vertex;
use crate::gfx::mesh::{DrawMode, Mesh};
use crate::gfx::shader::{Program, ShaderBuilder, ShaderStage};
use crate::scene::SceneError;
use nalgebra::{Matrix4, Point3, Vector2, Vector3};

const EXTENT: f32 = 1e15;

/// World-axis gizmo: three colored line pairs through the origin, effectively
/// infinite in extent. The line color rides in the vertex normal slot.
pub struct Axis {
    program: Program,
    mesh: Mesh,
}

impl Axis {
    pub fn create(gl: &glow::Context) -> Result<Self, SceneError> {
        let mut builder = ShaderBuilder::new();
        builder
            .set_source(
                ShaderStage::Vertex,
                include_str!("../../res/shaders/flat_color.vert"),
            )
            .set_source(
                ShaderStage::Fragment,
                include_str!("../../res/shaders/flat_color.frag"),
            );
        let program = builder.build(gl)?;

        let red = Vector3::new(1.0, 0.0, 0.0);
        let green = Vector3::new(0.0, 1.0, 0.0);
        let blue = Vector3::new(0.0, 0.0, 1.0);
        let uv = Vector2::zeros();

        let vertices = vec![
            Vertex::new(Point3::origin(), red, uv),
            Vertex::new(Point3::new(EXTENT, 0.0, 0.0), red, uv),
            Vertex::new(Point3::new(-EXTENT, 0.0, 0.0), red, uv),
            Vertex::new(Point3::origin(), green, uv),
            Vertex::new(Point3::new(0.0, EXTENT, 0.0), green, uv),
            Vertex::new(Point3::new(0.0, -EXTENT, 0.0), green, uv),
            Vertex::new(Point3::origin(), blue, uv),
            Vertex::new(Point3::new(0.0, 0.0, EXTENT), blue, uv),
            Vertex::new(Point3::new(0.0, 0.0, -EXTENT), blue, uv),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 1,  0, 2,
            3, 4,  3, 5,
            6, 7,  6, 8,
        ];

        let mut mesh = Mesh::with_data(DrawMode::Lines, vertices, indices);
        mesh.upload(gl)?;

        Ok(Self { program, mesh })
    }

    pub fn draw(
        &mut self,
        gl: &glow::Context,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Result<(), SceneError> {
        self.program.bind(gl);
        self.program.set_mat4(gl, "uProjectionMatrix", projection);
        // Model is identity, so model-view is just the view.
        self.program.set_mat4(gl, "uModelViewMatrix", view);
        self.mesh.draw(gl)?;
        Ok(())
    }

    pub fn destroy(mut self, gl: &glow::Context) {
        self.mesh.destroy(gl);
        self.program.destroy(gl);
    }
}
