use nalgebra::{Point3, Vector2, Vector3};

/// Represents a single vertex in 3D space.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    /// Position in local object space.
    pub position: Point3<f32>,
    /// Normal vector (the flat gizmo shader reuses this slot as a color).
    pub normal: Vector3<f32>,
    /// Texture coordinates (UV).
    pub texcoord: Vector2<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, texcoord: Vector2<f32>) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }

    /// Creates a vertex from a position alone, with the default normal (0, 0, 1)
    /// and texture coordinate (0, 0).
    pub fn from_position(position: Point3<f32>) -> Self {
        Self {
            position,
            normal: Vector3::new(0.0, 0.0, 1.0),
            texcoord: Vector2::zeros(),
        }
    }
}
