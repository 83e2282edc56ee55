use crate::core::geometry::Vertex;
use crate::gfx::mesh::{DrawMode, Mesh};
use log::{info, warn};
use nalgebra::{Point3, Vector2, Vector3};
use std::path::Path;

/// Mesh asset decoding failure; carries the parser's diagnostic.
#[derive(Debug, thiserror::Error)]
#[error("failed to load OBJ '{path}': {message}")]
pub struct ObjError {
    pub path: String,
    pub message: String,
}

/// Loads a wavefront OBJ file and returns a unified triangle [`Mesh`].
///
/// Sub-meshes are merged with offset indices. Faces with more than three
/// vertex references are triangulated by the parser. When the file carries
/// no normals they are synthesized from adjacent face normals.
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, ObjError> {
    let path = path.as_ref();
    info!("Loading OBJ file: {}", path.display());

    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true, // Unifies indices for Position/Normal/UV
        ..Default::default()
    };

    let (models, _materials) =
        tobj::load_obj(path, &load_options).map_err(|e| ObjError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    let mesh = mesh_from_models(models);
    info!(
        "OBJ loaded. Total vertices: {}, total indices: {}",
        mesh.vertices.len(),
        mesh.indices.len()
    );
    Ok(mesh)
}

/// Merges parsed models into one mesh, synthesizing normals if absent.
fn mesh_from_models(models: Vec<tobj::Model>) -> Mesh {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut index_offset = 0u32;
    let mut missing_normals = false;

    for model in models {
        let mesh = &model.mesh;
        let num_vertices = mesh.positions.len() / 3;

        let has_normals = !mesh.normals.is_empty();
        let has_texcoords = !mesh.texcoords.is_empty();
        if !has_normals {
            missing_normals = true;
            warn!(
                "Mesh '{}' has no normals; synthesizing from faces.",
                model.name
            );
        }

        for i in 0..num_vertices {
            let position = Point3::new(
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            );

            let normal = if has_normals {
                Vector3::new(
                    mesh.normals[i * 3],
                    mesh.normals[i * 3 + 1],
                    mesh.normals[i * 3 + 2],
                )
            } else {
                Vector3::zeros() // placeholder until synthesis below
            };

            let texcoord = if has_texcoords {
                Vector2::new(mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1])
            } else {
                Vector2::zeros()
            };

            vertices.push(Vertex::new(position, normal, texcoord));
        }

        // Offset indices by the vertices contributed by earlier sub-meshes.
        for index in &mesh.indices {
            indices.push(index + index_offset);
        }
        index_offset += num_vertices as u32;
    }

    if missing_normals {
        synthesize_normals(&mut vertices, &indices);
    }

    Mesh::with_data(DrawMode::Triangles, vertices, indices)
}

/// Computes per-vertex normals as the area-weighted average of adjacent face
/// normals (the unnormalized cross product carries the face area), then
/// renormalizes. Vertices touched by no face keep (0, 0, 1).
fn synthesize_normals(vertices: &mut [Vertex], indices: &[u32]) {
    let mut accumulated = vec![Vector3::<f32>::zeros(); vertices.len()];

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let ab = vertices[b].position - vertices[a].position;
        let ac = vertices[c].position - vertices[a].position;
        let face = ab.cross(&ac);
        accumulated[a] += face;
        accumulated[b] += face;
        accumulated[c] += face;
    }

    for (vertex, normal) in vertices.iter_mut().zip(accumulated) {
        vertex.normal = if normal.norm() > 1e-12 {
            normal.normalize()
        } else {
            Vector3::new(0.0, 0.0, 1.0)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    fn parse(source: &str) -> Mesh {
        let load_options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };
        let (models, _materials) = tobj::load_obj_buf(
            &mut BufReader::new(source.as_bytes()),
            &load_options,
            |_| Ok((Vec::new(), Default::default())),
        )
        .expect("test OBJ should parse");
        mesh_from_models(models)
    }

    #[test]
    fn triangle_without_normals_gets_synthesized_ones() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices.len(), 3);
        for v in &mesh.vertices {
            // CCW triangle in the XY plane faces +Z.
            assert!((v.normal - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
            assert!((v.normal.norm() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn shared_vertices_average_adjacent_faces() {
        // Two triangles folded along the Y axis: one in the XY plane (+Z),
        // one in the ZY plane (+X). The shared edge normals average.
        let mesh = parse(
            "v 0 0 0\nv 0 1 0\nv 1 0 0\nv 0 0 -1\nf 1 3 2\nf 1 4 2\n",
        );
        let folded = &mesh.vertices[0];
        assert!(folded.normal.x > 0.1);
        assert!(folded.normal.z > 0.1);
        assert!((folded.normal.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn provided_normals_are_kept() {
        let mesh = parse(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 1 0\nf 1//1 2//1 3//1\n",
        );
        for v in &mesh.vertices {
            assert!((v.normal - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-6);
        }
    }

    #[test]
    fn quad_face_is_triangulated() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n");
        assert_eq!(mesh.indices.len(), 6);
        assert_eq!(DrawMode::Triangles.primitive_count(mesh.indices.len(), 1), 2);
    }
}
