use cgmath::InnerSpace;

use crate::{
    data_structures::{model::ModelVertex, scene::MeshData},
    resources::options::ImportOptions,
};

/// Below this the UV mapping of a triangle is treated as degenerate.
const MIN_UV_AREA: f32 = 1e-12;

/**
 * Assembles the vertex list of a mesh: vertex `i` takes position, normal, tangent and
 * first UV channel at index `i`. Missing normals/UVs are zero, missing tangents are
 * generated from the triangles when the options ask for it and zero otherwise.
 *
 * Attribute stream lengths must already have been checked against `positions`.
 */
pub fn build_vertices(mesh: &MeshData, indices: &[u32], options: &ImportOptions) -> Vec<ModelVertex> {
    let mut vertices = mesh
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| {
            let tex_coords = mesh.tex_coords.as_ref().map_or([0.0; 2], |uvs| {
                let [u, v] = uvs[i];
                if options.flip_uvs { [u, 1.0 - v] } else { [u, v] }
            });
            ModelVertex {
                position,
                normal: mesh.normals.as_ref().map_or([0.0; 3], |n| n[i]),
                tangent: mesh.tangents.as_ref().map_or([0.0; 3], |t| t[i]),
                tex_coords,
            }
        })
        .collect::<Vec<_>>();

    if mesh.tangents.is_none() && mesh.tex_coords.is_some() && options.generate_tangents {
        compute_tangents(&mut vertices, indices);
    }
    vertices
}

/**
 * Obj files (and glTF files without a TANGENT attribute) don't come with tangents so
 * they have to be calculated for normal maps to work correctly.
 *
 * Each triangle's tangent is added to its three vertices and the sum is averaged and
 * normalised. Triangles with a degenerate UV mapping contribute nothing; vertices
 * without any contribution keep a zero tangent.
 */
pub fn compute_tangents(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut triangles_included = vec![0u32; vertices.len()];

    for c in indices.chunks_exact(3) {
        let v0 = vertices[c[0] as usize];
        let v1 = vertices[c[1] as usize];
        let v2 = vertices[c[2] as usize];

        let pos0: cgmath::Vector3<_> = v0.position.into();
        let pos1: cgmath::Vector3<_> = v1.position.into();
        let pos2: cgmath::Vector3<_> = v2.position.into();

        let uv0: cgmath::Vector2<_> = v0.tex_coords.into();
        let uv1: cgmath::Vector2<_> = v1.tex_coords.into();
        let uv2: cgmath::Vector2<_> = v2.tex_coords.into();

        // Calculate the edges of the triangle
        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // Solving
        //     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        // for T.
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < MIN_UV_AREA {
            continue;
        }
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) / det;

        for &i in c {
            let v = &mut vertices[i as usize];
            v.tangent = (tangent + cgmath::Vector3::from(v.tangent)).into();
            triangles_included[i as usize] += 1;
        }
    }

    for (v, n) in vertices.iter_mut().zip(triangles_included) {
        if n == 0 {
            v.tangent = [0.0; 3];
            continue;
        }
        let tangent = cgmath::Vector3::from(v.tangent) / n as f32;
        v.tangent = if tangent.magnitude2() > 0.0 {
            tangent.normalize().into()
        } else {
            [0.0; 3]
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshData {
        MeshData {
            name: "quad".into(),
            positions: vec![
                [0.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [2.0, 2.0, 0.0],
                [0.0, 2.0, 0.0],
            ],
            normals: Some(vec![[0.0, 0.0, 1.0]; 4]),
            tangents: None,
            tex_coords: Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
            faces: vec![[0, 1, 2], [0, 2, 3]],
            material: None,
        }
    }

    fn indices(mesh: &MeshData) -> Vec<u32> {
        mesh.faces.iter().flatten().copied().collect()
    }

    #[test]
    fn generated_tangents_follow_u_axis() {
        let mesh = quad();
        let vertices = build_vertices(&mesh, &indices(&mesh), &ImportOptions::default());
        for v in &vertices {
            assert!((v.tangent[0] - 1.0).abs() < 1e-5, "{:?}", v.tangent);
            assert!(v.tangent[1].abs() < 1e-5);
            assert!(v.tangent[2].abs() < 1e-5);
        }
    }

    #[test]
    fn source_tangents_win_over_generation() {
        let mut mesh = quad();
        mesh.tangents = Some(vec![[0.0, 1.0, 0.0]; 4]);
        let vertices = build_vertices(&mesh, &indices(&mesh), &ImportOptions::default());
        assert!(vertices.iter().all(|v| v.tangent == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn missing_uvs_give_zero_uvs_and_tangents() {
        let mut mesh = quad();
        mesh.tex_coords = None;
        let vertices = build_vertices(&mesh, &indices(&mesh), &ImportOptions::default());
        assert!(vertices.iter().all(|v| v.tex_coords == [0.0, 0.0]));
        assert!(vertices.iter().all(|v| v.tangent == [0.0; 3]));
    }

    #[test]
    fn degenerate_uvs_and_unreferenced_vertices_stay_zero() {
        let mut mesh = quad();
        mesh.tex_coords = Some(vec![[0.5, 0.5]; 4]);
        mesh.positions.push([9.0, 9.0, 9.0]);
        mesh.normals = None;
        mesh.tex_coords.as_mut().unwrap().push([0.0, 1.0]);
        let vertices = build_vertices(&mesh, &indices(&mesh), &ImportOptions::default());
        assert_eq!(vertices.len(), 5);
        assert!(vertices.iter().all(|v| v.tangent == [0.0; 3]));
        assert!(vertices.iter().all(|v| v.tangent.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn flip_uvs_mirrors_v() {
        let mesh = quad();
        let options = ImportOptions {
            flip_uvs: true,
            generate_tangents: false,
            ..Default::default()
        };
        let vertices = build_vertices(&mesh, &indices(&mesh), &options);
        assert_eq!(vertices[0].tex_coords, [0.0, 1.0]);
        assert_eq!(vertices[2].tex_coords, [1.0, 0.0]);
        assert!(vertices.iter().all(|v| v.tangent == [0.0; 3]));
    }
}
