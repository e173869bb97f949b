//! Wavefront OBJ front-end.
//!
//! OBJ has no node hierarchy: the root gets one child node per object/group,
//! each referencing the single mesh `tobj` produced for it. Faces are
//! triangulated by `tobj`; tangents are never present in OBJ files.

use std::{
    io::{BufReader, Cursor},
    path::Path,
};

use crate::{
    data_structures::scene::{MaterialData, MaterialTexture, MeshData, SceneData, SceneNode, SourceSlot},
    error::ImportError,
    resources::texture::{load_binary, resolve_texture_path},
};

pub fn parse_obj(bytes: &[u8], path: &Path, base_directory: &Path) -> Result<SceneData, ImportError> {
    let mut obj_reader = BufReader::new(Cursor::new(bytes));
    let (models, obj_materials) = tobj::load_obj_buf(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| {
            let mtl_path = resolve_texture_path(base_directory, &p.to_string_lossy());
            match load_binary(&mtl_path) {
                Ok(mtl) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mtl))),
                Err(e) => {
                    log::warn!("material library {} could not be read: {e}", mtl_path.display());
                    Err(tobj::LoadError::OpenFileFailed)
                }
            }
        },
    )
    .map_err(|e| ImportError::parse(path, e.to_string()))?;

    // A broken material library leaves the geometry usable, just untextured.
    let obj_materials = obj_materials.unwrap_or_else(|e| {
        log::warn!("materials of {} ignored: {e}", path.display());
        Vec::new()
    });

    let meshes = models
        .iter()
        .map(read_mesh)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|reason| ImportError::parse(path, reason))?;
    let root = SceneNode {
        name: path
            .file_name()
            .map_or_else(String::new, |name| name.to_string_lossy().into_owned()),
        meshes: Vec::new(),
        children: models
            .iter()
            .enumerate()
            .map(|(i, model)| SceneNode::new(model.name.as_str()).with_meshes([i]))
            .collect(),
    };

    Ok(SceneData {
        root,
        meshes,
        materials: obj_materials.iter().map(read_material).collect(),
    })
}

fn read_mesh(model: &tobj::Model) -> Result<MeshData, String> {
    let mesh = &model.mesh;
    if mesh.indices.len() % 3 != 0 {
        return Err(format!(
            "object {:?} has {} indices after triangulation",
            model.name,
            mesh.indices.len()
        ));
    }
    let positions = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    let normals = (!mesh.normals.is_empty()).then(|| {
        mesh.normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect()
    });
    let tex_coords = (!mesh.texcoords.is_empty())
        .then(|| mesh.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]).collect());

    Ok(MeshData {
        name: model.name.clone(),
        positions,
        normals,
        tangents: None,
        tex_coords,
        faces: mesh
            .indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect(),
        material: mesh.material_id,
    })
}

/// `map_Bump`/`bump` land in the height slot, `norm` in the normal slot.
fn read_material(material: &tobj::Material) -> MaterialData {
    let mut textures = Vec::new();
    let mut push = |slot, path: Option<&String>| {
        if let Some(path) = path {
            textures.push(MaterialTexture::file(slot, path.as_str()));
        }
    };
    push(SourceSlot::Diffuse, material.diffuse_texture.as_ref());
    push(SourceSlot::Specular, material.specular_texture.as_ref());
    push(SourceSlot::Ambient, material.ambient_texture.as_ref());
    push(SourceSlot::Height, material.normal_texture.as_ref());
    push(SourceSlot::Shininess, material.shininess_texture.as_ref());
    push(SourceSlot::Opacity, material.dissolve_texture.as_ref());
    push(SourceSlot::Normal, material.unknown_param.get("norm"));
    push(SourceSlot::Displacement, material.unknown_param.get("disp"));

    MaterialData {
        name: material.name.clone(),
        textures,
    }
}
