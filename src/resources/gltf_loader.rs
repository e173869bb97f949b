//! glTF 2.0 front-end (`.gltf` and `.glb`).
//!
//! Every primitive becomes one [`MeshData`], in mesh then primitive order, and
//! a node referencing a glTF mesh references all of that mesh's primitives.
//! A scene with several root nodes gets a synthetic root above them.

use std::{collections::HashSet, ops::Range, path::Path};

use ::gltf::{buffer, image::Source, mesh::Mode};

use crate::{
    data_structures::scene::{
        EmbeddedImage, MaterialData, MaterialTexture, MeshData, SceneData, SceneNode, SourceSlot,
    },
    error::ImportError,
};

pub fn parse_gltf(bytes: &[u8], path: &Path, base_directory: &Path) -> Result<SceneData, ImportError> {
    let ::gltf::Gltf { document, blob } =
        ::gltf::Gltf::from_slice(bytes).map_err(|e| ImportError::parse(path, e.to_string()))?;
    let buffers = ::gltf::import_buffers(&document, Some(base_directory), blob)
        .map_err(|e| ImportError::parse(path, format!("loading buffers: {e}")))?;

    let mut meshes = Vec::new();
    let mut primitives_of = Vec::new();
    for mesh in document.meshes() {
        let start = meshes.len();
        for primitive in mesh.primitives() {
            let data = read_primitive(&mesh, &primitive, &buffers)
                .map_err(|reason| ImportError::parse(path, reason))?;
            meshes.push(data);
        }
        primitives_of.push(start..meshes.len());
    }

    let materials = document
        .materials()
        .map(|material| read_material(&material, &buffers))
        .collect();

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| ImportError::parse(path, "the asset has no scene and thus no root node"))?;
    let mut visiting = HashSet::new();
    let mut roots = scene
        .nodes()
        .map(|node| to_scene_node(node, &primitives_of, &mut visiting))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|reason| ImportError::parse(path, reason))?;
    let root = if roots.len() == 1 {
        roots.remove(0)
    } else {
        SceneNode {
            name: scene.name().unwrap_or("scene").to_string(),
            meshes: Vec::new(),
            children: roots,
        }
    };

    Ok(SceneData {
        root,
        meshes,
        materials,
    })
}

fn to_scene_node(
    node: ::gltf::Node,
    primitives_of: &[Range<usize>],
    visiting: &mut HashSet<usize>,
) -> Result<SceneNode, String> {
    if !visiting.insert(node.index()) {
        return Err(format!("node {} is its own ancestor", node.index()));
    }
    let meshes = match node.mesh() {
        Some(mesh) => primitives_of
            .get(mesh.index())
            .cloned()
            .ok_or_else(|| format!("node {} references unknown mesh {}", node.index(), mesh.index()))?
            .collect(),
        None => Vec::new(),
    };
    let children = node
        .children()
        .map(|child| to_scene_node(child, primitives_of, visiting))
        .collect::<Result<Vec<_>, _>>()?;
    visiting.remove(&node.index());

    Ok(SceneNode {
        name: node.name().map_or_else(|| format!("node{}", node.index()), str::to_string),
        meshes,
        children,
    })
}

fn read_primitive(
    mesh: &::gltf::Mesh,
    primitive: &::gltf::Primitive,
    buffers: &[buffer::Data],
) -> Result<MeshData, String> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .map(Iterator::collect)
        .unwrap_or_default();
    let normals = reader.read_normals().map(Iterator::collect);
    // GLTF represents tangents as vec4 where the 4th elem is the bitangent sign
    let tangents = reader
        .read_tangents()
        .map(|tangents| tangents.map(|[x, y, z, _]| [x, y, z]).collect());
    let tex_coords = reader
        .read_tex_coords(0)
        .map(|tex_coords| tex_coords.into_f32().collect());
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let faces = triangulate(primitive.mode(), &indices)?;

    Ok(MeshData {
        name: mesh.name().unwrap_or("unknown_mesh").to_string(),
        positions,
        normals,
        tangents,
        tex_coords,
        faces,
        material: primitive.material().index(),
    })
}

/// Turns an index stream of the given topology into a triangle list.
fn triangulate(mode: Mode, indices: &[u32]) -> Result<Vec<[u32; 3]>, String> {
    match mode {
        Mode::Triangles => {
            if indices.len() % 3 != 0 {
                return Err(format!("{} indices do not form whole triangles", indices.len()));
            }
            Ok(indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
        }
        // every other strip triangle is flipped to keep the winding order
        Mode::TriangleStrip => Ok(indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| if i % 2 == 0 { [w[0], w[1], w[2]] } else { [w[1], w[0], w[2]] })
            .collect()),
        Mode::TriangleFan => Ok(match indices.split_first() {
            Some((&first, rest)) => rest.windows(2).map(|w| [first, w[0], w[1]]).collect(),
            None => Vec::new(),
        }),
        other => Err(format!("{other:?} primitives cannot be triangulated")),
    }
}

fn read_material(material: &::gltf::Material, buffers: &[buffer::Data]) -> MaterialData {
    let pbr = material.pbr_metallic_roughness();
    let mut textures = Vec::new();
    if let Some(info) = pbr.base_color_texture() {
        textures.push(material_texture(SourceSlot::Diffuse, info.texture(), buffers));
    }
    if let Some(info) = pbr.metallic_roughness_texture() {
        textures.push(material_texture(SourceSlot::MetallicRoughness, info.texture(), buffers));
    }
    if let Some(normal) = material.normal_texture() {
        textures.push(material_texture(SourceSlot::Normal, normal.texture(), buffers));
    }
    if let Some(occlusion) = material.occlusion_texture() {
        textures.push(material_texture(SourceSlot::Occlusion, occlusion.texture(), buffers));
    }
    if let Some(info) = material.emissive_texture() {
        textures.push(material_texture(SourceSlot::Emissive, info.texture(), buffers));
    }
    MaterialData {
        name: material.name().unwrap_or_default().to_string(),
        textures,
    }
}

fn material_texture(slot: SourceSlot, texture: ::gltf::Texture, buffers: &[buffer::Data]) -> MaterialTexture {
    let image = texture.source();
    match image.source() {
        Source::Uri { uri, mime_type } => uri_texture(slot, uri, mime_type),
        Source::View { view, mime_type } => {
            let range = view.offset()..view.offset() + view.length();
            let bytes = buffers
                .get(view.buffer().index())
                .and_then(|data| data.0.get(range))
                .map(<[u8]>::to_vec)
                .unwrap_or_default();
            MaterialTexture {
                slot,
                path: format!("*{}", image.index()),
                file: None,
                embedded: Some(EmbeddedImage {
                    bytes,
                    format: mime_type.split('/').last().map(str::to_string),
                }),
            }
        }
    }
}

/// Image referenced by URI. `data:` URIs carry the image inline; anything
/// else names a file, percent-encoded. The raw URI stays the cache key.
fn uri_texture(slot: SourceSlot, uri: &str, mime_type: Option<&str>) -> MaterialTexture {
    if let Some(data) = uri.strip_prefix("data:") {
        let (header, payload) = data.split_once(',').unwrap_or((data, ""));
        let bytes = if header.ends_with(";base64") {
            base64::decode(payload).unwrap_or_else(|e| {
                log::warn!("embedded image is not valid base64: {e}");
                Vec::new()
            })
        } else {
            urlencoding::decode_binary(payload.as_bytes()).into_owned()
        };
        let format = mime_type
            .unwrap_or(header)
            .split(';')
            .next()
            .and_then(|mime| mime.split('/').nth(1))
            .map(str::to_string);
        return MaterialTexture {
            slot,
            path: uri.to_string(),
            file: None,
            embedded: Some(EmbeddedImage { bytes, format }),
        };
    }

    let file = match urlencoding::decode(uri) {
        Ok(decoded) if decoded != uri => Some(decoded.into_owned()),
        Ok(_) => None,
        Err(e) => {
            log::warn!("image uri {uri:?} does not decode to utf-8: {e}");
            None
        }
    };
    MaterialTexture {
        slot,
        path: uri.to_string(),
        file,
        embedded: None,
    }
}
