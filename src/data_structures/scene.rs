//! Owned copy of a parsed asset.
//!
//! Format front-ends copy everything the importer needs out of the parser's
//! own structures into these types, so nothing borrowed from the parser
//! outlives the parse. The importer only ever sees a [`SceneData`].

/// A node of the scene graph. `meshes` index into [`SceneData::meshes`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub meshes: Vec<usize>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_meshes(mut self, meshes: impl IntoIterator<Item = usize>) -> Self {
        self.meshes.extend(meshes);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Mesh references of this node and all descendants, in pre-order.
    pub fn mesh_refs(&self) -> Vec<usize> {
        let mut refs = self.meshes.clone();
        for child in &self.children {
            refs.extend(child.mesh_refs());
        }
        refs
    }
}

/// Triangulated geometry of one mesh. Attribute streams are indexed like `positions`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tangents: Option<Vec<[f32; 3]>>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub faces: Vec<[u32; 3]>,
    pub material: Option<usize>,
}

/// Texture slot as named by the source format, before the slot convention
/// maps it to a [`TextureRole`](super::model::TextureRole).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceSlot {
    Diffuse,
    Specular,
    Ambient,
    Normal,
    Height,
    Displacement,
    Shininess,
    Opacity,
    Emissive,
    Occlusion,
    MetallicRoughness,
}

/// Image bytes stored inside the asset itself (e.g. a glTF buffer view).
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddedImage {
    pub bytes: Vec<u8>,
    /// Extension-like format hint ("png", "jpeg"), if the asset declares one.
    pub format: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialTexture {
    pub slot: SourceSlot,
    /// Path relative to the asset, or `*<n>` for embedded image `n`. Used verbatim as cache key.
    pub path: String,
    /// File to read when it is spelled differently from `path`, e.g. a
    /// percent-decoded URI.
    pub file: Option<String>,
    pub embedded: Option<EmbeddedImage>,
}

impl MaterialTexture {
    pub fn file(slot: SourceSlot, path: impl Into<String>) -> Self {
        Self {
            slot,
            path: path.into(),
            file: None,
            embedded: None,
        }
    }

    /// Name of the file behind this texture, relative to the asset.
    pub fn file_name(&self) -> &str {
        self.file.as_deref().unwrap_or(&self.path)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub textures: Vec<MaterialTexture>,
}

impl MaterialData {
    /// Textures in `slot`, in declaration order.
    pub fn textures_in(&self, slot: SourceSlot) -> impl Iterator<Item = &MaterialTexture> {
        self.textures.iter().filter(move |t| t.slot == slot)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneData {
    pub root: SceneNode,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
}
