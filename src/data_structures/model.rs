//! Renderable model data: vertices, meshes, texture bindings and the model
//! that owns them.
//!
//! A [`Model`] is built once by the importer in [`crate::resources`] and is
//! read-only afterwards. Every GPU resource it references is owned by it (or
//! shared between its own meshes) and released when it is dropped.

use std::path::{Path, PathBuf};

use crate::{
    context::GpuContext,
    error::{ImportError, TextureLoadError},
    data_structures::scene::SceneData,
    render::{ShaderHandle, TextureSlot},
    resources::{
        self, importer::import_scene, options::ImportOptions, texture_cache::TextureCache,
    },
};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// One vertex as laid out in the vertex buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl ModelVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x3,
        3 => Float32x2
    ];
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Semantic purpose of a texture as consumed by shading.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureRole {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureRole {
    pub const COUNT: usize = 4;
    pub const ALL: [TextureRole; Self::COUNT] = [
        TextureRole::Diffuse,
        TextureRole::Specular,
        TextureRole::Normal,
        TextureRole::Height,
    ];

    /// Shader slot the role is bound to. Fixed per role, shared by every mesh.
    pub const fn slot(self) -> u32 {
        match self {
            TextureRole::Diffuse => 0,
            TextureRole::Specular => 1,
            TextureRole::Normal => 2,
            TextureRole::Height => 3,
        }
    }

    /// Colour textures are sampled as sRGB, data textures (specular
    /// intensity, normals, heights) as linear.
    pub const fn is_color(self) -> bool {
        matches!(self, TextureRole::Diffuse)
    }
}

/// A GPU texture handle bound to a role, together with the path it was loaded from.
#[derive(Clone, Debug)]
pub struct TextureBinding<T> {
    pub handle: T,
    pub role: TextureRole,
    /// Path as written in the asset; also the texture cache key.
    pub source_path: String,
}

/// One mesh of a model: geometry uploaded to the GPU plus its texture bindings.
pub struct Mesh<C: GpuContext> {
    pub name: String,
    vertices: Vec<ModelVertex>,
    indices: Vec<u32>,
    textures: Vec<TextureBinding<C::Texture>>,
    vertex_buffer: C::Buffer,
    index_buffer: C::Buffer,
}

impl<C: GpuContext> Mesh<C> {
    /// Uploads the vertex and index buffers. Fails if an index points past the vertex list.
    pub fn new(
        context: &C,
        name: impl Into<String>,
        vertices: Vec<ModelVertex>,
        indices: Vec<u32>,
        textures: Vec<TextureBinding<C::Texture>>,
    ) -> anyhow::Result<Self> {
        let name = name.into();
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            anyhow::bail!(
                "mesh {name:?} references vertex {bad} but only has {} vertices",
                vertices.len()
            );
        }
        let vertex_buffer =
            context.create_vertex_buffer(&format!("{name:?} Vertex Buffer"), &vertices);
        let index_buffer = context.create_index_buffer(&format!("{name:?} Index Buffer"), &indices);
        Ok(Self {
            name,
            vertices,
            indices,
            textures,
            vertex_buffer,
            index_buffer,
        })
    }

    pub fn vertices(&self) -> &[ModelVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn textures(&self) -> &[TextureBinding<C::Texture>] {
        &self.textures
    }

    pub fn num_elements(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Binds every texture to the slot of its role and issues one indexed draw.
    ///
    /// Several textures with the same role are told apart by `TextureSlot::index`,
    /// counted in binding order.
    pub fn draw<S>(&self, shader: &mut S)
    where
        S: ShaderHandle<C> + ?Sized,
    {
        let mut seen = [0u32; TextureRole::COUNT];
        for binding in &self.textures {
            let index = &mut seen[binding.role.slot() as usize];
            shader.bind_texture(
                TextureSlot {
                    role: binding.role,
                    index: *index,
                },
                &binding.handle,
            );
            *index += 1;
        }
        shader.draw_indexed(&self.vertex_buffer, &self.index_buffer, self.num_elements());
    }

    /// Draws the geometry without touching texture bindings (depth-only passes).
    pub fn draw_geometry<S>(&self, shader: &mut S)
    where
        S: ShaderHandle<C> + ?Sized,
    {
        shader.draw_geometry(&self.vertex_buffer, &self.index_buffer, self.num_elements());
    }
}

/// An imported asset: its meshes in scene-graph pre-order and the textures they share.
pub struct Model<C: GpuContext> {
    pub(crate) meshes: Vec<Mesh<C>>,
    pub(crate) texture_cache: TextureCache<C::Texture>,
    pub(crate) base_directory: PathBuf,
    pub(crate) diagnostics: Vec<TextureLoadError>,
}

impl<C: GpuContext> Model<C> {
    /// Imports the asset at `path` with [`ImportOptions::default`].
    pub fn load(path: impl AsRef<Path>, context: &C) -> Result<Self, ImportError> {
        resources::load_model(path, context, &ImportOptions::default())
    }

    pub fn load_with_options(
        path: impl AsRef<Path>,
        context: &C,
        options: &ImportOptions,
    ) -> Result<Self, ImportError> {
        resources::load_model(path, context, options)
    }

    /// Builds a model from a scene that was parsed elsewhere. Texture paths
    /// resolve against `base_directory`.
    pub fn from_scene(
        scene: &SceneData,
        base_directory: impl Into<PathBuf>,
        context: &C,
        options: &ImportOptions,
    ) -> Result<Self, ImportError> {
        let base_directory = base_directory.into();
        let origin = base_directory.clone();
        import_scene(scene, &origin, base_directory, context, options)
    }

    /// Draws every mesh in import order.
    pub fn draw<S>(&self, shader: &mut S)
    where
        S: ShaderHandle<C> + ?Sized,
    {
        for mesh in &self.meshes {
            mesh.draw(shader);
        }
    }

    pub fn draw_geometry<S>(&self, shader: &mut S)
    where
        S: ShaderHandle<C> + ?Sized,
    {
        for mesh in &self.meshes {
            mesh.draw_geometry(shader);
        }
    }

    pub fn meshes(&self) -> &[Mesh<C>] {
        &self.meshes
    }

    pub fn texture_cache(&self) -> &TextureCache<C::Texture> {
        &self.texture_cache
    }

    /// Directory every relative texture path of this asset is resolved against.
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Textures that were referenced but could not be loaded.
    pub fn diagnostics(&self) -> &[TextureLoadError] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn vertex_layout_matches_struct() {
        let desc = ModelVertex::desc();
        assert_eq!(desc.array_stride, 44);
        assert_eq!(desc.attributes.len(), 4);
        assert_eq!(desc.attributes[3].offset, 36);
        assert_eq!(bytemuck::bytes_of(&ModelVertex::default()).len(), 44);
    }

    #[test]
    fn role_slots_are_distinct() {
        let slots: HashSet<u32> = TextureRole::ALL.iter().map(|r| r.slot()).collect();
        assert_eq!(slots.len(), TextureRole::COUNT);
        assert!(slots.iter().all(|&slot| slot < TextureRole::COUNT as u32));
        assert!(TextureRole::Diffuse.is_color());
        assert!(!TextureRole::Specular.is_color());
        assert!(!TextureRole::Normal.is_color());
    }
}
