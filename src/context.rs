//! GPU resource creation.
//!
//! [`GpuContext`] is everything the importer needs from a graphics API: it
//! creates vertex/index buffers and textures and hands back opaque handles.
//! [`WgpuContext`] implements it on top of a `wgpu` device and queue.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        model::{ModelVertex, TextureRole},
        texture::Texture,
    },
    resources::options::WrapMode,
};

pub trait GpuContext {
    /// A vertex or index buffer, released on drop.
    type Buffer;
    /// A shared texture handle. Clones refer to the same GPU texture.
    type Texture: Clone;

    fn create_vertex_buffer(&self, label: &str, vertices: &[ModelVertex]) -> Self::Buffer;

    fn create_index_buffer(&self, label: &str, indices: &[u32]) -> Self::Buffer;

    /// Upload a decoded image for use in `role`, sampled with `wrap`.
    fn create_texture(
        &self,
        label: &str,
        image: &image::DynamicImage,
        role: TextureRole,
        wrap: WrapMode,
    ) -> anyhow::Result<Self::Texture>;
}

/// Textures bound in place of roles a mesh does not provide.
///
/// Created together with the context so no draw ever triggers resource creation.
#[derive(Debug)]
pub struct FallbackTextures {
    textures: [Texture; TextureRole::COUNT],
}

impl FallbackTextures {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let textures = TextureRole::ALL.map(|role| match role {
            TextureRole::Diffuse => {
                Texture::solid_color(device, queue, [255; 4], false, "fallback diffuse")
            }
            TextureRole::Specular => {
                Texture::solid_color(device, queue, [0, 0, 0, 255], true, "fallback specular")
            }
            // The blue/purple-ish colour that represents the default for normal maps
            TextureRole::Normal => {
                Texture::solid_color(device, queue, [127, 127, 255, 255], true, "fallback normal")
            }
            TextureRole::Height => {
                Texture::solid_color(device, queue, [0, 0, 0, 255], true, "fallback height")
            }
        });
        Self { textures }
    }

    pub fn get(&self, role: TextureRole) -> &Texture {
        &self.textures[role.slot() as usize]
    }
}

#[derive(Debug)]
pub struct WgpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub fallbacks: FallbackTextures,
}

impl WgpuContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let fallbacks = FallbackTextures::new(&device, &queue);
        Self {
            device,
            queue,
            fallbacks,
        }
    }
}

impl GpuContext for WgpuContext {
    type Buffer = wgpu::Buffer;
    type Texture = Texture;

    fn create_vertex_buffer(&self, label: &str, vertices: &[ModelVertex]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            })
    }

    fn create_index_buffer(&self, label: &str, indices: &[u32]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
    }

    fn create_texture(
        &self,
        label: &str,
        image: &image::DynamicImage,
        role: TextureRole,
        wrap: WrapMode,
    ) -> anyhow::Result<Texture> {
        Texture::from_image(&self.device, &self.queue, image, Some(label), !role.is_color(), wrap)
    }
}
