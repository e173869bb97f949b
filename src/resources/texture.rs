use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::data_structures::{
    model::TextureRole,
    scene::MaterialTexture,
    texture::decode_image,
};

/// Bind group layout of the material textures a [`WgpuShader`](crate::render::WgpuShader)
/// binds: for every role, the texture at `2 * slot` and its sampler at `2 * slot + 1`.
pub fn model_texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let entries: Vec<wgpu::BindGroupLayoutEntry> = TextureRole::ALL
        .iter()
        .flat_map(|role| {
            let binding = 2 * role.slot();
            [
                wgpu::BindGroupLayoutEntry {
                    binding,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: binding + 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ]
        })
        .collect();
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some("Model texture_bind_group_layout"),
    })
}

pub fn load_binary(path: &Path) -> std::io::Result<Vec<u8>> {
    std::fs::read(path)
}

/// `relative` joined onto `base_directory`. Backslashes from Windows exporters are
/// read as separators.
pub fn resolve_texture_path(base_directory: &Path, relative: &str) -> PathBuf {
    let relative = relative.replace('\\', "/");
    base_directory.join(relative)
}

/// Reads and decodes the image behind a material texture: embedded bytes as they
/// are, files relative to `base_directory`.
pub fn load_texture_image(
    base_directory: &Path,
    texture: &MaterialTexture,
) -> anyhow::Result<image::DynamicImage> {
    match &texture.embedded {
        Some(embedded) => decode_image(&embedded.bytes, embedded.format.as_deref()),
        None => {
            let path = resolve_texture_path(base_directory, texture.file_name());
            let data = load_binary(&path).with_context(|| format!("reading {}", path.display()))?;
            decode_image(&data, None).with_context(|| format!("decoding {}", path.display()))
        }
    }
}
