//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU GPU texture resources,
//! and helpers for decoding image files and uploading them, as well as the
//! single-colour fallback textures used for roles a mesh leaves unbound.

use anyhow::{Context as _, Result, anyhow, ensure};
use image::{
    GenericImageView, ImageFormat,
    imageops::{self, FilterType},
    load_from_memory_with_format,
};

use crate::resources::options::WrapMode;

/// A GPU texture with a view and sampler.
///
/// Cloning is cheap: clones refer to the same GPU texture, which is freed once
/// the last clone is dropped.
#[derive(Clone, Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// A 1x1 texture filled with one RGBA colour.
    ///
    /// `[127, 127, 255, 255]` in a linear texture is the flat tangent-space
    /// normal, i.e. no deformation.
    pub fn solid_color(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        linear: bool,
        label: &str,
    ) -> Texture {
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
        Self::upload(device, queue, &img, Some(label), linear, WrapMode::Repeat)
    }

    /// Upload a decoded image together with its full mip chain.
    ///
    /// # Arguments
    ///
    /// * `label` is used as a debug name for the GPU resource
    /// * `linear` toggles between sRGB (false) and linear (true) colour space;
    ///   specular, normal and height maps must be linear
    /// * `wrap` is the address mode of the sampler in both directions
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
        linear: bool,
        wrap: WrapMode,
    ) -> Result<Self> {
        let (width, height) = img.dimensions();
        let max = device.limits().max_texture_dimension_2d;
        ensure!(width > 0 && height > 0, "image has no pixels");
        ensure!(
            width <= max && height <= max,
            "image is {width}x{height} but the device allows at most {max}x{max}"
        );
        Ok(Self::upload(device, queue, &img.to_rgba8(), label, linear, wrap))
    }

    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &image::RgbaImage,
        label: Option<&str>,
        linear: bool,
        wrap: WrapMode,
    ) -> Self {
        let (width, height) = rgba.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let format = if linear {
            wgpu::TextureFormat::Rgba8Unorm
        } else {
            wgpu::TextureFormat::Rgba8UnormSrgb
        };
        let mip_level_count = mip_level_count(width, height);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for mip_level in 0..mip_level_count {
            // level 0 is the image itself, every further level halves the previous one
            let level = match mip_level {
                0 => None,
                _ => Some(imageops::resize(
                    rgba,
                    (width >> mip_level).max(1),
                    (height >> mip_level).max(1),
                    FilterType::Triangle,
                )),
            };
            let pixels = level.as_ref().unwrap_or(rgba);
            let (level_width, level_height) = pixels.dimensions();
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level,
                    origin: wgpu::Origin3d::ZERO,
                },
                pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level_width),
                    rows_per_image: Some(level_height),
                },
                wgpu::Extent3d {
                    width: level_width,
                    height: level_height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_default_sampler(device, wrap);

        Self {
            texture,
            view,
            sampler,
        }
    }
}

/// Number of levels down to 1x1, e.g. 4 for an 8x5 image.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    u32::BITS - width.max(height).max(1).leading_zeros()
}

/// Decode raw image file contents.
///
/// `format` is an optional hint: a file extension ("png") or the subtype of a
/// mime type ("image/png" is passed as "png"). Without it the format is guessed.
pub fn decode_image(bytes: &[u8], format: Option<&str>) -> Result<image::DynamicImage> {
    let img = match format {
        None => image::load_from_memory(bytes)?,
        Some(fmt) => {
            let format = ImageFormat::from_extension(fmt)
                .ok_or_else(|| anyhow!("unknown image format {fmt:?}"))?;
            load_from_memory_with_format(bytes, format)
                .with_context(|| format!("decoding {fmt} image"))?
        }
    };
    Ok(img)
}

pub fn create_default_sampler(device: &wgpu::Device, wrap: WrapMode) -> wgpu::Sampler {
    let address_mode = match wrap {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
    };
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_with_and_without_hint() {
        let bytes = png_bytes();
        assert_eq!(decode_image(&bytes, None).unwrap().dimensions(), (3, 2));
        assert_eq!(decode_image(&bytes, Some("png")).unwrap().dimensions(), (3, 2));
    }

    #[test]
    fn mip_chain_reaches_one_pixel() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(8, 5), 4);
        assert_eq!(mip_level_count(1024, 1), 11);
        assert_eq!(mip_level_count(0, 0), 1);
    }

    #[test]
    fn rejects_unknown_hint_and_garbage() {
        assert!(decode_image(&png_bytes(), Some("not-a-format")).is_err());
        assert!(decode_image(b"definitely not an image", None).is_err());
    }
}
