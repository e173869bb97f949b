//! Draw submission.
//!
//! Meshes and models never talk to a render pass directly; they go through a
//! [`ShaderHandle`], which receives texture bindings by slot and indexed draws.
//! [`WgpuShader`] is the handle for a `wgpu` render pass whose pipeline uses
//! [`model_texture_layout`](crate::resources::texture::model_texture_layout)
//! for its material bind group.

use crate::{
    context::{FallbackTextures, GpuContext, WgpuContext},
    data_structures::{model::TextureRole, texture::Texture},
};

/// Where a texture is bound: the slot of its role, and which texture of that
/// role it is within the mesh (0 for the first).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureSlot {
    pub role: TextureRole,
    pub index: u32,
}

impl TextureSlot {
    pub fn slot(&self) -> u32 {
        self.role.slot()
    }
}

pub trait ShaderHandle<C: GpuContext + ?Sized> {
    fn bind_texture(&mut self, slot: TextureSlot, texture: &C::Texture);

    /// Draw `index_count` indices from `index_buffer` over `vertex_buffer`.
    ///
    /// Textures bound since the previous draw apply to this draw only.
    fn draw_indexed(&mut self, vertex_buffer: &C::Buffer, index_buffer: &C::Buffer, index_count: u32);

    /// Draw geometry only, e.g. for depth or shadow passes. No material is bound.
    fn draw_geometry(&mut self, vertex_buffer: &C::Buffer, index_buffer: &C::Buffer, index_count: u32) {
        self.draw_indexed(vertex_buffer, index_buffer, index_count);
    }
}

/// Records model draws into a `wgpu` render pass.
///
/// The pipeline must already be set on the pass. Each textured draw creates a
/// bind group at `group` holding one texture and sampler per role; roles the
/// mesh does not bind are filled from the context's fallback textures. Bind
/// groups are not cached, so every textured draw of every frame pays for one
/// `create_bind_group`. Geometry-only draws set no bind group at all.
pub struct WgpuShader<'a, 'pass> {
    device: &'a wgpu::Device,
    layout: &'a wgpu::BindGroupLayout,
    fallbacks: &'a FallbackTextures,
    render_pass: &'a mut wgpu::RenderPass<'pass>,
    group: u32,
    bound: [Option<Texture>; TextureRole::COUNT],
}

impl<'a, 'pass> WgpuShader<'a, 'pass> {
    pub fn new(
        context: &'a WgpuContext,
        layout: &'a wgpu::BindGroupLayout,
        render_pass: &'a mut wgpu::RenderPass<'pass>,
        group: u32,
    ) -> Self {
        Self {
            device: &context.device,
            layout,
            fallbacks: &context.fallbacks,
            render_pass,
            group,
            bound: Default::default(),
        }
    }

    fn submit(&mut self, vertex_buffer: &wgpu::Buffer, index_buffer: &wgpu::Buffer, index_count: u32) {
        self.render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.render_pass
            .set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.render_pass.draw_indexed(0..index_count, 0, 0..1);
    }

    fn material_bind_group(&self) -> wgpu::BindGroup {
        let textures = TextureRole::ALL
            .map(|role| self.bound[role.slot() as usize].as_ref().unwrap_or(self.fallbacks.get(role)));
        let entries: Vec<wgpu::BindGroupEntry> = textures
            .iter()
            .enumerate()
            .flat_map(|(slot, texture)| {
                let binding = 2 * slot as u32;
                [
                    wgpu::BindGroupEntry {
                        binding,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: binding + 1,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ]
            })
            .collect();
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: self.layout,
            entries: &entries,
            label: Some("model material bind group"),
        })
    }
}

impl ShaderHandle<WgpuContext> for WgpuShader<'_, '_> {
    fn bind_texture(&mut self, slot: TextureSlot, texture: &Texture) {
        if slot.index > 0 {
            log::trace!(
                "{:?} texture #{} ignored, the model layout has one texture per role",
                slot.role,
                slot.index
            );
            return;
        }
        self.bound[slot.slot() as usize] = Some(texture.clone());
    }

    fn draw_indexed(&mut self, vertex_buffer: &wgpu::Buffer, index_buffer: &wgpu::Buffer, index_count: u32) {
        if index_count == 0 {
            self.bound = Default::default();
            return;
        }
        let bind_group = self.material_bind_group();
        self.render_pass.set_bind_group(self.group, &bind_group, &[]);
        self.submit(vertex_buffer, index_buffer, index_count);
        self.bound = Default::default();
    }

    fn draw_geometry(&mut self, vertex_buffer: &wgpu::Buffer, index_buffer: &wgpu::Buffer, index_count: u32) {
        if index_count > 0 {
            self.submit(vertex_buffer, index_buffer, index_count);
        }
    }
}
