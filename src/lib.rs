//! scene-import
//!
//! Asset import and GPU resource caching for wgpu renderers. A 3D asset
//! (glTF 2.0 or Wavefront OBJ) is parsed into an owned scene graph, flattened
//! in pre-order into meshes, and its textures are uploaded once per distinct
//! path. The resulting [`Model`] draws itself with a single call.
//!
//! High-level modules
//! - `context`: the [`GpuContext`] resource-creation seam and its wgpu implementation
//! - `data_structures`: models, meshes, vertices, textures and the owned scene graph
//! - `error`: fatal import errors and non-fatal texture diagnostics
//! - `render`: the [`ShaderHandle`] draw seam and its wgpu implementation
//! - `resources`: format front-ends, the importer, the texture cache and import options
//!
//! ```no_run
//! # fn frame(context: &scene_import::WgpuContext, pass: &mut wgpu::RenderPass<'_>) -> Result<(), scene_import::ImportError> {
//! use scene_import::{Model, WgpuShader, resources::texture::model_texture_layout};
//!
//! let model = Model::load("assets/hut/hut.obj", context)?;
//! let layout = model_texture_layout(&context.device);
//! model.draw(&mut WgpuShader::new(context, &layout, pass, 0));
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod data_structures;
pub mod error;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use context::{GpuContext, WgpuContext};
pub use data_structures::model::{Mesh, Model, ModelVertex, TextureBinding, TextureRole};
pub use error::{ImportError, TextureLoadError};
pub use render::{ShaderHandle, TextureSlot, WgpuShader};
pub use resources::options::{ImportOptions, SlotConvention, WrapMode};
