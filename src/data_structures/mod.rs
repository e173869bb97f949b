//! Engine data structures: models, textures and scene graphs.
//!
//! - `model` contains vertices, meshes, texture bindings and the model that owns them
//! - `texture` contains the GPU texture wrapper and image decoding
//! - `scene` holds the owned scene graph the format front-ends produce

pub mod model;
pub mod scene;
pub mod texture;
