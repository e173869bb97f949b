use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use crate::{
    context::GpuContext,
    data_structures::{model::Model, scene::SceneData},
    error::ImportError,
    resources::{importer::import_scene, options::ImportOptions, texture::load_binary},
};

/**
 * This module contains all logic for loading meshes/textures/etc. from external files.
 */
pub mod gltf_loader;
pub mod importer;
pub mod mesh;
pub mod obj_loader;
pub mod options;
pub mod texture;
pub mod texture_cache;

/// Imports the asset at `path` into a [`Model`], uploading through `context`.
///
/// Blocks until every mesh and texture is uploaded. Fails with
/// [`ImportError::FileOpen`] if the file cannot be read and with
/// [`ImportError::Parse`] if it cannot be turned into a scene; textures that
/// fail to load only end up in [`Model::diagnostics`].
pub fn load_model<C: GpuContext>(
    path: impl AsRef<Path>,
    context: &C,
    options: &ImportOptions,
) -> Result<Model<C>, ImportError> {
    let path = path.as_ref();
    let bytes = load_binary(path).map_err(|source| ImportError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let base_directory = base_directory(path);
    let scene = parse_scene(path, &bytes, &base_directory)?;
    import_scene(&scene, path, base_directory, context, options)
}

/// Runs the front-end matching the file extension over the asset's bytes.
pub fn parse_scene(path: &Path, bytes: &[u8], base_directory: &Path) -> Result<SceneData, ImportError> {
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("gltf" | "glb") => gltf_loader::parse_gltf(bytes, path, base_directory),
        Some("obj") => obj_loader::parse_obj(bytes, path, base_directory),
        Some(other) => Err(ImportError::parse(path, format!("unsupported asset format .{other}"))),
        None => Err(ImportError::parse(path, "asset has no file extension")),
    }
}

/// Directory part of `path`; `.` for a bare file name.
pub fn base_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
