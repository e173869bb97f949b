//! Scene-graph flattening.
//!
//! The importer walks a [`SceneData`] in pre-order (a node's meshes in array
//! order, then its children in order) and turns every mesh reference into one
//! [`Mesh`], resolving the mesh's material into texture bindings through the
//! model's [`TextureCache`]. The resulting mesh order is the model's draw order.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    context::GpuContext,
    data_structures::{
        model::{Mesh, Model, TextureBinding, TextureRole},
        scene::{MaterialData, MaterialTexture, MeshData, SceneData, SceneNode},
    },
    error::{ImportError, TextureLoadError},
    resources::{
        mesh::build_vertices, options::ImportOptions, texture::load_texture_image,
        texture_cache::TextureCache,
    },
};

/// Builds a [`Model`] from an already parsed scene.
///
/// `origin` names the asset in error messages; texture paths resolve against
/// `base_directory`. Either every mesh is built or an error is returned and
/// everything uploaded so far is dropped again.
pub fn import_scene<C: GpuContext>(
    scene: &SceneData,
    origin: &Path,
    base_directory: PathBuf,
    context: &C,
    options: &ImportOptions,
) -> Result<Model<C>, ImportError> {
    let mut importer = SceneImporter {
        context,
        options,
        origin,
        base_directory,
        cache: TextureCache::new(),
        failed: HashMap::new(),
        diagnostics: Vec::new(),
        meshes: Vec::new(),
    };
    importer.process_node(&scene.root, scene)?;

    log::info!(
        "imported {}: {} meshes, {} textures, {} texture diagnostics",
        origin.display(),
        importer.meshes.len(),
        importer.cache.len(),
        importer.diagnostics.len()
    );
    Ok(Model {
        meshes: importer.meshes,
        texture_cache: importer.cache,
        base_directory: importer.base_directory,
        diagnostics: importer.diagnostics,
    })
}

struct SceneImporter<'a, C: GpuContext> {
    context: &'a C,
    options: &'a ImportOptions,
    origin: &'a Path,
    base_directory: PathBuf,
    cache: TextureCache<C::Texture>,
    /// Paths that failed to load, with the reason, so they are not read again.
    failed: HashMap<String, String>,
    diagnostics: Vec<TextureLoadError>,
    meshes: Vec<Mesh<C>>,
}

impl<C: GpuContext> SceneImporter<'_, C> {
    fn process_node(&mut self, node: &SceneNode, scene: &SceneData) -> Result<(), ImportError> {
        for &mesh_index in &node.meshes {
            let data = scene.meshes.get(mesh_index).ok_or_else(|| {
                ImportError::parse(
                    self.origin,
                    format!(
                        "node {:?} references mesh {mesh_index}, the scene has {}",
                        node.name,
                        scene.meshes.len()
                    ),
                )
            })?;
            let mesh = self.process_mesh(data, scene)?;
            self.meshes.push(mesh);
        }
        for child in &node.children {
            self.process_node(child, scene)?;
        }
        Ok(())
    }

    fn process_mesh(&mut self, data: &MeshData, scene: &SceneData) -> Result<Mesh<C>, ImportError> {
        let vertex_count = data.positions.len();
        self.check_stream(data, "normal", data.normals.as_ref().map(Vec::len))?;
        self.check_stream(data, "tangent", data.tangents.as_ref().map(Vec::len))?;
        self.check_stream(data, "uv", data.tex_coords.as_ref().map(Vec::len))?;

        let indices: Vec<u32> = data.faces.iter().flatten().copied().collect();
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(ImportError::parse(
                self.origin,
                format!(
                    "mesh {:?} has index {bad} but only {vertex_count} vertices",
                    data.name
                ),
            ));
        }
        let vertices = build_vertices(data, &indices, self.options);

        let textures = match data.material.and_then(|i| scene.materials.get(i)) {
            Some(material) => self.load_material_textures(material),
            None => {
                if let Some(i) = data.material {
                    log::debug!("mesh {:?} references unknown material {i}", data.name);
                }
                Vec::new()
            }
        };

        log::debug!(
            "mesh #{} {:?}: {} vertices, {} indices, {} textures",
            self.meshes.len(),
            data.name,
            vertices.len(),
            indices.len(),
            textures.len()
        );
        Mesh::new(self.context, data.name.as_str(), vertices, indices, textures)
            .map_err(|e| ImportError::parse(self.origin, format!("{e:#}")))
    }

    fn check_stream(
        &self,
        data: &MeshData,
        attribute: &str,
        len: Option<usize>,
    ) -> Result<(), ImportError> {
        match len {
            Some(len) if len != data.positions.len() => Err(ImportError::parse(
                self.origin,
                format!(
                    "mesh {:?} has {len} {attribute} values for {} vertices",
                    data.name,
                    data.positions.len()
                ),
            )),
            _ => Ok(()),
        }
    }

    /// Bindings for every role of the slot convention, in convention order.
    fn load_material_textures(&mut self, material: &MaterialData) -> Vec<TextureBinding<C::Texture>> {
        let options = self.options;
        let mesh = self.meshes.len();
        let mut textures = Vec::new();
        for &(slot, role) in options.convention.mapping() {
            for texture in material.textures_in(slot) {
                match self.load_texture(texture, role) {
                    Ok(handle) => textures.push(TextureBinding {
                        handle,
                        role,
                        source_path: texture.path.clone(),
                    }),
                    Err(reason) => {
                        let error = TextureLoadError {
                            mesh,
                            role,
                            path: texture.path.clone(),
                            reason,
                        };
                        log::warn!("{error}");
                        self.diagnostics.push(error);
                    }
                }
            }
        }
        textures
    }

    fn load_texture(&mut self, texture: &MaterialTexture, role: TextureRole) -> Result<C::Texture, String> {
        if let Some(reason) = self.failed.get(&texture.path) {
            return Err(reason.clone());
        }
        let context = self.context;
        let wrap = self.options.wrap;
        let base_directory = &self.base_directory;
        let loaded = self.cache.get_or_try_insert_with(&texture.path, || {
            let image = load_texture_image(base_directory, texture)?;
            log::debug!("uploading texture {:?} for {role:?}", texture.path);
            context.create_texture(&texture.path, &image, role, wrap)
        });
        loaded.map_err(|e| {
            let reason = format!("{e:#}");
            self.failed.insert(texture.path.clone(), reason.clone());
            reason
        })
    }
}
