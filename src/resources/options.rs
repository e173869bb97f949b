//! Import configuration.

use crate::data_structures::{model::TextureRole, scene::SourceSlot};

/// Which source slots are queried, in which order, and the role each becomes.
///
/// Asset packs disagree on where tangent-space normal maps live: OBJ exports
/// usually write them as `map_Bump`, which lands in the height slot, while
/// glTF has a dedicated normal slot. The convention is therefore chosen per
/// asset pack rather than hardcoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotConvention {
    mapping: Vec<(SourceSlot, TextureRole)>,
}

impl SlotConvention {
    pub fn new(mapping: impl IntoIterator<Item = (SourceSlot, TextureRole)>) -> Self {
        Self {
            mapping: mapping.into_iter().collect(),
        }
    }

    /// Diffuse, specular, and normal maps read from the height slot.
    pub fn height_as_normal() -> Self {
        Self::new([
            (SourceSlot::Diffuse, TextureRole::Diffuse),
            (SourceSlot::Specular, TextureRole::Specular),
            (SourceSlot::Height, TextureRole::Normal),
        ])
    }

    /// Every slot mapped to the role of the same name.
    pub fn standard() -> Self {
        Self::new([
            (SourceSlot::Diffuse, TextureRole::Diffuse),
            (SourceSlot::Specular, TextureRole::Specular),
            (SourceSlot::Normal, TextureRole::Normal),
            (SourceSlot::Height, TextureRole::Height),
        ])
    }

    pub fn mapping(&self) -> &[(SourceSlot, TextureRole)] {
        &self.mapping
    }
}

impl Default for SlotConvention {
    fn default() -> Self {
        Self::height_as_normal()
    }
}

/// How texture coordinates outside `[0, 1]` are sampled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum WrapMode {
    #[default]
    Repeat,
    ClampToEdge,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportOptions {
    pub convention: SlotConvention,
    /// Compute tangents for meshes that come without them.
    pub generate_tangents: bool,
    /// Map `v` to `1 - v`, for assets authored with a bottom-left UV origin.
    pub flip_uvs: bool,
    /// Wrap mode of every texture sampler of the model.
    pub wrap: WrapMode,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            convention: SlotConvention::default(),
            generate_tangents: true,
            flip_uvs: false,
            wrap: WrapMode::Repeat,
        }
    }
}

impl ImportOptions {
    pub fn with_convention(mut self, convention: SlotConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn with_wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_convention_reads_normals_from_height_slot() {
        let options = ImportOptions::default();
        assert_eq!(
            options.convention.mapping(),
            &[
                (SourceSlot::Diffuse, TextureRole::Diffuse),
                (SourceSlot::Specular, TextureRole::Specular),
                (SourceSlot::Height, TextureRole::Normal),
            ]
        );
        assert!(options.generate_tangents);
        assert!(!options.flip_uvs);
        assert_eq!(options.wrap, WrapMode::Repeat);
    }

    #[test]
    fn standard_convention_keeps_height() {
        let convention = SlotConvention::standard();
        assert!(
            convention
                .mapping()
                .contains(&(SourceSlot::Height, TextureRole::Height))
        );
        assert!(
            convention
                .mapping()
                .contains(&(SourceSlot::Normal, TextureRole::Normal))
        );
    }
}
