//! Error types surfaced by model import.
//!
//! [`ImportError`] is fatal: no [`Model`](crate::data_structures::model::Model)
//! exists when it is returned. [`TextureLoadError`] is a diagnostic: the
//! import carries on without the affected binding.

use std::path::PathBuf;

use crate::data_structures::model::TextureRole;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The asset file (not a texture) could not be read.
    #[error("failed to open asset {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The parser rejected the asset or the scene it produced is unusable.
    #[error("failed to import {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

impl ImportError {
    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::FileOpen { path, .. } | Self::Parse { path, .. } => path,
        }
    }

    pub fn reason(&self) -> String {
        match self {
            Self::FileOpen { source, .. } => source.to_string(),
            Self::Parse { reason, .. } => reason.clone(),
        }
    }
}

/// A texture referenced by a material that could not be read, decoded or uploaded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("mesh {mesh}: {role:?} texture {path:?} skipped: {reason}")]
pub struct TextureLoadError {
    /// Position of the affected mesh in the model's draw order.
    pub mesh: usize,
    pub role: TextureRole,
    /// Path exactly as written in the asset.
    pub path: String,
    pub reason: String,
}
