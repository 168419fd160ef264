//! Crate-wide error handling
//!
//! Every fallible operation in the patcher returns [`PatchResult`]. Guard
//! conditions that make a pass a no-op are not errors and never show up here.

use std::path::PathBuf;

use crate::rig::HumanBone;

/// Result type for patch operations
pub type PatchResult<T> = Result<T, PatchError>;

/// Errors that can abort a patch run
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("no scene node is bound to {anchor}, cannot attach placeholder {bone}")]
    MissingAnchorBone { bone: HumanBone, anchor: HumanBone },

    #[error("failed to write asset {}: {source}", .path.display())]
    AssetPersistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode asset: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read configuration {}: {source}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is bound more than once")]
    DuplicateBinding(HumanBone),

    #[error("{bone} is bound to '{node_name}' but no such node exists")]
    UnresolvedBinding { bone: HumanBone, node_name: String },

    #[error("unknown scene node: {0}")]
    UnknownNode(String),

    #[error("cannot parent {node} under {parent}: it would become its own ancestor")]
    InvalidParent { node: String, parent: String },
}

/// Create an asset persistence error
pub fn persistence_error(path: impl Into<PathBuf>, error: std::io::Error) -> PatchError {
    PatchError::AssetPersistence {
        path: path.into(),
        source: error,
    }
}
