//! Patch configuration
//!
//! The output directory used to be ambient editor state. It is passed in
//! explicitly here so a patch run never depends on what happens to be selected.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PatchError, PatchResult};

/// File extension given to every asset the patcher writes
pub const ASSET_EXTENSION: &str = "asset";

/// Configuration for a single patch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// Directory that receives duplicated and baked assets for this avatar
    pub output_dir: PathBuf,
    /// Satisfy the auto eye movement heuristic when true, break it when false
    pub enable_auto_eye_movement: bool,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("Assets/Patched"),
            enable_auto_eye_movement: true,
        }
    }
}

impl PatchConfig {
    pub fn new(output_dir: impl Into<PathBuf>, enable_auto_eye_movement: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            enable_auto_eye_movement,
        }
    }

    /// Parse a configuration from TOML text. Missing keys fall back to defaults.
    pub fn from_toml_str(raw: &str) -> PatchResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> PatchResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| PatchError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Storage location for an asset called `name`
    pub fn asset_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", name, ASSET_EXTENSION))
    }

    /// Storage location that keeps the file name of an asset stored elsewhere
    pub fn relocated_path(&self, original: &Path) -> Option<PathBuf> {
        original.file_name().map(|file_name| self.output_dir.join(file_name))
    }
}
