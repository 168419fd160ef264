//! Asset store backed by a project directory on disk

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{persistence_error, PatchResult};
use crate::persistence::AssetStore;

/// Writes assets below a project root. Relative asset paths are resolved
/// against the root.
#[derive(Debug)]
pub struct DirectoryAssetStore {
    root: PathBuf,
    dirty: BTreeSet<PathBuf>,
}

impl DirectoryAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dirty: BTreeSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of an asset path
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Decode the asset stored at `path`
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> PatchResult<T> {
        let resolved = self.resolve(path);
        let contents = fs::read(&resolved).map_err(|e| persistence_error(&resolved, e))?;
        Ok(serde_json::from_slice(&contents)?)
    }

    /// Paths marked dirty since the last call, in sorted order
    pub fn take_dirty(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }
}

impl AssetStore for DirectoryAssetStore {
    fn create_asset(&mut self, path: &Path, contents: &[u8]) -> PatchResult<()> {
        let resolved = self.resolve(path);
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).map_err(|e| persistence_error(parent, e))?;
        }

        // Write beside the target and rename so a failed write never leaves a
        // half-written asset behind
        let temp_path = resolved.with_extension("tmp");
        fs::write(&temp_path, contents).map_err(|e| persistence_error(&temp_path, e))?;
        if let Err(e) = fs::rename(&temp_path, &resolved) {
            let _ = fs::remove_file(&temp_path);
            return Err(persistence_error(&resolved, e));
        }
        Ok(())
    }

    fn mark_dirty(&mut self, path: &Path) {
        self.dirty.insert(path.to_path_buf());
    }
}
