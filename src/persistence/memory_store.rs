//! In-memory asset store

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{persistence_error, PatchResult};
use crate::persistence::AssetStore;

/// Keeps written assets in a map. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    assets: HashMap<PathBuf, Vec<u8>>,
    dirty: HashSet<PathBuf>,
    failing: HashSet<PathBuf>,
    writes: usize,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later write to `path` fail
    pub fn fail_writes_to(&mut self, path: impl Into<PathBuf>) {
        self.failing.insert(path.into());
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.assets.contains_key(path)
    }

    pub fn get(&self, path: &Path) -> Option<&[u8]> {
        self.assets.get(path).map(Vec::as_slice)
    }

    /// Decode the asset stored at `path`
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        self.get(path)
            .and_then(|contents| serde_json::from_slice(contents).ok())
    }

    pub fn is_dirty(&self, path: &Path) -> bool {
        self.dirty.contains(path)
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl AssetStore for MemoryAssetStore {
    fn create_asset(&mut self, path: &Path, contents: &[u8]) -> PatchResult<()> {
        if self.failing.contains(path) {
            return Err(persistence_error(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "store refused the write"),
            ));
        }

        self.assets.insert(path.to_path_buf(), contents.to_vec());
        self.writes += 1;
        Ok(())
    }

    fn mark_dirty(&mut self, path: &Path) {
        self.dirty.insert(path.to_path_buf());
    }
}
