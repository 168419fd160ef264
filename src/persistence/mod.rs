//! Asset persistence for patched avatars
//!
//! Assets live behind an [`AssetStore`]. A value read from the host always
//! comes with the location it was loaded from ([`StoredAsset`]), which is what
//! the copy-on-write duplicator compares against.

pub mod directory_store;
pub mod duplicate;
pub mod memory_store;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::PatchResult;

pub use directory_store::DirectoryAssetStore;
pub use duplicate::duplicate_if_needed;
pub use memory_store::MemoryAssetStore;

/// Anything the patcher can write to the host's asset storage
pub trait Asset: Clone + Serialize {
    fn asset_name(&self) -> &str;
}

/// Host storage for assets
pub trait AssetStore {
    /// Write `contents` as the asset at `path`, replacing any previous asset there
    fn create_asset(&mut self, path: &Path, contents: &[u8]) -> PatchResult<()>;

    /// Flag the asset at `path` as modified so the host saves it
    fn mark_dirty(&mut self, path: &Path);
}

/// An asset value together with the location it is stored at
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAsset<T> {
    pub path: Option<PathBuf>,
    pub value: T,
}

impl<T> StoredAsset<T> {
    /// A value that has never been written to storage
    pub fn unsaved(value: T) -> Self {
        Self { path: None, value }
    }

    pub fn at(path: impl Into<PathBuf>, value: T) -> Self {
        Self {
            path: Some(path.into()),
            value,
        }
    }

    pub fn is_stored_at(&self, path: &Path) -> bool {
        self.path.as_deref() == Some(path)
    }
}

/// Encode an asset the way every store persists it
pub fn encode_asset<T: Asset>(asset: &T) -> PatchResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(asset)?)
}

/// Encode and write `asset` at `path`, then mark it dirty
pub fn save_asset<S, T>(store: &mut S, path: &Path, asset: &T) -> PatchResult<()>
where
    S: AssetStore + ?Sized,
    T: Asset,
{
    let contents = encode_asset(asset)?;
    store.create_asset(path, &contents)?;
    store.mark_dirty(path);
    log::debug!("Wrote asset '{}' to {}", asset.asset_name(), path.display());
    Ok(())
}
