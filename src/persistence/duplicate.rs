//! Copy-on-write duplication of shared assets

use std::path::Path;

use crate::error::PatchResult;
use crate::persistence::{save_asset, Asset, AssetStore, StoredAsset};

/// Return an asset that is private to `target`.
///
/// An asset already stored at `target` is returned as is. Anything else is
/// cloned and the clone is written to `target`; the original value and its
/// storage location are left alone.
pub fn duplicate_if_needed<S, T>(
    store: &mut S,
    target: &Path,
    asset: &StoredAsset<T>,
) -> PatchResult<StoredAsset<T>>
where
    S: AssetStore + ?Sized,
    T: Asset,
{
    if asset.is_stored_at(target) {
        store.mark_dirty(target);
        return Ok(asset.clone());
    }

    log::debug!(
        "Duplicating '{}' from {} to {}",
        asset.value.asset_name(),
        asset
            .path
            .as_deref()
            .map_or_else(|| "<unsaved>".to_string(), |path| path.display().to_string()),
        target.display()
    );

    let duplicate = StoredAsset::at(target, asset.value.clone());
    save_asset(store, target, &duplicate.value)?;
    Ok(duplicate)
}
