//! UpperChest → Chest remap
//!
//! The host's rig analyzer only looks at Chest. When a rig maps UpperChest the
//! old Chest binding is dropped and UpperChest takes over the Chest role.

use crate::error::PatchResult;
use crate::host::AvatarHost;
use crate::patcher::PatchSession;
use crate::persistence::AssetStore;
use crate::rig::{HumanBone, RigDescription};

/// The remapped description, or `None` when the rig has no UpperChest
pub fn remapped_chest(description: &RigDescription) -> Option<RigDescription> {
    if !description.is_bound(HumanBone::UpperChest) {
        return None;
    }
    Some(description.retagged(HumanBone::UpperChest, HumanBone::Chest))
}

impl<'a, H, S> PatchSession<'a, H, S>
where
    H: AvatarHost,
    S: AssetStore + ?Sized,
{
    /// Fold UpperChest into Chest. Returns whether the description changed.
    pub fn remap_upper_chest(&mut self) -> PatchResult<bool> {
        let Some(remapped) = remapped_chest(&self.host.rig_description().value) else {
            log::debug!("No UpperChest binding, chest remap skipped");
            return Ok(false);
        };

        log::info!(
            "Remapping UpperChest '{}' to Chest",
            remapped.bound_node_name(HumanBone::Chest).unwrap_or_default()
        );
        self.commit_description(remapped)?;
        self.report.chest_remapped = true;
        Ok(true)
    }
}
