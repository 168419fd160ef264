//! Pre-export workarounds for the avatar host platform
//!
//! A [`PatchSession`] runs the passes in a fixed order against one avatar:
//! chest remap, finger gap fill, then either auto eye movement enable or
//! disable. Passes that change the rig description write it through
//! [`PatchSession::commit_description`], which duplicates a shared description
//! before replacing it. The baked rig is rebuilt once at the end if anything
//! touched the description.

pub mod bake;
pub mod chest_remap;
pub mod eye_movement;
pub mod finger_fill;

use std::path::{Path, PathBuf};

use crate::config::PatchConfig;
use crate::error::PatchResult;
use crate::host::AvatarHost;
use crate::persistence::{duplicate_if_needed, save_asset, AssetStore, StoredAsset};
use crate::rig::{HumanBone, RigDescription};

pub use bake::bake_rig;
pub use chest_remap::remapped_chest;
pub use eye_movement::auto_eye_movement_detected;
pub use finger_fill::first_gap;

/// What a patch run changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchReport {
    /// UpperChest was folded into Chest
    pub chest_remapped: bool,
    /// Bones bound to freshly synthesized placeholder nodes
    pub synthesized_bones: Vec<HumanBone>,
    /// Scene nodes created by any pass
    pub created_nodes: usize,
    /// Blend shapes appended to the auto blink mesh
    pub added_blend_shapes: Vec<String>,
    /// Eye bones whose node names were lower-cased
    pub lowercased_eyes: Vec<HumanBone>,
    pub description_changed: bool,
    pub rig_rebuilt: bool,
    /// Every asset path written during the run, in first-write order
    pub assets_written: Vec<PathBuf>,
}

impl PatchReport {
    /// True when the run left the avatar exactly as it found it
    pub fn is_unchanged(&self) -> bool {
        !self.description_changed
            && self.created_nodes == 0
            && self.added_blend_shapes.is_empty()
            && self.assets_written.is_empty()
    }

    fn record_write(&mut self, path: &Path) {
        if !self.assets_written.iter().any(|written| written == path) {
            self.assets_written.push(path.to_path_buf());
        }
    }
}

/// One patch run over one avatar
pub struct PatchSession<'a, H, S>
where
    H: AvatarHost,
    S: AssetStore + ?Sized,
{
    host: &'a mut H,
    store: &'a mut S,
    config: &'a PatchConfig,
    report: PatchReport,
}

impl<'a, H, S> PatchSession<'a, H, S>
where
    H: AvatarHost,
    S: AssetStore + ?Sized,
{
    pub fn new(host: &'a mut H, store: &'a mut S, config: &'a PatchConfig) -> Self {
        Self {
            host,
            store,
            config,
            report: PatchReport::default(),
        }
    }

    /// Run every pass and rebuild the baked rig if the description changed.
    ///
    /// The first failing pass aborts the run. Assets written before the
    /// failure stay in place; re-running is safe because each pass detects
    /// work it already did.
    pub fn run(mut self) -> PatchResult<PatchReport> {
        self.remap_upper_chest()?;
        self.fill_finger_gaps()?;
        if self.config.enable_auto_eye_movement {
            self.enable_auto_eye_movement()?;
        } else {
            self.disable_auto_eye_movement()?;
        }

        if self.report.description_changed {
            self.rebuild_rig()?;
        }

        log::info!(
            "Patched avatar: {} asset(s) written, rig {}",
            self.report.assets_written.len(),
            if self.report.rig_rebuilt { "rebuilt" } else { "unchanged" }
        );
        Ok(self.report)
    }

    pub fn report(&self) -> &PatchReport {
        &self.report
    }

    /// Replace the avatar's description with `description`.
    ///
    /// The current description is first made private to this avatar's output
    /// directory, so a description shared with other avatars is never written.
    pub fn commit_description(&mut self, description: RigDescription) -> PatchResult<()> {
        let current = self.host.rig_description().clone();
        let target = self.config.asset_path(current.value.name());

        let mut private = duplicate_if_needed(&mut *self.store, &target, &current)?;
        private.value = description;
        save_asset(&mut *self.store, &target, &private.value)?;
        self.report.record_write(&target);

        self.host.set_rig_description(private);
        self.report.description_changed = true;
        Ok(())
    }

    /// Persist the rig baked from the current description and attach it
    pub fn rebuild_rig(&mut self) -> PatchResult<()> {
        let name = match self.host.baked_rig() {
            Some(rig) => rig.value.name.clone(),
            None => format!(
                "{}Avatar",
                self.host.node_name(self.host.root()).unwrap_or("Avatar")
            ),
        };

        let rig = bake_rig(&*self.host, &name, &self.host.rig_description().value)?;
        let path = self.config.asset_path(&name);
        save_asset(&mut *self.store, &path, &rig)?;
        self.report.record_write(&path);

        log::info!("Rebuilt baked rig '{}' with {} bones", name, rig.bones.len());
        self.host.set_baked_rig(StoredAsset::at(path, rig));
        self.report.rig_rebuilt = true;
        Ok(())
    }
}
