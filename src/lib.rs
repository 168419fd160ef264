pub mod config;
pub mod error;
pub mod host;
pub mod patcher;
pub mod persistence;
pub mod rig;

pub use config::PatchConfig;
pub use error::{PatchError, PatchResult};
pub use host::{AvatarHost, BakedRig, MemoryAvatar, Mesh, MeshRenderer, SceneGraph};
pub use patcher::{auto_eye_movement_detected, PatchReport, PatchSession};
pub use persistence::{duplicate_if_needed, AssetStore, DirectoryAssetStore, MemoryAssetStore, StoredAsset};
pub use rig::{BoneBinding, HumanBone, RigDescription};

/// Apply every pre-export workaround to one avatar.
///
/// Duplicated and rebuilt assets land in `config.output_dir`. Shared assets
/// referenced by the avatar are never written; they are copied first.
pub fn apply_workarounds<H, S>(host: &mut H, store: &mut S, config: &PatchConfig) -> PatchResult<PatchReport>
where
    H: AvatarHost,
    S: AssetStore + ?Sized,
{
    log::info!(
        "Applying workarounds to '{}' (auto eye movement {})",
        host.node_name(host.root()).unwrap_or_default(),
        if config.enable_auto_eye_movement { "on" } else { "off" }
    );
    PatchSession::new(host, store, config).run()
}
