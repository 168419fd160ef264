//! Baked rig construction

use crate::error::{PatchError, PatchResult};
use crate::host::{AvatarHost, BakedBone, BakedRig};
use crate::rig::RigDescription;

/// Bake `description` against the host's current node transforms.
///
/// Every assigned binding must resolve to a node below the avatar root.
/// Unassigned bindings are left out of the artifact.
pub fn bake_rig<H: AvatarHost>(host: &H, name: &str, description: &RigDescription) -> PatchResult<BakedRig> {
    let root = host.root();
    let bones = description
        .bindings()
        .iter()
        .filter(|binding| binding.is_assigned())
        .map(|binding| {
            let node = host.find_descendant(root, &binding.node_name).ok_or_else(|| {
                PatchError::UnresolvedBinding {
                    bone: binding.bone,
                    node_name: binding.node_name.clone(),
                }
            })?;
            Ok(BakedBone {
                bone: binding.bone,
                node_name: binding.node_name.clone(),
                world_transform: host.world_transform(node),
            })
        })
        .collect::<PatchResult<Vec<_>>>()?;

    Ok(BakedRig {
        name: name.to_string(),
        description: description.name().to_string(),
        bones,
    })
}
