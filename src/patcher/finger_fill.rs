//! Finger gap fill
//!
//! Hand animation overrides only work when every joint of the override
//! fingers is bound. Each finger missing joints gets a chain of placeholder
//! nodes from its first gap to the fingertip.

use crate::error::{PatchError, PatchResult};
use crate::host::AvatarHost;
use crate::patcher::PatchSession;
use crate::persistence::AssetStore;
use crate::rig::{BoneBinding, FingerChain, RigDescription, ANIMATION_OVERRIDE_CHAINS};

/// Index of the first joint of `chain` without a binding
pub fn first_gap(description: &RigDescription, chain: &FingerChain) -> Option<usize> {
    chain
        .joints
        .iter()
        .position(|&joint| !description.is_bound(joint))
}

impl<'a, H, S> PatchSession<'a, H, S>
where
    H: AvatarHost,
    S: AssetStore + ?Sized,
{
    /// Bind placeholders for every missing override joint. Returns the number of bindings added.
    pub fn fill_finger_gaps(&mut self) -> PatchResult<usize> {
        let mut added = Vec::new();
        for chain in &ANIMATION_OVERRIDE_CHAINS {
            added.extend(self.fill_chain(chain)?);
        }

        if added.is_empty() {
            log::debug!("All override finger joints bound, gap fill skipped");
            return Ok(0);
        }

        // Unassigned bindings for the filled joints are replaced, not duplicated
        let description = added
            .iter()
            .fold(self.host.rig_description().value.clone(), |description, binding| {
                description.without(binding.bone)
            })
            .with_appended(added.iter().cloned())?;

        log::info!("Bound {} placeholder finger joint(s)", added.len());
        self.report
            .synthesized_bones
            .extend(added.iter().map(|binding| binding.bone));
        self.commit_description(description)?;
        Ok(added.len())
    }

    fn fill_chain(&mut self, chain: &FingerChain) -> PatchResult<Vec<BoneBinding>> {
        let Some(gap) = first_gap(&self.host.rig_description().value, chain) else {
            return Ok(Vec::new());
        };

        let anchor = chain.parent_of(gap);
        let mut parent = self
            .host
            .resolve_bone(anchor)
            .ok_or(PatchError::MissingAnchorBone {
                bone: chain.joints[gap],
                anchor,
            })?;

        let mut bindings = Vec::with_capacity(chain.joints.len() - gap);
        for &joint in &chain.joints[gap..] {
            let name = joint.placeholder_name();
            let node = match self.host.find_child(parent, &name) {
                Some(existing) => existing,
                None => {
                    self.report.created_nodes += 1;
                    self.host.create_child(parent, &name)?
                }
            };
            log::debug!("Placeholder '{}' under {}", name, anchor);
            bindings.push(BoneBinding::new(joint, name));
            parent = node;
        }
        Ok(bindings)
    }
}
