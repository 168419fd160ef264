//! Humanoid rig description
//!
//! A [`RigDescription`] is an ordered list of bindings keyed by [`HumanBone`].
//! None of the operations mutate in place: each returns a new description, so
//! a shared description can only change by being duplicated and replaced.

use serde::{Deserialize, Serialize};

use crate::error::{PatchError, PatchResult};
use crate::persistence::Asset;
use crate::rig::HumanBone;

/// Maps one logical bone to a concrete scene node by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoneBinding {
    pub bone: HumanBone,
    pub node_name: String,
}

impl BoneBinding {
    pub fn new(bone: HumanBone, node_name: impl Into<String>) -> Self {
        Self {
            bone,
            node_name: node_name.into(),
        }
    }

    /// An empty node name means the role is declared but unassigned
    pub fn is_assigned(&self) -> bool {
        !self.node_name.is_empty()
    }
}

/// Complete humanoid mapping for one avatar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigDescription {
    name: String,
    bindings: Vec<BoneBinding>,
}

impl RigDescription {
    /// Build a description, rejecting a bone bound twice
    pub fn new(name: impl Into<String>, bindings: Vec<BoneBinding>) -> PatchResult<Self> {
        let description = Self {
            name: name.into(),
            bindings: Vec::with_capacity(bindings.len()),
        };
        description.with_appended(bindings)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bindings(&self) -> &[BoneBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn binding(&self, bone: HumanBone) -> Option<&BoneBinding> {
        self.bindings.iter().find(|binding| binding.bone == bone)
    }

    pub fn position(&self, bone: HumanBone) -> Option<usize> {
        self.bindings.iter().position(|binding| binding.bone == bone)
    }

    /// Whether `bone` has a binding to an actual node name
    pub fn is_bound(&self, bone: HumanBone) -> bool {
        self.bound_node_name(bone).is_some()
    }

    pub fn bound_node_name(&self, bone: HumanBone) -> Option<&str> {
        self.binding(bone)
            .filter(|binding| binding.is_assigned())
            .map(|binding| binding.node_name.as_str())
    }

    /// Copy without the binding for `bone`
    pub fn without(&self, bone: HumanBone) -> Self {
        Self {
            name: self.name.clone(),
            bindings: self
                .bindings
                .iter()
                .filter(|binding| binding.bone != bone)
                .cloned()
                .collect(),
        }
    }

    /// Copy where the binding for `from` becomes the binding for `to`.
    ///
    /// Any previous binding for `to` is dropped; the retagged binding keeps
    /// the slot `from` occupied once that drop has happened.
    pub fn retagged(&self, from: HumanBone, to: HumanBone) -> Self {
        if from == to || self.binding(from).is_none() {
            return self.clone();
        }

        let mut retagged = self.without(to);
        for binding in &mut retagged.bindings {
            if binding.bone == from {
                binding.bone = to;
            }
        }
        retagged
    }

    /// Copy with `bindings` added at the end
    pub fn with_appended(&self, bindings: impl IntoIterator<Item = BoneBinding>) -> PatchResult<Self> {
        let mut appended = self.clone();
        for binding in bindings {
            if appended.binding(binding.bone).is_some() {
                return Err(PatchError::DuplicateBinding(binding.bone));
            }
            appended.bindings.push(binding);
        }
        Ok(appended)
    }

    /// Copy with the binding for `bone` pointing at `node_name`
    pub fn renamed(&self, bone: HumanBone, node_name: &str) -> Self {
        let mut renamed = self.clone();
        for binding in &mut renamed.bindings {
            if binding.bone == bone {
                binding.node_name = node_name.to_string();
            }
        }
        renamed
    }
}

impl Asset for RigDescription {
    fn asset_name(&self) -> &str {
        &self.name
    }
}
