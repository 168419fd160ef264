//! Capabilities the patcher needs from the host editor
//!
//! The patcher never owns scene nodes or components. It reaches them through
//! [`SceneGraph`] and [`AvatarHost`], which an adapter implements over the real
//! editor. [`MemoryAvatar`] is a self-contained implementation for tests and
//! offline tooling.

pub mod components;
pub mod memory;

use glam::Mat4;

use crate::error::PatchResult;
use crate::persistence::StoredAsset;
use crate::rig::{HumanBone, RigDescription};

pub use components::{BakedBone, BakedRig, BlendShape, BlendShapeFrame, Mesh, MeshRenderer};
pub use memory::{MemoryAvatar, NodeId};

/// Query and mutate the node hierarchy of one avatar
pub trait SceneGraph {
    type NodeId: Copy + Eq + std::fmt::Debug;

    /// The avatar root
    fn root(&self) -> Self::NodeId;

    fn node_name(&self, node: Self::NodeId) -> Option<&str>;

    fn rename_node(&mut self, node: Self::NodeId, name: &str) -> PatchResult<()>;

    fn parent(&self, node: Self::NodeId) -> Option<Self::NodeId>;

    fn children(&self, node: Self::NodeId) -> Vec<Self::NodeId>;

    /// Create a detached node with an identity transform
    fn create_node(&mut self, name: &str) -> Self::NodeId;

    /// Move `node` under `parent`, keeping its local transform
    fn set_parent(&mut self, node: Self::NodeId, parent: Self::NodeId) -> PatchResult<()>;

    fn local_transform(&self, node: Self::NodeId) -> Mat4;

    /// First direct child of `parent` called `name`
    fn find_child(&self, parent: Self::NodeId, name: &str) -> Option<Self::NodeId> {
        self.children(parent)
            .into_iter()
            .find(|&child| self.node_name(child) == Some(name))
    }

    fn create_child(&mut self, parent: Self::NodeId, name: &str) -> PatchResult<Self::NodeId> {
        let child = self.create_node(name);
        self.set_parent(child, parent)?;
        Ok(child)
    }

    /// Follow a slash separated path of child names. Matching is case sensitive.
    fn find_path(&self, from: Self::NodeId, path: &str) -> Option<Self::NodeId> {
        path.split('/')
            .try_fold(from, |current, name| self.find_child(current, name))
    }

    /// Depth-first search below `from` for a node called `name`
    fn find_descendant(&self, from: Self::NodeId, name: &str) -> Option<Self::NodeId> {
        let mut stack: Vec<_> = self.children(from).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if self.node_name(node) == Some(name) {
                return Some(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        None
    }

    fn world_transform(&self, node: Self::NodeId) -> Mat4 {
        let mut transform = self.local_transform(node);
        let mut current = self.parent(node);
        while let Some(parent) = current {
            transform = self.local_transform(parent) * transform;
            current = self.parent(parent);
        }
        transform
    }
}

/// Components attached to the avatar being patched
pub trait AvatarHost: SceneGraph {
    fn rig_description(&self) -> &StoredAsset<RigDescription>;

    fn set_rig_description(&mut self, description: StoredAsset<RigDescription>);

    /// Rig artifact currently driving the avatar's animation
    fn baked_rig(&self) -> Option<&StoredAsset<BakedRig>>;

    fn set_baked_rig(&mut self, rig: StoredAsset<BakedRig>);

    fn mesh_renderer(&self, node: Self::NodeId) -> Option<&MeshRenderer>;

    /// Mesh renderer on `node`, added if the node has none
    fn mesh_renderer_or_insert(&mut self, node: Self::NodeId) -> PatchResult<&mut MeshRenderer>;

    /// Scene node the description binds `bone` to
    fn resolve_bone(&self, bone: HumanBone) -> Option<Self::NodeId> {
        let name = self.rig_description().value.bound_node_name(bone)?;
        self.find_descendant(self.root(), name)
    }
}
