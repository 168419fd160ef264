//! Self-contained avatar host backed by an arena of nodes

use std::collections::HashMap;

use generational_arena::{Arena, Index};
use glam::Mat4;

use crate::error::{PatchError, PatchResult};
use crate::host::{AvatarHost, BakedRig, MeshRenderer, SceneGraph};
use crate::persistence::StoredAsset;
use crate::rig::RigDescription;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub Index);

impl From<NodeId> for Index {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

#[derive(Debug, Clone)]
struct SceneNode {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    transform: Mat4,
}

impl SceneNode {
    fn new(name: &str, transform: Mat4) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            transform,
        }
    }
}

/// Avatar whose scene graph and components live entirely in memory
#[derive(Debug)]
pub struct MemoryAvatar {
    nodes: Arena<SceneNode>,
    root: NodeId,
    description: StoredAsset<RigDescription>,
    baked_rig: Option<StoredAsset<BakedRig>>,
    renderers: HashMap<NodeId, MeshRenderer>,
}

impl MemoryAvatar {
    pub fn new(root_name: &str, description: StoredAsset<RigDescription>) -> Self {
        let mut nodes = Arena::new();
        let root = NodeId(nodes.insert(SceneNode::new(root_name, Mat4::IDENTITY)));
        Self {
            nodes,
            root,
            description,
            baked_rig: None,
            renderers: HashMap::new(),
        }
    }

    /// Create a node under `parent` with the given local transform
    pub fn add_node(&mut self, parent: NodeId, name: &str, transform: Mat4) -> PatchResult<NodeId> {
        let node = NodeId(self.nodes.insert(SceneNode::new(name, transform)));
        self.set_parent(node, parent)?;
        Ok(node)
    }

    /// Create every missing node along `path` below the root and return the last one
    pub fn add_path(&mut self, path: &str) -> PatchResult<NodeId> {
        let mut current = self.root;
        for name in path.split('/') {
            current = match self.find_child(current, name) {
                Some(child) => child,
                None => self.create_child(current, name)?,
            };
        }
        Ok(current)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Slash separated names from the root's child down to `node`
    pub fn path_of(&self, node: NodeId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root {
                break;
            }
            let scene_node = self.nodes.get(id.into())?;
            names.push(scene_node.name.as_str());
            current = scene_node.parent;
        }
        names.reverse();
        Some(names.join("/"))
    }

    fn node(&self, node: NodeId) -> PatchResult<&SceneNode> {
        self.nodes
            .get(node.into())
            .ok_or_else(|| PatchError::UnknownNode(format!("{:?}", node)))
    }

    fn node_mut(&mut self, node: NodeId) -> PatchResult<&mut SceneNode> {
        self.nodes
            .get_mut(node.into())
            .ok_or_else(|| PatchError::UnknownNode(format!("{:?}", node)))
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.nodes.get(id.into()).and_then(|n| n.parent);
        }
        false
    }
}

impl SceneGraph for MemoryAvatar {
    type NodeId = NodeId;

    fn root(&self) -> NodeId {
        self.root
    }

    fn node_name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.into()).map(|n| n.name.as_str())
    }

    fn rename_node(&mut self, node: NodeId, name: &str) -> PatchResult<()> {
        self.node_mut(node)?.name = name.to_string();
        Ok(())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.into()).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.into())
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn create_node(&mut self, name: &str) -> NodeId {
        NodeId(self.nodes.insert(SceneNode::new(name, Mat4::IDENTITY)))
    }

    fn set_parent(&mut self, node: NodeId, parent: NodeId) -> PatchResult<()> {
        self.node(parent)?;
        if self.is_ancestor_or_self(node, parent) {
            return Err(PatchError::InvalidParent {
                node: format!("{:?}", node),
                parent: format!("{:?}", parent),
            });
        }

        if let Some(old_parent) = self.node(node)?.parent {
            self.node_mut(old_parent)?.children.retain(|&child| child != node);
        }
        self.node_mut(node)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(node);
        Ok(())
    }

    fn local_transform(&self, node: NodeId) -> Mat4 {
        self.nodes
            .get(node.into())
            .map_or(Mat4::IDENTITY, |n| n.transform)
    }
}

impl AvatarHost for MemoryAvatar {
    fn rig_description(&self) -> &StoredAsset<RigDescription> {
        &self.description
    }

    fn set_rig_description(&mut self, description: StoredAsset<RigDescription>) {
        self.description = description;
    }

    fn baked_rig(&self) -> Option<&StoredAsset<BakedRig>> {
        self.baked_rig.as_ref()
    }

    fn set_baked_rig(&mut self, rig: StoredAsset<BakedRig>) {
        self.baked_rig = Some(rig);
    }

    fn mesh_renderer(&self, node: NodeId) -> Option<&MeshRenderer> {
        self.renderers.get(&node)
    }

    fn mesh_renderer_or_insert(&mut self, node: NodeId) -> PatchResult<&mut MeshRenderer> {
        self.node(node)?;
        Ok(self.renderers.entry(node).or_default())
    }
}
