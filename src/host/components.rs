//! Host components the patcher reads and writes

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::persistence::{Asset, StoredAsset};
use crate::rig::HumanBone;

/// One keyframe of a blend shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendShapeFrame {
    pub weight: f32,
    pub delta_vertices: Vec<Vec3>,
    pub delta_normals: Vec<Vec3>,
    pub delta_tangents: Vec<Vec3>,
}

impl BlendShapeFrame {
    /// A frame that moves nothing
    pub fn zero(vertex_count: usize) -> Self {
        Self {
            weight: 0.0,
            delta_vertices: vec![Vec3::ZERO; vertex_count],
            delta_normals: vec![Vec3::ZERO; vertex_count],
            delta_tangents: vec![Vec3::ZERO; vertex_count],
        }
    }

    pub fn is_zero(&self) -> bool {
        self.delta_vertices
            .iter()
            .chain(&self.delta_normals)
            .chain(&self.delta_tangents)
            .all(|delta| *delta == Vec3::ZERO)
    }
}

/// Named deformation target of a mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendShape {
    pub name: String,
    pub frames: Vec<BlendShapeFrame>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vec3>,
    pub blend_shapes: Vec<BlendShape>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, vertices: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            vertices,
            blend_shapes: Vec::new(),
        }
    }

    /// Smallest mesh the host accepts: a single vertex at the origin
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self::new(name, vec![Vec3::ZERO])
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn blend_shape_count(&self) -> usize {
        self.blend_shapes.len()
    }

    pub fn has_blend_shape(&self, name: &str) -> bool {
        self.blend_shapes.iter().any(|shape| shape.name == name)
    }

    /// Append a blend shape with a single zero-weight frame of zero deltas
    pub fn add_empty_blend_shape(&mut self, name: impl Into<String>) {
        self.blend_shapes.push(BlendShape {
            name: name.into(),
            frames: vec![BlendShapeFrame::zero(self.vertex_count())],
        });
    }
}

impl Asset for Mesh {
    fn asset_name(&self) -> &str {
        &self.name
    }
}

/// Skinned mesh renderer attached to a scene node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshRenderer {
    pub shared_mesh: Option<StoredAsset<Mesh>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakedBone {
    pub bone: HumanBone,
    pub node_name: String,
    pub world_transform: Mat4,
}

/// Rig artifact the host's animation system consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakedRig {
    pub name: String,
    /// Name of the description this rig was baked from
    pub description: String,
    pub bones: Vec<BakedBone>,
}

impl BakedRig {
    pub fn bone(&self, bone: HumanBone) -> Option<&BakedBone> {
        self.bones.iter().find(|baked| baked.bone == bone)
    }
}

impl Asset for BakedRig {
    fn asset_name(&self) -> &str {
        &self.name
    }
}
