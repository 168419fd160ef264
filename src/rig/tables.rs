//! Fixed naming conventions of the avatar host platform.
//!
//! These must stay exactly as they are: the host matches them literally.

use crate::rig::HumanBone;

/// Blink shape keys in the order the host expects them
pub const AUTO_BLINK_SHAPES: [&str; 4] = [
    "vrc.blink_left",
    "vrc.blink_right",
    "vrc.lowerlid_left",
    "vrc.lowerlid_right",
];

/// Node under the avatar root whose mesh must carry the blink shapes
pub const AUTO_BLINK_MESH_PATH: &str = "Body";

/// Node chains that must exist under the avatar root for auto eye movement
pub const AUTO_EYE_MOVEMENT_PATHS: [&str; 2] = [
    "Armature/Hips/Spine/Chest/Neck/Head/LeftEye",
    "Armature/Hips/Spine/Chest/Neck/Head/RightEye",
];

/// A finger whose joints must all be bound for animation overrides to work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerChain {
    /// Bone the first joint hangs off when the whole finger is missing
    pub anchor: HumanBone,
    /// Proximal, intermediate and distal joints
    pub joints: [HumanBone; 3],
}

impl FingerChain {
    /// Bone a placeholder for `joints[index]` is parented to
    pub fn parent_of(&self, index: usize) -> HumanBone {
        match index {
            0 => self.anchor,
            _ => self.joints[index - 1],
        }
    }
}

/// Fingers the animation override needs, left hand first
pub const ANIMATION_OVERRIDE_CHAINS: [FingerChain; 6] = [
    FingerChain {
        anchor: HumanBone::LeftHand,
        joints: [
            HumanBone::LeftThumbProximal,
            HumanBone::LeftThumbIntermediate,
            HumanBone::LeftThumbDistal,
        ],
    },
    FingerChain {
        anchor: HumanBone::LeftHand,
        joints: [
            HumanBone::LeftIndexProximal,
            HumanBone::LeftIndexIntermediate,
            HumanBone::LeftIndexDistal,
        ],
    },
    FingerChain {
        anchor: HumanBone::LeftHand,
        joints: [
            HumanBone::LeftMiddleProximal,
            HumanBone::LeftMiddleIntermediate,
            HumanBone::LeftMiddleDistal,
        ],
    },
    FingerChain {
        anchor: HumanBone::RightHand,
        joints: [
            HumanBone::RightThumbProximal,
            HumanBone::RightThumbIntermediate,
            HumanBone::RightThumbDistal,
        ],
    },
    FingerChain {
        anchor: HumanBone::RightHand,
        joints: [
            HumanBone::RightIndexProximal,
            HumanBone::RightIndexIntermediate,
            HumanBone::RightIndexDistal,
        ],
    },
    FingerChain {
        anchor: HumanBone::RightHand,
        joints: [
            HumanBone::RightMiddleProximal,
            HumanBone::RightMiddleIntermediate,
            HumanBone::RightMiddleDistal,
        ],
    },
];

/// Every path the auto eye movement heuristic inspects, mesh holder last
pub fn auto_eye_movement_paths() -> impl Iterator<Item = &'static str> {
    AUTO_EYE_MOVEMENT_PATHS
        .iter()
        .copied()
        .chain(std::iter::once(AUTO_BLINK_MESH_PATH))
}
