//! Humanoid rig model and the host platform's fixed bone conventions

pub mod bones;
pub mod description;
pub mod tables;

pub use bones::HumanBone;
pub use description::{BoneBinding, RigDescription};
pub use tables::{FingerChain, ANIMATION_OVERRIDE_CHAINS, AUTO_BLINK_MESH_PATH, AUTO_BLINK_SHAPES, AUTO_EYE_MOVEMENT_PATHS};
