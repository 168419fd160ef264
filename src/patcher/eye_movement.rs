//! Auto eye movement
//!
//! The host turns on automatic eye movement when the avatar root has a `Body`
//! node whose mesh carries at least four blend shapes, plus an
//! `Armature/Hips/Spine/Chest/Neck/Head` chain ending in `LeftEye` and
//! `RightEye`. Enabling manufactures that structure with empty nodes and
//! zero-delta shapes. Disabling only breaks a match this crate is responsible
//! for: eye bones sitting on the required paths get lower-cased names, which
//! the host's case-sensitive lookup no longer finds.

use crate::error::{PatchError, PatchResult};
use crate::host::{AvatarHost, Mesh};
use crate::patcher::PatchSession;
use crate::persistence::{duplicate_if_needed, save_asset, AssetStore, StoredAsset};
use crate::rig::tables::auto_eye_movement_paths;
use crate::rig::{HumanBone, AUTO_BLINK_MESH_PATH, AUTO_BLINK_SHAPES, AUTO_EYE_MOVEMENT_PATHS};

/// Name of the placeholder mesh created when the holder has none
pub const PLACEHOLDER_MESH_NAME: &str = "dummy-for-auto-eye-movement";

/// Whether the host would enable auto eye movement for this avatar
pub fn auto_eye_movement_detected<H: AvatarHost>(host: &H) -> bool {
    match required_nodes(host) {
        Some(nodes) => nodes
            .last()
            .is_some_and(|&holder| has_blink_shapes(host, holder)),
        None => false,
    }
}

/// Nodes reached by every required path, mesh holder last. `None` if any is missing.
fn required_nodes<H: AvatarHost>(host: &H) -> Option<Vec<H::NodeId>> {
    let root = host.root();
    auto_eye_movement_paths()
        .map(|path| host.find_path(root, path))
        .collect()
}

fn has_blink_shapes<H: AvatarHost>(host: &H, holder: H::NodeId) -> bool {
    host.mesh_renderer(holder)
        .and_then(|renderer| renderer.shared_mesh.as_ref())
        .is_some_and(|mesh| mesh.value.blend_shape_count() >= AUTO_BLINK_SHAPES.len())
}

impl<'a, H, S> PatchSession<'a, H, S>
where
    H: AvatarHost,
    S: AssetStore + ?Sized,
{
    /// Create whatever the auto eye movement heuristic is missing
    pub fn enable_auto_eye_movement(&mut self) -> PatchResult<()> {
        for path in AUTO_EYE_MOVEMENT_PATHS {
            self.ensure_path(path)?;
        }
        let holder = self.ensure_path(AUTO_BLINK_MESH_PATH)?;

        let current = self.host.mesh_renderer_or_insert(holder)?.shared_mesh.clone();
        if let Some(mesh) = &current {
            if mesh.value.blend_shape_count() >= AUTO_BLINK_SHAPES.len() {
                log::debug!("'{}' already has blink shapes, auto eye movement satisfied", mesh.value.name);
                return Ok(());
            }
        }

        let mut mesh = self.private_mesh(current)?;
        let added = add_blink_shapes(&mut mesh.value);
        if let Some(path) = mesh.path.clone() {
            save_asset(&mut *self.store, &path, &mesh.value)?;
            self.report.record_write(&path);
        }

        log::info!(
            "Added {} placeholder blink shape(s) to '{}'",
            added.len(),
            mesh.value.name
        );
        self.report.added_blend_shapes.extend(added);
        self.host.mesh_renderer_or_insert(holder)?.shared_mesh = Some(mesh);
        Ok(())
    }

    /// Lower-case eye bones that make the auto eye movement heuristic match
    pub fn disable_auto_eye_movement(&mut self) -> PatchResult<()> {
        let Some(required) = required_nodes(&*self.host) else {
            log::debug!("Auto eye movement paths incomplete, nothing to disable");
            return Ok(());
        };
        let Some(&holder) = required.last() else {
            return Ok(());
        };
        if !has_blink_shapes(&*self.host, holder) {
            log::debug!("Auto blink mesh lacks blink shapes, nothing to disable");
            return Ok(());
        }

        let eyes: Vec<_> = [HumanBone::RightEye, HumanBone::LeftEye]
            .into_iter()
            .filter_map(|bone| {
                self.host
                    .resolve_bone(bone)
                    .filter(|node| required.contains(node))
                    .map(|node| (bone, node))
            })
            .collect();
        if eyes.is_empty() {
            log::debug!("Eye bones are not on the auto eye movement paths, leaving them alone");
            return Ok(());
        }

        let mut renames = Vec::with_capacity(eyes.len());
        for (bone, node) in eyes {
            let lowered = self
                .host
                .node_name(node)
                .ok_or_else(|| PatchError::UnknownNode(format!("{:?}", node)))?
                .to_lowercase();
            renames.push((bone, node, lowered));
        }
        let description = renames
            .iter()
            .fold(self.host.rig_description().value.clone(), |description, (bone, _, lowered)| {
                description.renamed(*bone, lowered)
            });

        // Nodes are renamed only after the description is persisted
        self.commit_description(description)?;
        for (bone, node, lowered) in renames {
            self.host.rename_node(node, &lowered)?;
            log::info!("Renamed {} to '{}' to disable auto eye movement", bone, lowered);
            self.report.lowercased_eyes.push(bone);
        }
        Ok(())
    }

    /// Walk `path` below the root, creating missing nodes
    fn ensure_path(&mut self, path: &str) -> PatchResult<H::NodeId> {
        let mut current = self.host.root();
        for name in path.split('/') {
            current = match self.host.find_child(current, name) {
                Some(child) => child,
                None => {
                    self.report.created_nodes += 1;
                    self.host.create_child(current, name)?
                }
            };
        }
        Ok(current)
    }

    /// The holder's mesh made private to the output directory, or a new placeholder
    fn private_mesh(&mut self, current: Option<StoredAsset<Mesh>>) -> PatchResult<StoredAsset<Mesh>> {
        let source = current.unwrap_or_else(|| StoredAsset::unsaved(Mesh::placeholder(PLACEHOLDER_MESH_NAME)));
        let target = source
            .path
            .as_deref()
            .and_then(|path| self.config.relocated_path(path))
            .unwrap_or_else(|| self.config.asset_path(&source.value.name));

        if !source.is_stored_at(&target) {
            self.report.record_write(&target);
        }
        duplicate_if_needed(&mut *self.store, &target, &source)
    }
}

/// Append blink shapes until the mesh carries four in total.
///
/// Existing shapes occupy the first slots of the blink order, so names after
/// them are tried first, then the earlier ones. Names already present are
/// never added twice. Once every blink name is present the mesh has at least
/// four shapes.
fn add_blink_shapes(mesh: &mut Mesh) -> Vec<String> {
    let filled = mesh.blend_shape_count().min(AUTO_BLINK_SHAPES.len());
    let (before, after) = AUTO_BLINK_SHAPES.split_at(filled);

    let mut added = Vec::new();
    for name in after.iter().chain(before) {
        if mesh.blend_shape_count() >= AUTO_BLINK_SHAPES.len() {
            break;
        }
        if mesh.has_blend_shape(name) {
            continue;
        }
        mesh.add_empty_blend_shape(*name);
        added.push(name.to_string());
    }
    added
}
