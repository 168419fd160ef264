//! End-to-end runs of the pre-export workarounds against an in-memory avatar
//!
//! The fixture avatar uses mixamo-style node names so the auto eye movement
//! paths do not exist until the patcher creates them.

use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3};
use tempfile::TempDir;

use avatar_rig_patcher::rig::{ANIMATION_OVERRIDE_CHAINS, AUTO_BLINK_SHAPES};
use avatar_rig_patcher::{
    apply_workarounds, auto_eye_movement_detected, AvatarHost, BoneBinding, DirectoryAssetStore,
    HumanBone, MemoryAssetStore, MemoryAvatar, Mesh, PatchConfig, PatchError, RigDescription,
    SceneGraph, StoredAsset,
};

const SHARED_RIG_PATH: &str = "Assets/Models/Alice/AliceRig.asset";
const OUTPUT_DIR: &str = "Assets/Out";

#[derive(Debug, Default)]
struct AvatarOptions {
    upper_chest: bool,
    /// Finger joints left out together with the rest of their finger
    missing: Vec<HumanBone>,
    /// Bind LeftEye/RightEye to nodes called "LeftEye"/"RightEye" that do not exist yet
    bind_eyes: bool,
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn node_name(bone: HumanBone) -> String {
    format!("mixamorig:{}", bone)
}

fn build_avatar(options: &AvatarOptions) -> MemoryAvatar {
    let empty = RigDescription::new("AliceRig", Vec::new()).unwrap();
    let mut avatar = MemoryAvatar::new("Alice", StoredAsset::at(SHARED_RIG_PATH, empty));
    let mut bindings = Vec::new();
    let offset = Mat4::from_translation(Vec3::new(0.0, 0.1, 0.0));

    let mut torso = vec![HumanBone::Hips, HumanBone::Spine, HumanBone::Chest];
    if options.upper_chest {
        torso.push(HumanBone::UpperChest);
    }
    torso.extend([HumanBone::Neck, HumanBone::Head]);

    let mut parent = avatar.root();
    let mut chest_top = parent;
    for bone in torso {
        parent = avatar.add_node(parent, &node_name(bone), offset).unwrap();
        bindings.push(BoneBinding::new(bone, node_name(bone)));
        if matches!(bone, HumanBone::Chest | HumanBone::UpperChest) {
            chest_top = parent;
        }
    }

    let fingers = ANIMATION_OVERRIDE_CHAINS;
    for (hand, chains) in [
        (HumanBone::LeftHand, &fingers[..3]),
        (HumanBone::RightHand, &fingers[3..]),
    ] {
        let hand_node = avatar.add_node(chest_top, &node_name(hand), offset).unwrap();
        bindings.push(BoneBinding::new(hand, node_name(hand)));

        for chain in chains {
            let mut parent = hand_node;
            for joint in chain.joints {
                if options.missing.contains(&joint) {
                    break;
                }
                parent = avatar.add_node(parent, &node_name(joint), offset).unwrap();
                bindings.push(BoneBinding::new(joint, node_name(joint)));
            }
        }
    }

    if options.bind_eyes {
        bindings.push(BoneBinding::new(HumanBone::LeftEye, "LeftEye"));
        bindings.push(BoneBinding::new(HumanBone::RightEye, "RightEye"));
    }

    let description = RigDescription::new("AliceRig", bindings).unwrap();
    avatar.set_rig_description(StoredAsset::at(SHARED_RIG_PATH, description));
    avatar
}

fn output_path(file: &str) -> PathBuf {
    Path::new(OUTPUT_DIR).join(file)
}

fn parent_name(avatar: &MemoryAvatar, node: &str) -> Option<String> {
    let node = avatar.find_descendant(avatar.root(), node)?;
    let parent = avatar.parent(node)?;
    avatar.node_name(parent).map(str::to_string)
}

fn body_mesh(avatar: &MemoryAvatar) -> Option<&StoredAsset<Mesh>> {
    let body = avatar.find_path(avatar.root(), "Body")?;
    avatar.mesh_renderer(body)?.shared_mesh.as_ref()
}

#[test]
fn test_upper_chest_becomes_chest() -> anyhow::Result<()> {
    init_logging();
    let mut avatar = build_avatar(&AvatarOptions {
        upper_chest: true,
        ..Default::default()
    });
    let shared = avatar.rig_description().clone();
    let mut store = MemoryAssetStore::new();
    let config = PatchConfig::new(OUTPUT_DIR, false);

    let report = apply_workarounds(&mut avatar, &mut store, &config)?;

    let description = &avatar.rig_description().value;
    assert!(report.chest_remapped);
    assert!(description.binding(HumanBone::UpperChest).is_none());
    assert_eq!(
        description.bound_node_name(HumanBone::Chest),
        Some("mixamorig:UpperChest")
    );
    assert_eq!(description.len(), shared.value.len() - 1);
    assert_eq!(description.position(HumanBone::Chest), Some(2));

    // The shared description is copied, never written
    assert!(shared.value.is_bound(HumanBone::UpperChest));
    assert!(!store.contains(Path::new(SHARED_RIG_PATH)));
    assert!(avatar.rig_description().is_stored_at(&output_path("AliceRig.asset")));
    let persisted: RigDescription = store.load(&output_path("AliceRig.asset")).unwrap();
    assert_eq!(&persisted, description);

    // Rig rebuilt from the remapped description
    let rig = avatar.baked_rig().unwrap();
    assert!(report.rig_rebuilt);
    assert!(rig.is_stored_at(&output_path("AliceAvatar.asset")));
    assert_eq!(rig.value.bone(HumanBone::Chest).unwrap().node_name, "mixamorig:UpperChest");
    assert!(rig.value.bone(HumanBone::UpperChest).is_none());
    Ok(())
}

#[test]
fn test_finger_gap_is_filled_below_anchor() -> anyhow::Result<()> {
    init_logging();
    let mut avatar = build_avatar(&AvatarOptions {
        missing: vec![HumanBone::LeftIndexIntermediate],
        ..Default::default()
    });
    let nodes_before = avatar.node_count();
    let mut store = MemoryAssetStore::new();
    let config = PatchConfig::new(OUTPUT_DIR, false);

    let report = apply_workarounds(&mut avatar, &mut store, &config)?;

    assert_eq!(
        report.synthesized_bones,
        vec![HumanBone::LeftIndexIntermediate, HumanBone::LeftIndexDistal]
    );
    assert_eq!(report.created_nodes, 2);
    assert_eq!(avatar.node_count(), nodes_before + 2);
    assert_eq!(
        parent_name(&avatar, "vrc.LeftIndexIntermediate").as_deref(),
        Some("mixamorig:LeftIndexProximal")
    );
    assert_eq!(
        parent_name(&avatar, "vrc.LeftIndexDistal").as_deref(),
        Some("vrc.LeftIndexIntermediate")
    );

    let description = &avatar.rig_description().value;
    assert_eq!(
        description.bound_node_name(HumanBone::LeftIndexDistal),
        Some("vrc.LeftIndexDistal")
    );
    for chain in &ANIMATION_OVERRIDE_CHAINS {
        for joint in chain.joints {
            assert!(avatar.resolve_bone(joint).is_some(), "{} unresolved", joint);
        }
    }
    assert!(report.rig_rebuilt);
    Ok(())
}

#[test]
fn test_missing_finger_hangs_off_hand() -> anyhow::Result<()> {
    let mut avatar = build_avatar(&AvatarOptions {
        missing: vec![HumanBone::RightThumbProximal],
        ..Default::default()
    });
    let mut store = MemoryAssetStore::new();
    let config = PatchConfig::new(OUTPUT_DIR, false);

    let report = apply_workarounds(&mut avatar, &mut store, &config)?;

    assert_eq!(report.synthesized_bones.len(), 3);
    assert_eq!(
        parent_name(&avatar, "vrc.RightThumbProximal").as_deref(),
        Some("mixamorig:RightHand")
    );
    Ok(())
}

#[test]
fn test_missing_anchor_fails_before_writing() {
    let mut avatar = build_avatar(&AvatarOptions {
        missing: vec![HumanBone::LeftThumbProximal],
        ..Default::default()
    });
    let without_hand = avatar.rig_description().value.without(HumanBone::LeftHand);
    avatar.set_rig_description(StoredAsset::at(SHARED_RIG_PATH, without_hand));
    let mut store = MemoryAssetStore::new();
    let config = PatchConfig::new(OUTPUT_DIR, true);

    let result = apply_workarounds(&mut avatar, &mut store, &config);

    assert!(matches!(
        result,
        Err(PatchError::MissingAnchorBone {
            bone: HumanBone::LeftThumbProximal,
            anchor: HumanBone::LeftHand,
        })
    ));
    assert_eq!(store.write_count(), 0);
    assert!(avatar.find_path(avatar.root(), "Body").is_none());
}

#[test]
fn test_enable_creates_auto_eye_movement_structure() -> anyhow::Result<()> {
    init_logging();
    let mut avatar = build_avatar(&AvatarOptions {
        bind_eyes: true,
        ..Default::default()
    });
    let mut store = MemoryAssetStore::new();
    let config = PatchConfig::new(OUTPUT_DIR, true);
    assert!(!auto_eye_movement_detected(&avatar));

    let report = apply_workarounds(&mut avatar, &mut store, &config)?;

    for path in [
        "Armature/Hips/Spine/Chest/Neck/Head/LeftEye",
        "Armature/Hips/Spine/Chest/Neck/Head/RightEye",
        "Body",
    ] {
        assert!(avatar.find_path(avatar.root(), path).is_some(), "{} missing", path);
    }
    assert_eq!(report.created_nodes, 9);

    let placeholder = output_path("dummy-for-auto-eye-movement.asset");
    let mesh = body_mesh(&avatar).unwrap();
    assert!(mesh.is_stored_at(&placeholder));
    assert_eq!(mesh.value.vertices, vec![Vec3::ZERO]);
    let names: Vec<_> = mesh.value.blend_shapes.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, AUTO_BLINK_SHAPES.to_vec());
    assert!(mesh
        .value
        .blend_shapes
        .iter()
        .all(|shape| shape.frames.iter().all(|frame| frame.is_zero())));

    let persisted: Mesh = store.load(&placeholder).unwrap();
    assert_eq!(persisted.blend_shape_count(), 4);

    // Only the mesh changed; the description and rig are untouched
    assert!(!report.description_changed);
    assert!(!report.rig_rebuilt);
    assert_eq!(report.assets_written, vec![placeholder]);
    assert!(auto_eye_movement_detected(&avatar));
    Ok(())
}

#[test]
fn test_enable_twice_adds_nothing() -> anyhow::Result<()> {
    let mut avatar = build_avatar(&AvatarOptions {
        bind_eyes: true,
        ..Default::default()
    });
    let mut store = MemoryAssetStore::new();
    let config = PatchConfig::new(OUTPUT_DIR, true);

    apply_workarounds(&mut avatar, &mut store, &config)?;
    let writes = store.write_count();
    let nodes = avatar.node_count();

    let report = apply_workarounds(&mut avatar, &mut store, &config)?;

    assert!(report.is_unchanged());
    assert_eq!(store.write_count(), writes);
    assert_eq!(avatar.node_count(), nodes);
    assert_eq!(body_mesh(&avatar).unwrap().value.blend_shape_count(), 4);
    Ok(())
}

#[test]
fn test_enable_duplicates_existing_mesh() -> anyhow::Result<()> {
    let mut avatar = build_avatar(&AvatarOptions {
        bind_eyes: true,
        ..Default::default()
    });
    let body = avatar.add_path("Body")?;
    let mut original = Mesh::new("body", vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
    original.add_empty_blend_shape("smile");
    original.add_empty_blend_shape("angry");
    let shared = StoredAsset::at("Assets/Models/Alice/body.asset", original);
    avatar.mesh_renderer_or_insert(body)?.shared_mesh = Some(shared.clone());
    let mut store = MemoryAssetStore::new();
    let config = PatchConfig::new(OUTPUT_DIR, true);

    let report = apply_workarounds(&mut avatar, &mut store, &config)?;

    let mesh = body_mesh(&avatar).unwrap();
    assert!(mesh.is_stored_at(&output_path("body.asset")));
    let names: Vec<_> = mesh.value.blend_shapes.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["smile", "angry", "vrc.lowerlid_left", "vrc.lowerlid_right"]);
    assert_eq!(report.added_blend_shapes, vec!["vrc.lowerlid_left", "vrc.lowerlid_right"]);
    assert_eq!(mesh.value.blend_shapes[2].frames[0].delta_vertices.len(), 3);

    assert_eq!(shared.value.blend_shape_count(), 2);
    assert!(!store.contains(Path::new("Assets/Models/Alice/body.asset")));
    Ok(())
}

#[test]
fn test_disable_lowercases_synthesized_eyes() -> anyhow::Result<()> {
    init_logging();
    let mut avatar = build_avatar(&AvatarOptions {
        bind_eyes: true,
        ..Default::default()
    });
    let mut store = MemoryAssetStore::new();
    apply_workarounds(&mut avatar, &mut store, &PatchConfig::new(OUTPUT_DIR, true))?;
    assert!(auto_eye_movement_detected(&avatar));

    let disable = PatchConfig::new(OUTPUT_DIR, false);
    let report = apply_workarounds(&mut avatar, &mut store, &disable)?;

    assert_eq!(report.lowercased_eyes, vec![HumanBone::RightEye, HumanBone::LeftEye]);
    let description = &avatar.rig_description().value;
    assert_eq!(description.bound_node_name(HumanBone::LeftEye), Some("lefteye"));
    assert_eq!(description.bound_node_name(HumanBone::RightEye), Some("righteye"));
    assert!(avatar.find_path(avatar.root(), "Armature/Hips/Spine/Chest/Neck/Head/lefteye").is_some());
    assert!(!auto_eye_movement_detected(&avatar));

    // Structure stays, only the names changed
    assert!(body_mesh(&avatar).is_some());
    assert!(report.rig_rebuilt);
    assert_eq!(
        avatar.baked_rig().unwrap().value.bone(HumanBone::LeftEye).unwrap().node_name,
        "lefteye"
    );
    assert!(!store.contains(Path::new(SHARED_RIG_PATH)));

    let again = apply_workarounds(&mut avatar, &mut store, &disable)?;
    assert!(again.is_unchanged());
    Ok(())
}

#[test]
fn test_disable_ignores_foreign_eye_bones() -> anyhow::Result<()> {
    let mut avatar = build_avatar(&AvatarOptions::default());
    let mut store = MemoryAssetStore::new();
    apply_workarounds(&mut avatar, &mut store, &PatchConfig::new(OUTPUT_DIR, true))?;
    assert!(auto_eye_movement_detected(&avatar));

    let report = apply_workarounds(&mut avatar, &mut store, &PatchConfig::new(OUTPUT_DIR, false))?;

    // The heuristic matches, but not through bones this rig maps
    assert!(report.is_unchanged());
    assert!(auto_eye_movement_detected(&avatar));
    Ok(())
}

#[test]
fn test_full_run_is_idempotent() -> anyhow::Result<()> {
    let mut avatar = build_avatar(&AvatarOptions {
        upper_chest: true,
        missing: vec![HumanBone::RightMiddleDistal],
        bind_eyes: true,
    });
    let mut store = MemoryAssetStore::new();
    let config = PatchConfig::new(OUTPUT_DIR, true);

    let first = apply_workarounds(&mut avatar, &mut store, &config)?;
    assert!(first.chest_remapped);
    assert_eq!(first.synthesized_bones, vec![HumanBone::RightMiddleDistal]);

    let description = avatar.rig_description().clone();
    let nodes = avatar.node_count();
    let writes = store.write_count();

    let second = apply_workarounds(&mut avatar, &mut store, &config)?;

    assert!(second.is_unchanged());
    assert_eq!(avatar.rig_description(), &description);
    assert_eq!(avatar.node_count(), nodes);
    assert_eq!(store.write_count(), writes);
    Ok(())
}

#[test]
fn test_persistence_failure_aborts_run() {
    let mut avatar = build_avatar(&AvatarOptions {
        upper_chest: true,
        missing: vec![HumanBone::LeftIndexDistal],
        ..Default::default()
    });
    let shared = avatar.rig_description().clone();
    let mut store = MemoryAssetStore::new();
    store.fail_writes_to(output_path("AliceRig.asset"));
    let config = PatchConfig::new(OUTPUT_DIR, true);

    let result = apply_workarounds(&mut avatar, &mut store, &config);

    assert!(matches!(result, Err(PatchError::AssetPersistence { .. })));
    assert_eq!(avatar.rig_description(), &shared);
    assert!(avatar.find_descendant(avatar.root(), "vrc.LeftIndexDistal").is_none());
    assert!(avatar.baked_rig().is_none());
}

#[test]
fn test_enable_completes_out_of_order_blink_shapes() -> anyhow::Result<()> {
    let mut avatar = build_avatar(&AvatarOptions {
        bind_eyes: true,
        ..Default::default()
    });
    let body = avatar.add_path("Body")?;
    let mut original = Mesh::new("body", vec![Vec3::ZERO, Vec3::X]);
    original.add_empty_blend_shape("vrc.lowerlid_left");
    avatar.mesh_renderer_or_insert(body)?.shared_mesh =
        Some(StoredAsset::at("Assets/Models/Alice/body.asset", original));
    let mut store = MemoryAssetStore::new();
    let config = PatchConfig::new(OUTPUT_DIR, true);

    let report = apply_workarounds(&mut avatar, &mut store, &config)?;

    let mesh = body_mesh(&avatar).unwrap();
    let names: Vec<_> = mesh.value.blend_shapes.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["vrc.lowerlid_left", "vrc.blink_right", "vrc.lowerlid_right", "vrc.blink_left"]
    );
    assert_eq!(report.added_blend_shapes.len(), 3);
    assert!(auto_eye_movement_detected(&avatar));

    let again = apply_workarounds(&mut avatar, &mut store, &config)?;
    assert!(again.is_unchanged());
    assert_eq!(body_mesh(&avatar).unwrap().value.blend_shape_count(), 4);
    Ok(())
}

#[test]
fn test_failed_disable_can_be_retried() -> anyhow::Result<()> {
    let mut avatar = build_avatar(&AvatarOptions {
        bind_eyes: true,
        ..Default::default()
    });
    let mut store = MemoryAssetStore::new();
    apply_workarounds(&mut avatar, &mut store, &PatchConfig::new(OUTPUT_DIR, true))?;
    let disable = PatchConfig::new(OUTPUT_DIR, false);

    let mut failing = MemoryAssetStore::new();
    failing.fail_writes_to(output_path("AliceRig.asset"));
    let result = apply_workarounds(&mut avatar, &mut failing, &disable);

    // Nothing was renamed, the heuristic still matches
    assert!(matches!(result, Err(PatchError::AssetPersistence { .. })));
    assert_eq!(
        avatar.rig_description().value.bound_node_name(HumanBone::LeftEye),
        Some("LeftEye")
    );
    assert!(avatar.resolve_bone(HumanBone::LeftEye).is_some());
    assert!(auto_eye_movement_detected(&avatar));

    let report = apply_workarounds(&mut avatar, &mut store, &disable)?;

    assert_eq!(report.lowercased_eyes, vec![HumanBone::RightEye, HumanBone::LeftEye]);
    for eye in [HumanBone::LeftEye, HumanBone::RightEye] {
        assert!(avatar.resolve_bone(eye).is_some(), "{} unresolved", eye);
    }
    assert!(report.rig_rebuilt);
    assert!(!auto_eye_movement_detected(&avatar));
    Ok(())
}

#[test]
fn test_failed_gap_fill_reuses_placeholders() -> anyhow::Result<()> {
    let mut avatar = build_avatar(&AvatarOptions {
        missing: vec![HumanBone::LeftIndexIntermediate],
        ..Default::default()
    });
    let shared = avatar.rig_description().clone();
    let config = PatchConfig::new(OUTPUT_DIR, false);

    let mut failing = MemoryAssetStore::new();
    failing.fail_writes_to(output_path("AliceRig.asset"));
    let result = apply_workarounds(&mut avatar, &mut failing, &config);

    // Placeholder nodes stay behind, the description is untouched
    assert!(matches!(result, Err(PatchError::AssetPersistence { .. })));
    assert_eq!(avatar.rig_description(), &shared);
    assert!(avatar.find_descendant(avatar.root(), "vrc.LeftIndexDistal").is_some());
    let nodes = avatar.node_count();

    let mut store = MemoryAssetStore::new();
    let report = apply_workarounds(&mut avatar, &mut store, &config)?;

    assert_eq!(report.created_nodes, 0);
    assert_eq!(avatar.node_count(), nodes);
    assert_eq!(
        report.synthesized_bones,
        vec![HumanBone::LeftIndexIntermediate, HumanBone::LeftIndexDistal]
    );
    assert_eq!(
        parent_name(&avatar, "vrc.LeftIndexDistal").as_deref(),
        Some("vrc.LeftIndexIntermediate")
    );
    assert!(avatar.resolve_bone(HumanBone::LeftIndexDistal).is_some());
    assert!(report.rig_rebuilt);
    Ok(())
}

#[test]
fn test_run_against_project_directory() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let mut avatar = build_avatar(&AvatarOptions {
        upper_chest: true,
        bind_eyes: true,
        ..Default::default()
    });
    let mut store = DirectoryAssetStore::new(temp_dir.path());
    let config = PatchConfig::from_toml_str("output_dir = \"Assets/Out\"\nenable_auto_eye_movement = true\n")?;

    let report = apply_workarounds(&mut avatar, &mut store, &config)?;

    for path in &report.assets_written {
        assert!(temp_dir.path().join(path).exists(), "{} not on disk", path.display());
    }
    let persisted: RigDescription = store.load(&output_path("AliceRig.asset"))?;
    assert_eq!(&persisted, &avatar.rig_description().value);
    assert!(store.take_dirty().contains(&output_path("AliceAvatar.asset")));
    Ok(())
}
