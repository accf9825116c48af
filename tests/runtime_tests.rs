mod common;

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use kiln::errors::BuildError;
use kiln::runtime::{RenderBackend, RuntimeEvent, SceneRuntime, framing_distance};
use kiln::settings::Settings;

fn runtime() -> SceneRuntime {
    common::init_logging();
    SceneRuntime::headless(&Settings::default())
}

fn recorder(runtime: &mut SceneRuntime) -> Rc<RefCell<Vec<RuntimeEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    runtime.on_event(move |event| sink.borrow_mut().push(event.clone()));
    events
}

// ============================================================================
// Resource lifecycle
// ============================================================================

#[test]
fn test_rebuilds_do_not_grow_live_resources() {
    let mut runtime = runtime();
    let base_nodes = runtime.stats().nodes;

    for _ in 0..10 {
        runtime.set_scene_source(common::TWO_PART_SCENE).unwrap();
        runtime.frame(1.0 / 60.0);

        let stats = runtime.stats();
        assert_eq!(stats.live_geometries, 2);
        assert_eq!(stats.live_materials, 1);
        assert_eq!(stats.nodes, base_nodes + 3);
    }

    let stats = runtime.stats();
    assert_eq!(stats.geometries_created, 20);
    assert_eq!(stats.geometries_disposed, 18);
    assert_eq!(stats.materials_created, 10);
    assert_eq!(stats.materials_disposed, 9);
}

#[test]
fn test_clear_releases_everything() {
    let mut runtime = runtime();
    let base_nodes = runtime.stats().nodes;
    runtime.set_scene_source(common::RIGGED_SCENE).unwrap();
    runtime.set_animation_source(common::BOB_CLIP).unwrap();

    runtime.clear();
    let stats = runtime.stats();
    assert_eq!(stats.live_geometries, 0);
    assert_eq!(stats.live_materials, 0);
    assert_eq!(stats.nodes, base_nodes);
    assert_eq!(stats.geometries_created, stats.geometries_disposed);
    assert!(runtime.scene().skeletons.is_empty());
    assert!(runtime.mounted_root().is_none());
    assert!(runtime.scene_source().is_none());
    assert!(runtime.animation_source().is_none());
    assert!(runtime.playback().is_none());
}

#[test]
fn test_drop_releases_mounted_asset() {
    let mut runtime = runtime();
    runtime.set_scene_source(common::TWO_PART_SCENE).unwrap();
    let assets = runtime.assets().clone();
    assert_eq!(assets.counters().geometries.live, 2);

    drop(runtime);
    let counters = assets.counters();
    assert_eq!(counters.geometries.live, 0);
    assert_eq!(counters.materials.live, 0);
    assert_eq!(counters.geometries.disposed, counters.geometries.created);
}

#[test]
fn test_failed_rebuild_leaves_nothing_mounted() {
    let mut runtime = runtime();
    runtime.set_scene_source(common::TWO_PART_SCENE).unwrap();

    let err = runtime.set_scene_source("return 7;").unwrap_err();
    assert!(matches!(err, BuildError::NotANode(_)));
    assert!(runtime.mounted_root().is_none());
    assert_eq!(runtime.stats().live_geometries, 0);
    assert_eq!(runtime.scene_source(), Some("return 7;"));

    // The loop keeps running
    runtime.frame(0.016);
    runtime.set_scene_source(common::TWO_PART_SCENE).unwrap();
    assert_eq!(runtime.stats().live_geometries, 2);
}

// ============================================================================
// Camera & viewport
// ============================================================================

#[test]
fn test_camera_frames_new_asset() {
    let settings = Settings::default();
    let mut runtime = runtime();
    let source = r#"
        let mesh = THREE.Mesh(THREE.BoxGeometry(2, 2, 2), THREE.MeshStandardMaterial());
        mesh.set_position(3, 0, 0);
        let root = THREE.Group();
        root.add(mesh);
        return root;
    "#;
    runtime.set_scene_source(source).unwrap();
    runtime.frame(0.016);

    let distance = framing_distance(2.0, settings.runtime.fov, settings.runtime.framing_margin);
    let expected = Vec3::new(3.0, 0.0, distance);
    assert!(
        runtime.camera_position().distance(expected) < 1e-3,
        "camera at {:?}, expected {expected:?}",
        runtime.camera_position()
    );
    assert!(runtime.controls().target.distance(Vec3::new(3.0, 0.0, 0.0)) < 1e-4);
}

#[test]
fn test_framing_distance() {
    // 90° fov: half extent over tan(45°) is the half extent itself
    assert!((framing_distance(4.0, 90.0, 1.0) - 2.0).abs() < 1e-5);
    assert!((framing_distance(4.0, 90.0, 1.5) - 3.0).abs() < 1e-5);
    assert!(framing_distance(0.0, 75.0, 1.5).abs() < 1e-6);
}

#[test]
fn test_resize_ignores_zero_sizes() {
    let mut runtime = runtime();
    runtime.resize(0, 300);
    runtime.resize(300, 0);
    assert_eq!(runtime.backend().size(), (1280, 720));

    runtime.resize(800, 400);
    assert_eq!(runtime.backend().size(), (800, 400));
    let camera = runtime.scene().main_camera().unwrap();
    assert!((camera.aspect - 2.0).abs() < 1e-6);
}

#[test]
fn test_frame_renders_visible_meshes() {
    let mut runtime = runtime();
    runtime.set_scene_source(common::TWO_PART_SCENE).unwrap();
    runtime.frame(0.016);
    assert_eq!(runtime.backend().frames_rendered(), 1);
    assert_eq!(runtime.backend().last_frame().draw_calls, 2);

    let hidden = r#"
        let root = THREE.Group();
        root.add(THREE.Mesh(THREE.BoxGeometry(), THREE.MeshStandardMaterial()));
        root.visible = false;
        return root;
    "#;
    runtime.set_scene_source(hidden).unwrap();
    runtime.frame(0.016);
    assert_eq!(runtime.backend().last_frame().draw_calls, 0);
    assert_eq!(runtime.stats().frames, 2);
}

// ============================================================================
// Animation
// ============================================================================

#[test]
fn test_animation_drives_bones() {
    let mut runtime = runtime();
    let root = runtime.set_scene_source(common::RIGGED_SCENE).unwrap();
    assert_eq!(runtime.bone_names(), vec!["hips", "spine"]);

    runtime.set_animation_source(common::BOB_CLIP).unwrap();
    runtime.frame(0.25);

    let spine = runtime.scene().find_by_name(root, "spine").unwrap();
    let position = runtime.scene().get_node(spine).unwrap().transform.position;
    assert!((position.y - 0.25).abs() < 1e-4, "spine at {position:?}");
}

#[test]
fn test_restart_returns_to_start_and_plays() {
    let mut runtime = runtime();
    runtime.set_scene_source(common::RIGGED_SCENE).unwrap();
    runtime.set_animation_source(common::BOB_CLIP).unwrap();
    runtime.frame(0.3);

    // From playing
    let mut playback = runtime.playback().unwrap();
    assert_eq!(playback.clip_name(), "bob");
    assert!((playback.time() - 0.3).abs() < 1e-5);
    playback.restart();
    assert!(playback.is_playing());
    assert!(playback.time().abs() < 1e-6);

    // From paused
    runtime.frame(0.2);
    runtime.playback().unwrap().pause();
    runtime.frame(0.5);
    let mut playback = runtime.playback().unwrap();
    assert!(!playback.is_playing());
    assert!((playback.time() - 0.2).abs() < 1e-5);
    playback.restart();
    assert!(playback.is_playing());
    assert!(playback.time().abs() < 1e-6);
}

#[test]
fn test_non_finite_frame_steps_are_ignored() {
    let mut runtime = runtime();
    runtime.set_scene_source(common::RIGGED_SCENE).unwrap();
    runtime.set_animation_source(common::BOB_CLIP).unwrap();
    runtime.frame(0.3);

    for dt in [f32::INFINITY, f32::NEG_INFINITY, f32::NAN, -1.0] {
        runtime.frame(dt);
    }
    assert_eq!(runtime.stats().frames, 5);
    let playback = runtime.playback().unwrap();
    assert!((playback.time() - 0.3).abs() < 1e-5);
}

#[test]
fn test_animation_survives_rebuild() {
    let mut runtime = runtime();
    runtime.set_scene_source(common::RIGGED_SCENE).unwrap();
    runtime.set_animation_source(common::BOB_CLIP).unwrap();

    runtime.set_scene_source(common::RIGGED_SCENE).unwrap();
    let playback = runtime.playback().unwrap();
    assert_eq!(playback.clip_name(), "bob");
    assert!(playback.is_playing());
}

#[test]
fn test_animation_without_skinned_mesh_fails() {
    let mut runtime = runtime();
    assert_eq!(runtime.set_animation_source(common::BOB_CLIP), Err(BuildError::NoAsset));

    runtime.set_scene_source(common::TWO_PART_SCENE).unwrap();
    assert_eq!(
        runtime.set_animation_source(common::BOB_CLIP),
        Err(BuildError::MissingSkinnedMesh)
    );
    // The asset itself is untouched
    assert!(runtime.mounted_root().is_some());
    assert_eq!(runtime.stats().live_geometries, 2);
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn test_events_follow_lifecycle() {
    let mut runtime = runtime();
    let events = recorder(&mut runtime);

    let first = runtime.set_scene_source(common::RIGGED_SCENE).unwrap();
    runtime.set_animation_source(common::BOB_CLIP).unwrap();
    let _ = runtime.set_scene_source("throw \"nope\";");

    let events = events.borrow();
    assert_eq!(events[0], RuntimeEvent::AssetMounted { root: first });
    assert_eq!(
        events[1],
        RuntimeEvent::AnimationReady {
            clip: "bob".to_string(),
            duration: 1.0,
        }
    );
    assert_eq!(events[2], RuntimeEvent::AssetCleared);
    assert!(matches!(events[3], RuntimeEvent::BuildFailed(BuildError::Script(_))));
    assert_eq!(events.len(), 4);
}
