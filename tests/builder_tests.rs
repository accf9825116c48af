mod common;

use kiln::assets::AssetServer;
use kiln::builder::AssetBuilder;
use kiln::errors::BuildError;
use kiln::scene::Scene;
use kiln::script::ScriptHost;
use kiln::settings::ScriptSettings;

fn build(source: &str) -> (Scene, AssetServer, Result<kiln::BuiltAsset, BuildError>) {
    common::init_logging();
    let host = ScriptHost::default();
    let mut scene = Scene::new();
    let assets = AssetServer::new();
    let result = AssetBuilder::build(&host, source, &mut scene, &assets);
    (scene, assets, result)
}

// ============================================================================
// Successful builds
// ============================================================================

#[test]
fn test_group_with_meshes_is_mounted() {
    let (scene, assets, result) = build(common::TWO_PART_SCENE);
    let built = result.expect("scene should build");

    let root = scene.get_node(built.root).unwrap();
    assert_eq!(root.name, "figure");
    assert_eq!(root.children().len(), 2);
    assert!(scene.root_nodes.contains(&built.root));

    assert_eq!(built.resources.geometries.len(), 2);
    // Both meshes share one material
    assert_eq!(built.resources.materials.len(), 1);

    let counters = assets.counters();
    assert_eq!(counters.geometries.live, 2);
    assert_eq!(counters.materials.live, 1);
}

#[test]
fn test_transforms_are_applied() {
    let (scene, _assets, result) = build(common::TWO_PART_SCENE);
    let built = result.unwrap();

    let head = scene.find_by_name(built.root, "head").unwrap();
    let position = scene.world_position(head).unwrap();
    assert!((position.y - 1.5).abs() < 1e-5);
}

#[test]
fn test_unreachable_resources_are_released() {
    let source = r#"
        let unused_geometry = THREE.TorusGeometry(1, 0.2);
        let unused_material = THREE.MeshStandardMaterial(#{ color: 0xff0000 });
        let orphan = THREE.Mesh(THREE.BoxGeometry(), THREE.MeshStandardMaterial());
        let root = THREE.Group();
        root.add(THREE.Mesh(THREE.SphereGeometry(1), THREE.MeshStandardMaterial()));
        return root;
    "#;
    let (_scene, assets, result) = build(source);
    let built = result.unwrap();
    assert_eq!(built.resources.geometries.len(), 1);

    let counters = assets.counters();
    assert_eq!(counters.geometries.created, 3);
    assert_eq!(counters.geometries.live, 1);
    assert_eq!(counters.materials.created, 3);
    assert_eq!(counters.materials.live, 1);
}

#[test]
fn test_only_returned_subtree_is_grafted() {
    let source = r#"
        let stray = THREE.Group();
        stray.name = "stray";
        let root = THREE.Group();
        root.name = "kept";
        return root;
    "#;
    let (scene, _assets, result) = build(source);
    let built = result.unwrap();
    assert_eq!(scene.nodes.len(), 1);
    assert_eq!(scene.get_node(built.root).unwrap().name, "kept");
}

#[test]
fn test_skinned_mesh_keeps_its_skeleton() {
    let (scene, _assets, result) = build(common::RIGGED_SCENE);
    let built = result.unwrap();

    let skinned = scene.find_skinned(built.root).unwrap();
    let skin = scene.get_node(skinned).unwrap().skin.as_ref().unwrap();
    let skeleton = &scene.skeletons[skin.skeleton];
    assert_eq!(skeleton.bones.len(), 2);
    for bone in &skeleton.bones {
        assert!(scene.is_ancestor(built.root, *bone));
    }
    assert_eq!(built.resources.skeletons.len(), 1);
    assert!(built.resources.skeletons.contains(&skin.skeleton));
}

#[test]
fn test_box3_centers_subtree() {
    let source = r#"
        let root = THREE.Group();
        let mesh = THREE.Mesh(THREE.BoxGeometry(2, 2, 2), THREE.MeshStandardMaterial());
        mesh.set_position(4, 0, 0);
        root.add(mesh);
        let center = THREE.Box3().set_from_object(root).get_center();
        mesh.position = mesh.position - center;
        return root;
    "#;
    let (scene, _assets, result) = build(source);
    let built = result.unwrap();
    let mesh = scene.get_node(built.root).unwrap().children()[0];
    assert!(scene.world_position(mesh).unwrap().length() < 1e-5);
}

#[test]
fn test_segment_counts_are_capped() {
    let source = r#"
        return THREE.Mesh(THREE.SphereGeometry(1, 1000000, 1000000), THREE.MeshStandardMaterial());
    "#;
    let (scene, assets, result) = build(source);
    let built = result.unwrap();
    let mesh = scene.get_node(built.root).unwrap().mesh.as_ref().unwrap();
    let geometry = assets.get_geometry(mesh.geometry).unwrap();

    let cap = ScriptSettings::default().max_segments as usize;
    assert_eq!(geometry.vertex_count(), (cap + 1) * (cap + 1));
}

#[test]
fn test_property_assignment() {
    let source = r#"
        let root = THREE.Group();
        root.name = "arm";
        root.name = root.name + "_left";
        let offset = THREE.Vector3();
        offset.x = 2;
        offset.y = 0.5;
        offset.z = offset.x + offset.y;
        root.position = offset;
        return root;
    "#;
    let (scene, _assets, result) = build(source);
    let built = result.unwrap();
    let root = scene.get_node(built.root).unwrap();
    assert_eq!(root.name, "arm_left");
    assert_eq!(root.transform.position, glam::Vec3::new(2.0, 0.5, 2.5));
}

// ============================================================================
// Failed builds
// ============================================================================

#[test]
fn test_non_node_results_rejected() {
    for source in ["return 42;", "return [THREE.Group()];", "let x = 1;", "return THREE.BoxGeometry();"] {
        let (scene, assets, result) = build(source);
        assert!(
            matches!(result, Err(BuildError::NotANode(_))),
            "`{source}` should be rejected, got {result:?}"
        );
        assert!(scene.nodes.is_empty());
        assert_eq!(assets.counters().geometries.live, 0);
    }
}

#[test]
fn test_thrown_error_releases_everything() {
    let source = r#"
        let mesh = THREE.Mesh(THREE.BoxGeometry(), THREE.MeshStandardMaterial());
        throw "generated code gave up";
    "#;
    let (scene, assets, result) = build(source);
    match result {
        Err(BuildError::Script(message)) => assert!(message.contains("generated code gave up")),
        other => panic!("expected a script error, got {other:?}"),
    }
    assert!(scene.nodes.is_empty());
    let counters = assets.counters();
    assert_eq!(counters.geometries.created, 1);
    assert_eq!(counters.geometries.live, 0);
    assert_eq!(counters.materials.live, 0);
}

#[test]
fn test_syntax_error_is_script_error() {
    let (_scene, _assets, result) = build("let root = THREE.Group(;\nreturn root;");
    assert!(matches!(result, Err(BuildError::Script(_))));
}

#[test]
fn test_negative_dimension_rejected() {
    let (_scene, assets, result) = build("return THREE.Mesh(THREE.BoxGeometry(-1, 1, 1), THREE.MeshStandardMaterial());");
    assert!(matches!(result, Err(BuildError::Script(_))));
    assert_eq!(assets.counters().materials.live, 0);
}

#[test]
fn test_bone_outside_returned_subtree_rejected() {
    let source = r#"
        let bone = THREE.Bone();
        bone.name = "loose";
        let mesh = THREE.SkinnedMesh(THREE.BoxGeometry(), THREE.MeshStandardMaterial());
        mesh.bind(THREE.Skeleton([bone]));
        let root = THREE.Group();
        root.add(mesh);
        return root;
    "#;
    let (scene, assets, result) = build(source);
    match result {
        Err(BuildError::InvalidHierarchy(message)) => assert!(message.contains("loose")),
        other => panic!("expected an invalid hierarchy, got {other:?}"),
    }
    assert!(scene.nodes.is_empty());
    assert_eq!(assets.counters().geometries.live, 0);
}

#[test]
fn test_runaway_script_is_stopped() {
    let (_scene, _assets, result) = build("loop { } return THREE.Group();");
    assert!(matches!(result, Err(BuildError::Script(_))));
}
