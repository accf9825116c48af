#![allow(dead_code)]

use kiln::pipeline::AssetComponent;
use kiln::rig::RigJoint;

/// Two meshes sharing one material, under a named group.
pub const TWO_PART_SCENE: &str = r##"
let material = THREE.MeshStandardMaterial(#{ color: "#3366ff", roughness: 0.5 });
let body = THREE.Mesh(THREE.BoxGeometry(1, 2, 1), material);
body.name = "body";
let head = THREE.Mesh(THREE.SphereGeometry(0.5), material);
head.name = "head";
head.set_position(0, 1.5, 0);
let root = THREE.Group();
root.name = "figure";
root.add(body, head);
return root;
"##;

/// A two-bone skinned figure.
pub const RIGGED_SCENE: &str = r##"
let root = THREE.Group();
root.name = "robot";
let hips = THREE.Bone();
hips.name = "hips";
let spine = THREE.Bone();
spine.name = "spine";
spine.set_position(0, 1, 0);
hips.add(spine);
let mesh = THREE.SkinnedMesh(THREE.CylinderGeometry(0.3, 0.3, 2), THREE.MeshStandardMaterial());
mesh.name = "body";
let skeleton = THREE.Skeleton([hips, spine]);
root.add(hips);
root.add(mesh);
mesh.bind(skeleton);
return root;
"##;

/// Moves the second bone up and back down over one second.
pub const BOB_CLIP: &str = r##"
let times = [0.0, 0.5, 1.0];
let values = [0, 0, 0,  0, 0.5, 0,  0, 0, 0];
let track = THREE.VectorKeyframeTrack(bones[1] + ".position", times, values);
return THREE.AnimationClip("bob", 1.0, [track]);
"##;

pub fn rig() -> Vec<RigJoint> {
    vec![
        RigJoint::new("hips", None, [0.0, 0.0, 0.0]),
        RigJoint::new("spine", Some("hips"), [0.0, 1.0, 0.0]),
    ]
}

pub fn components() -> Vec<AssetComponent> {
    vec![
        AssetComponent::new("body", "cylinder", "#3366FF"),
        AssetComponent::new("head", "sphere", "#FFCC00"),
    ]
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
