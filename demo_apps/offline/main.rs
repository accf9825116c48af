//! Offline pipeline run.
//!
//! Drives the whole generation pipeline against canned provider output,
//! mounts the result in a headless runtime and plays it for a few seconds.
//!
//! ```text
//! cargo run -p offline -- "a waving robot" [store-dir]
//! ```
//!
//! `KILN_SETTINGS` may point to a JSON settings file.

use std::cell::RefCell;
use std::rc::Rc;

use kiln::pipeline::{AssetComponent, JsonFileStore, RecordKind, export_file_name};
use kiln::rig::RigJoint;
use kiln::{Orchestrator, ReplayProvider, SceneRuntime, Settings};

const ROBOT: &str = r##"
```javascript
let metal = THREE.MeshStandardMaterial(#{ color: "#8a9bb0", metalness: 0.6, roughness: 0.35 });
let accent = THREE.MeshStandardMaterial(#{ color: 0xf97316 });

let root = THREE.Group();
root.name = "robot";

let hips = THREE.Bone();
hips.name = "hips";
let spine = THREE.Bone();
spine.name = "spine";
spine.set_position(0, 0.8, 0);
let head = THREE.Bone();
head.name = "head";
head.set_position(0, 0.7, 0);
let arm = THREE.Bone();
arm.name = "arm_r";
arm.set_position(0.5, 0.5, 0);
hips.add(spine);
spine.add(head, arm);

let body = THREE.SkinnedMesh(THREE.CylinderGeometry(0.35, 0.4, 1.6, 24), metal);
body.name = "body";
body.set_position(0, 0.8, 0);
let visor = THREE.Mesh(THREE.BoxGeometry(0.5, 0.15, 0.1), accent);
visor.set_position(0, 1.7, 0.3);

root.add(hips, body, visor);
body.bind(THREE.Skeleton([hips, spine, head, arm]));

let center = THREE.Box3().set_from_object(root).get_center();
root.position = root.position - center;
return root;
```
"##;

const WAVE: &str = r##"
let arm = bones[3];
let times = [0.0, 0.4, 0.8, 1.2];
let values = [0, 0, 0,  0, 0, 1.2,  0, 0, 0.4,  0, 0, 1.2];
return THREE.AnimationClip("wave", 1.2, [
    THREE.VectorKeyframeTrack(".bones[" + arm + "].rotation", times, values),
    THREE.NumberKeyframeTrack(bones[2] + ".rotation[y]", [0, 0.6, 1.2], [-0.3, 0.3, -0.3])
]);
"##;

fn replay() -> ReplayProvider {
    ReplayProvider::new(ROBOT)
        .with_components(vec![
            AssetComponent::new("body", "cylinder", "#8A9BB0"),
            AssetComponent::new("visor", "box", "#F97316"),
        ])
        .with_rig(vec![
            RigJoint::new("hips", None, [0.0, 0.0, 0.0]),
            RigJoint::new("spine", Some("hips"), [0.0, 0.8, 0.0]),
            RigJoint::new("head", Some("spine"), [0.0, 0.7, 0.0]),
            RigJoint::new("arm_r", Some("spine"), [0.5, 0.5, 0.0]),
        ])
        .with_improved_code(ROBOT)
        .with_animation_code(WAVE)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match std::env::var("KILN_SETTINGS") {
        Ok(path) => Settings::load(path)?,
        Err(_) => Settings::default(),
    };

    let mut args = std::env::args().skip(1);
    let prompt = args.next().unwrap_or_else(|| "a waving robot".to_string());
    let store_dir = args
        .next()
        .map_or_else(|| std::env::temp_dir().join("kiln-offline"), Into::into);

    let viewer = Rc::new(RefCell::new(SceneRuntime::headless(&settings)));
    viewer.borrow_mut().on_event(|event| log::info!("Runtime event: {event:?}"));

    let store = JsonFileStore::new(store_dir);
    let mut pipeline = Orchestrator::new(replay(), store, Rc::clone(&viewer), settings.pipeline.clone());

    pipeline.start(&prompt).await?;
    if pipeline.session().animation_source.is_none() && pipeline.session().has_rig() {
        let preset = pipeline
            .preset_animations()
            .first()
            .cloned()
            .unwrap_or_else(|| "Idle breathing".to_string());
        pipeline.animate(&preset).await?;
    }

    {
        let mut viewer = viewer.borrow_mut();
        for _ in 0..180 {
            viewer.frame(1.0 / 60.0);
        }
        let stats = viewer.stats();
        let frame = viewer.backend().last_frame();
        log::info!(
            "{} frames, {} draw calls, {} triangles, {} live geometries, {} live materials",
            stats.frames,
            frame.draw_calls,
            frame.triangles,
            stats.live_geometries,
            stats.live_materials
        );
        if let Some(playback) = viewer.playback() {
            log::info!("Clip `{}` at {:.2}s", playback.clip_name(), playback.time());
        }
    }

    let blueprint = pipeline.save_blueprint_as_new(&prompt)?;
    log::info!(
        "Saved blueprint `{}` to {} (export as {})",
        blueprint.name,
        pipeline.store().dir().display(),
        export_file_name(&blueprint.name, RecordKind::Blueprint)
    );

    pipeline.reset();
    let stats = viewer.borrow().stats();
    log::info!(
        "After reset: {} live geometries, {} live materials",
        stats.live_geometries,
        stats.live_materials
    );
    Ok(())
}
