mod common;

use std::sync::Arc;

use kiln::animation::{AnimationAction, AnimationBinder, TargetPath};
use kiln::errors::BuildError;
use kiln::script::ScriptHost;

fn bones() -> Vec<String> {
    vec!["hips".to_string(), "spine".to_string()]
}

fn compile(source: &str) -> Result<kiln::AnimationClip, BuildError> {
    AnimationBinder::compile(&ScriptHost::default(), source, &bones())
}

// ============================================================================
// Compilation
// ============================================================================

#[test]
fn test_compile_clip_with_bone_names() {
    let clip = compile(common::BOB_CLIP).unwrap();
    assert_eq!(clip.name, "bob");
    assert!((clip.duration - 1.0).abs() < f32::EPSILON);
    assert_eq!(clip.tracks.len(), 1);
    assert_eq!(clip.target_names(), vec!["spine"]);
    assert_eq!(clip.tracks[0].target.path, TargetPath::Translation);
}

#[test]
fn test_duration_defaults_to_last_keyframe() {
    let source = r#"
        let sway = THREE.NumberKeyframeTrack(".bones[hips].rotation[z]", [0, 0.75, 1.5], [0, 0.2, 0]);
        let turn = THREE.QuaternionKeyframeTrack("spine.quaternion", [0, 2], [0, 0, 0, 1,  0, 0.7071, 0, 0.7071]);
        return THREE.AnimationClip("sway", [sway, turn]);
    "#;
    let clip = compile(source).unwrap();
    assert!((clip.duration - 2.0).abs() < f32::EPSILON);
    assert_eq!(clip.target_names(), vec!["hips", "spine"]);
}

#[test]
fn test_non_clip_results_rejected() {
    for source in ["return 1;", "return bones;", "return THREE.Group();"] {
        let result = compile(source);
        assert!(matches!(result, Err(BuildError::NotAClip(_))), "`{source}` gave {result:?}");
    }
}

#[test]
fn test_empty_clip_rejected() {
    assert_eq!(
        compile(r#"return THREE.AnimationClip("still", 1.0, []);"#).unwrap_err(),
        BuildError::EmptyClip("still".to_string())
    );
}

#[test]
fn test_invalid_tracks_reported_as_typed_errors() {
    let cases = [
        // values do not match 3 per keyframe
        r#"THREE.VectorKeyframeTrack("hips.position", [0, 1], [0, 0, 0, 1])"#,
        // times must not decrease
        r#"THREE.NumberKeyframeTrack("hips.position.y", [1, 0], [0, 1])"#,
        // unknown property
        r#"THREE.VectorKeyframeTrack("hips.colour", [0], [0, 0, 0])"#,
        // quaternion track on a position
        r#"THREE.QuaternionKeyframeTrack("hips.position", [0], [0, 0, 0, 1])"#,
        // zero quaternion has no rotation to normalize
        r#"THREE.QuaternionKeyframeTrack("hips.quaternion", [0, 1], [0, 0, 0, 0, 0, 0, 0, 1])"#,
    ];
    for track in cases {
        let source = format!("let t = {track};\nreturn THREE.AnimationClip(\"bad\", [t]);");
        let result = compile(&source);
        assert!(
            matches!(result, Err(BuildError::InvalidTrack { .. })),
            "`{track}` gave {result:?}"
        );
    }
}

#[test]
fn test_script_errors_surface_as_script_errors() {
    assert!(matches!(compile("throw \"no clip for you\";"), Err(BuildError::Script(_))));
    assert!(matches!(compile("return THREE.AnimationClip(\"x\", 1.0, [42]);"), Err(BuildError::Script(_))));
}

// ============================================================================
// Playback
// ============================================================================

#[test]
fn test_loop_wraps_time() {
    let clip = Arc::new(compile(common::BOB_CLIP).unwrap());
    let mut action = AnimationAction::new(clip);
    action.play();
    action.update(1.25);
    assert!((action.time - 0.25).abs() < 1e-5);
}

#[test]
fn test_restart_rewinds_and_plays() {
    let clip = Arc::new(compile(common::BOB_CLIP).unwrap());
    let mut action = AnimationAction::new(clip);
    action.play();
    action.update(0.7);
    action.pause();
    assert!(!action.is_playing());

    action.restart();
    assert!(action.is_playing());
    assert!(action.time.abs() < f32::EPSILON);
}

#[test]
fn test_pause_freezes_time() {
    let clip = Arc::new(compile(common::BOB_CLIP).unwrap());
    let mut action = AnimationAction::new(clip);
    action.play();
    action.update(0.4);
    action.pause();
    action.update(0.4);
    assert!((action.time - 0.4).abs() < 1e-6);
    action.play();
    action.update(0.1);
    assert!((action.time - 0.5).abs() < 1e-6);
}
