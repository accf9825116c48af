mod common;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use kiln::errors::{GenerationStage, PipelineError, RigError, ValidationError};
use kiln::pipeline::{
    AssetStore, GenerationSession, MemoryStore, Orchestrator, PipelineStep, ReplayProvider,
};
use kiln::rig::RigJoint;
use kiln::runtime::SceneRuntime;
use kiln::settings::{PipelineSettings, Settings};

type Viewer = Rc<RefCell<SceneRuntime>>;

fn provider() -> ReplayProvider {
    ReplayProvider::new(format!("```javascript\n{}\n```", common::RIGGED_SCENE))
        .with_components(common::components())
        .with_rig(common::rig())
        .with_improved_code(common::TWO_PART_SCENE)
        .with_animation_code(common::BOB_CLIP)
}

type TestOrchestrator = Orchestrator<ReplayProvider, Arc<MemoryStore>, Viewer>;

fn orchestrator(provider: ReplayProvider) -> (TestOrchestrator, Arc<MemoryStore>, Viewer) {
    common::init_logging();
    let store = Arc::new(MemoryStore::new());
    let viewer = Rc::new(RefCell::new(SceneRuntime::headless(&Settings::default())));
    let orchestrator = Orchestrator::new(
        provider,
        Arc::clone(&store),
        Rc::clone(&viewer),
        PipelineSettings::default(),
    );
    (orchestrator, store, viewer)
}

// ============================================================================
// Forward pipeline
// ============================================================================

#[tokio::test]
async fn test_start_reaches_render() {
    let (mut orchestrator, _store, viewer) = orchestrator(provider());
    orchestrator.start("a robot").await.unwrap();

    let session = orchestrator.session();
    assert_eq!(session.step, PipelineStep::Render);
    assert_eq!(session.prompt, "a robot");
    assert!(session.requested_animation.is_none());
    assert!(session.image.is_some());
    assert_eq!(session.components.as_ref().map(Vec::len), Some(2));
    assert!(session.has_rig());
    assert!(!session.is_loading);
    assert!(session.error.is_none());
    // Fence stripped before it reaches the viewer
    assert_eq!(session.scene_source.as_deref(), Some(common::RIGGED_SCENE.trim()));

    assert_eq!(
        orchestrator.provider().calls(),
        vec![
            GenerationStage::Image,
            GenerationStage::Analysis,
            GenerationStage::Rig,
            GenerationStage::SceneCode,
        ]
    );
    assert!(viewer.borrow().mounted_root().is_some());
}

#[tokio::test]
async fn test_requested_animation_runs_after_render() {
    let (mut orchestrator, store, viewer) = orchestrator(provider());
    orchestrator.start("a walking robot").await.unwrap();

    let session = orchestrator.session();
    assert_eq!(session.prompt, "a robot");
    assert_eq!(session.requested_animation.as_deref(), Some("walking"));
    assert_eq!(session.animation_source.as_deref(), Some(common::BOB_CLIP.trim()));
    assert_eq!(orchestrator.provider().calls().last(), Some(&GenerationStage::Animation));

    let saved = store.list_animations();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].name, "walking");

    assert!(viewer.borrow_mut().playback().is_some_and(|p| p.is_playing()));
}

#[tokio::test]
async fn test_unrigged_asset_skips_requested_animation() {
    let provider = ReplayProvider::new(common::TWO_PART_SCENE).with_components(common::components());
    let (mut orchestrator, store, _viewer) = orchestrator(provider);
    orchestrator.start("a dancing figure").await.unwrap();

    assert_eq!(orchestrator.session().step, PipelineStep::Render);
    assert!(orchestrator.session().rig.is_none());
    assert!(orchestrator.session().animation_source.is_none());
    assert!(!orchestrator.provider().calls().contains(&GenerationStage::Animation));
    assert!(store.list_animations().is_empty());
}

#[tokio::test]
async fn test_stage_failure_returns_to_prompt() {
    let (mut orchestrator, _store, viewer) = orchestrator(provider().failing_at(GenerationStage::Analysis));
    let err = orchestrator.start("a robot").await.unwrap_err();
    assert!(matches!(err, PipelineError::Generation(ref e) if e.stage == GenerationStage::Analysis));

    let session = orchestrator.session();
    assert_eq!(session.step, PipelineStep::Prompt);
    assert!(!session.is_loading);
    assert!(session.image.is_none());
    assert!(session.components.is_none());
    assert!(session.scene_source.is_none());
    assert!(session.error.as_deref().is_some_and(|e| e.contains("image analysis failed")));
    assert_eq!(
        orchestrator.provider().calls(),
        vec![GenerationStage::Image, GenerationStage::Analysis]
    );
    assert!(viewer.borrow().mounted_root().is_none());
}

#[tokio::test]
async fn test_invalid_rig_fails_pipeline() {
    let rig = vec![
        RigJoint::new("hips", None, [0.0; 3]),
        RigJoint::new("tail", None, [0.0; 3]),
    ];
    let (mut orchestrator, _store, _viewer) = orchestrator(provider().with_rig(rig));
    let err = orchestrator.start("a robot").await.unwrap_err();
    assert!(matches!(err, PipelineError::Rig(RigError::MultipleRoots(_))));
    assert_eq!(orchestrator.session().step, PipelineStep::Prompt);
    assert!(orchestrator.session().error.is_some());
}

#[tokio::test]
async fn test_scene_code_without_return_fails() {
    let (mut orchestrator, _store, _viewer) = orchestrator(ReplayProvider::new("let g = THREE.Group();"));
    let err = orchestrator.start("a box").await.unwrap_err();
    assert!(matches!(err, PipelineError::Generation(ref e) if e.stage == GenerationStage::SceneCode));
    assert_eq!(orchestrator.session().step, PipelineStep::Prompt);
}

// ============================================================================
// Side operations
// ============================================================================

#[tokio::test]
async fn test_improve_replaces_source() {
    let (mut orchestrator, _store, viewer) = orchestrator(provider());
    orchestrator.start("a robot").await.unwrap();
    orchestrator.improve("make it shorter").await.unwrap();

    assert_eq!(orchestrator.session().step, PipelineStep::Render);
    assert_eq!(orchestrator.session().scene_source.as_deref(), Some(common::TWO_PART_SCENE.trim()));
    assert_eq!(viewer.borrow().stats().live_geometries, 2);
}

#[tokio::test]
async fn test_improve_failure_keeps_render() {
    let (mut orchestrator, _store, _viewer) = orchestrator(provider().failing_at(GenerationStage::Improve));
    orchestrator.start("a robot").await.unwrap();
    let before = orchestrator.session().scene_source.clone();

    assert!(orchestrator.improve("add wings").await.is_err());
    let session = orchestrator.session();
    assert_eq!(session.step, PipelineStep::Render);
    assert_eq!(session.scene_source, before);
    assert!(!session.is_loading);
    assert!(session.error.is_some());

    orchestrator.dismiss_error();
    assert!(orchestrator.session().error.is_none());
}

#[tokio::test]
async fn test_improve_requires_render() {
    let (mut orchestrator, _store, _viewer) = orchestrator(provider());
    assert!(matches!(
        orchestrator.improve("anything").await,
        Err(PipelineError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_animate_failure_keeps_asset() {
    let (mut orchestrator, store, viewer) = orchestrator(provider().failing_at(GenerationStage::Animation));
    orchestrator.start("a robot").await.unwrap();

    assert!(orchestrator.animate("waving").await.is_err());
    let session = orchestrator.session();
    assert_eq!(session.step, PipelineStep::Render);
    assert!(session.scene_source.is_some());
    assert!(session.animation_source.is_none());
    assert!(store.list_animations().is_empty());
    assert!(viewer.borrow().mounted_root().is_some());
}

#[tokio::test]
async fn test_animate_requires_rig() {
    let (mut orchestrator, _store, _viewer) = orchestrator(ReplayProvider::new(common::TWO_PART_SCENE));
    orchestrator.start("a figure").await.unwrap();
    assert!(matches!(
        orchestrator.animate("waving").await,
        Err(PipelineError::InvalidState(_))
    ));
}

// ============================================================================
// Library
// ============================================================================

#[tokio::test]
async fn test_save_load_and_reset() {
    let (mut orchestrator, store, viewer) = orchestrator(provider());
    orchestrator.start("a robot").await.unwrap();
    let saved = orchestrator.save_blueprint_as_new("Robot").unwrap();
    assert_eq!(store.list_blueprints().len(), 1);
    assert_eq!(orchestrator.session().loaded_blueprint_id.as_deref(), Some(saved.id.as_str()));

    orchestrator.reset();
    assert_eq!(*orchestrator.session(), GenerationSession::default());
    assert!(viewer.borrow().mounted_root().is_none());

    orchestrator.load_blueprint(&saved.id).unwrap();
    let session = orchestrator.session();
    assert_eq!(session.step, PipelineStep::Render);
    assert_eq!(session.prompt, "a robot");
    assert_eq!(session.loaded_blueprint_id.as_deref(), Some(saved.id.as_str()));
    assert!(session.has_rig());
    assert!(viewer.borrow().mounted_root().is_some());

    orchestrator.reset();
    assert!(orchestrator.session().loaded_blueprint_id.is_none());
}

#[tokio::test]
async fn test_update_blueprint_overwrites_in_place() {
    let (mut orchestrator, store, _viewer) = orchestrator(provider());
    orchestrator.start("a robot").await.unwrap();
    let saved = orchestrator.save_blueprint_as_new("").unwrap();
    assert_eq!(saved.name, "a robot");

    orchestrator.improve("shorter").await.unwrap();
    let updated = orchestrator.update_blueprint().unwrap();
    assert_eq!(updated.id, saved.id);
    assert_eq!(store.list_blueprints().len(), 1);
    assert_eq!(store.get_blueprint(&saved.id).unwrap().scene_source, common::TWO_PART_SCENE.trim());

    orchestrator.delete_blueprint(&saved.id);
    assert!(orchestrator.session().loaded_blueprint_id.is_none());
    assert!(matches!(
        orchestrator.load_blueprint(&saved.id),
        Err(PipelineError::BlueprintNotFound(_))
    ));
}

#[tokio::test]
async fn test_load_animation_applies_stored_clip() {
    let (mut orchestrator, store, viewer) = orchestrator(provider());
    orchestrator.start("a jumping robot").await.unwrap();
    let id = store.list_animations()[0].id.clone();

    orchestrator.start("a robot").await.unwrap();
    orchestrator.load_animation(&id).unwrap();
    assert_eq!(orchestrator.session().animation_source.as_deref(), Some(common::BOB_CLIP.trim()));
    assert!(viewer.borrow_mut().playback().is_some());

    orchestrator.delete_animation(&id);
    assert!(matches!(
        orchestrator.load_animation(&id),
        Err(PipelineError::AnimationNotFound(_))
    ));
}

#[test]
fn test_rejected_import_leaves_library_unchanged() {
    let (mut orchestrator, store, _viewer) = orchestrator(provider());
    orchestrator
        .import_blueprint(r#"{"id": "lamp", "name": "Lamp", "prompt": "a lamp", "threeJsCode": "return THREE.Group();"}"#)
        .unwrap();
    orchestrator
        .import_animation(r#"{"id": "bob", "name": "bob", "code": "return 1;"}"#)
        .unwrap();
    let blueprints = store.list_blueprints();
    let animations = store.list_animations();

    // Same id as the stored record, but without a prompt
    let result = orchestrator.import_blueprint(r#"{"id": "lamp", "name": "Broken", "threeJsCode": "return THREE.Group();"}"#);
    assert!(matches!(
        result,
        Err(PipelineError::Validation(ValidationError::MissingField("prompt")))
    ));
    assert!(matches!(
        orchestrator.import_blueprint("not json"),
        Err(PipelineError::Validation(ValidationError::MalformedJson(_)))
    ));
    assert!(matches!(
        orchestrator.import_animation(r#"{"id": "bob", "name": "broken"}"#),
        Err(PipelineError::Validation(ValidationError::MissingField("code")))
    ));

    assert_eq!(store.list_blueprints(), blueprints);
    assert_eq!(store.list_animations(), animations);
    assert_eq!(store.get_blueprint("lamp").unwrap().name, "Lamp");
}
