mod common;

use std::path::PathBuf;

use chrono::{Duration, Utc};
use kiln::errors::ValidationError;
use kiln::pipeline::store::{
    AnimationRecord, AssetStore, Blueprint, JsonFileStore, MemoryStore, RecordKind, export_animation,
    export_blueprint, export_file_name, import_animation, import_blueprint,
};

fn blueprint(id: &str, age_minutes: i64) -> Blueprint {
    Blueprint {
        id: id.to_string(),
        name: format!("Blueprint {id}"),
        prompt: "a robot".to_string(),
        image: Some(b"\x89PNG".to_vec()),
        components: common::components(),
        scene_source: common::RIGGED_SCENE.to_string(),
        rig: Some(common::rig()),
        created_at: Utc::now() - Duration::minutes(age_minutes),
    }
}

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("kiln-store-{}", uuid::Uuid::new_v4()))
}

// ============================================================================
// MemoryStore
// ============================================================================

#[test]
fn test_lists_newest_first() {
    let store = MemoryStore::new();
    store.save_blueprint(blueprint("old", 30));
    store.save_blueprint(blueprint("new", 1));
    store.save_blueprint(blueprint("mid", 10));

    let ids: Vec<String> = store.list_blueprints().into_iter().map(|b| b.id).collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
}

#[test]
fn test_save_replaces_same_id() {
    let store = MemoryStore::new();
    store.save_blueprint(blueprint("a", 5));
    let mut renamed = blueprint("a", 5);
    renamed.name = "Renamed".to_string();
    store.save_blueprint(renamed);

    assert_eq!(store.list_blueprints().len(), 1);
    assert_eq!(store.get_blueprint("a").unwrap().name, "Renamed");

    store.delete_blueprint("a");
    assert!(store.get_blueprint("a").is_none());
}

// ============================================================================
// JsonFileStore
// ============================================================================

#[test]
fn test_json_store_persists_across_instances() {
    let dir = scratch_dir();
    let original = blueprint("bp-1", 0);
    let clip = AnimationRecord::new("waving", common::BOB_CLIP.to_string());
    {
        let store = JsonFileStore::new(dir.clone());
        assert!(store.list_blueprints().is_empty());
        store.save_blueprint(original.clone());
        store.save_animation(clip.clone());
    }

    let reopened = JsonFileStore::new(dir.clone());
    assert_eq!(reopened.get_blueprint("bp-1"), Some(original));
    assert_eq!(reopened.list_animations(), vec![clip.clone()]);

    reopened.delete_animation(&clip.id);
    assert!(reopened.list_animations().is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_json_store_degrades_on_corrupt_file() {
    let dir = scratch_dir();
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("blueprints.json"), "{ not json").unwrap();

    let store = JsonFileStore::new(dir.clone());
    assert!(store.list_blueprints().is_empty());
    // A failed read never overwrites the file
    store.save_blueprint(blueprint("x", 0));
    assert_eq!(std::fs::read_to_string(dir.join("blueprints.json")).unwrap(), "{ not json");

    let _ = std::fs::remove_dir_all(&dir);
}

// ============================================================================
// Import / export
// ============================================================================

#[test]
fn test_exported_blueprint_imports_back() {
    let original = blueprint("bp-2", 3);
    let text = export_blueprint(&original);
    assert!(text.contains("\"threeJsCode\""));
    assert!(text.contains("\"createdAt\""));

    assert_eq!(import_blueprint(&text).unwrap(), original);
}

#[test]
fn test_import_accepts_data_url_image() {
    let text = r#"{
        "id": "bp-3",
        "prompt": "a lamp",
        "threeJsCode": "return THREE.Group();",
        "image": "data:image/png;base64,aGVsbG8="
    }"#;
    let imported = import_blueprint(text).unwrap();
    assert_eq!(imported.image.as_deref(), Some(&b"hello"[..]));
    // Missing name falls back to the prompt
    assert_eq!(imported.name, "a lamp");
    assert!(imported.components.is_empty());
}

#[test]
fn test_import_rejects_missing_fields() {
    let cases = [
        (r#"{"prompt": "p", "threeJsCode": "return 1;"}"#, "id"),
        (r#"{"id": "", "prompt": "p", "threeJsCode": "return 1;"}"#, "id"),
        (r#"{"id": "a", "threeJsCode": "return 1;"}"#, "prompt"),
        (r#"{"id": "a", "prompt": "p"}"#, "threeJsCode"),
    ];
    for (text, field) in cases {
        match import_blueprint(text) {
            Err(ValidationError::MissingField(missing)) => assert_eq!(missing, field),
            other => panic!("`{text}` gave {other:?}"),
        }
    }
    assert!(matches!(import_blueprint("[1, 2]"), Err(ValidationError::MalformedJson(_))));
    assert!(matches!(import_blueprint("not json"), Err(ValidationError::MalformedJson(_))));
}

#[test]
fn test_import_animation() {
    let clip = AnimationRecord::new("spin", common::BOB_CLIP.to_string());
    assert_eq!(import_animation(&export_animation(&clip)).unwrap(), clip);

    assert_eq!(
        import_animation(r#"{"id": "a", "name": "x"}"#),
        Err(ValidationError::MissingField("code"))
    );
}

#[test]
fn test_export_file_names() {
    assert_eq!(export_file_name("My Sword", RecordKind::Blueprint), "my_sword_blueprint.json");
    assert_eq!(export_file_name("Walk-cycle 2", RecordKind::Animation), "walk_cycle_2_animation.json");
}
