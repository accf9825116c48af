//! Persisted records and the store seam.
//!
//! Storage failures never reach callers of [`AssetStore`]: reads degrade to
//! empty, writes are dropped, and both are logged. Import is the one place
//! where bad data is reported, as [`ValidationError`], before anything is
//! written.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{StorageError, ValidationError};
use crate::pipeline::session::{AssetComponent, ImageBytes};
use crate::rig::RigJoint;

// ============================================================================
// Records
// ============================================================================

/// Snapshot of a finished generation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub prompt: String,
    /// Base64 in JSON.
    #[serde(default, with = "image_base64", skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageBytes>,
    #[serde(default)]
    pub components: Vec<AssetComponent>,
    #[serde(rename = "threeJsCode")]
    pub scene_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rig: Option<Vec<RigJoint>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A stored animation clip source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub prompt: String,
    pub code: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl AnimationRecord {
    /// New record with a fresh id, named after its prompt.
    #[must_use]
    pub fn new(prompt: &str, code: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: prompt.to_string(),
            prompt: prompt.to_string(),
            code,
            created_at: Utc::now(),
        }
    }
}

mod image_base64 {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(image: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match image {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        // Accept data URLs as well as bare base64
        let payload = text.split_once("base64,").map_or(text.as_str(), |(_, p)| p);
        STANDARD
            .decode(payload)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Store seam
// ============================================================================

pub trait AssetStore {
    /// Newest first.
    fn list_blueprints(&self) -> Vec<Blueprint>;
    fn get_blueprint(&self, id: &str) -> Option<Blueprint>;
    /// Inserts, or replaces the record with the same id.
    fn save_blueprint(&self, blueprint: Blueprint);
    fn delete_blueprint(&self, id: &str);

    /// Newest first.
    fn list_animations(&self) -> Vec<AnimationRecord>;
    fn get_animation(&self, id: &str) -> Option<AnimationRecord>;
    fn save_animation(&self, animation: AnimationRecord);
    fn delete_animation(&self, id: &str);
}

impl<S: AssetStore + ?Sized> AssetStore for Arc<S> {
    fn list_blueprints(&self) -> Vec<Blueprint> {
        (**self).list_blueprints()
    }
    fn get_blueprint(&self, id: &str) -> Option<Blueprint> {
        (**self).get_blueprint(id)
    }
    fn save_blueprint(&self, blueprint: Blueprint) {
        (**self).save_blueprint(blueprint);
    }
    fn delete_blueprint(&self, id: &str) {
        (**self).delete_blueprint(id);
    }
    fn list_animations(&self) -> Vec<AnimationRecord> {
        (**self).list_animations()
    }
    fn get_animation(&self, id: &str) -> Option<AnimationRecord> {
        (**self).get_animation(id)
    }
    fn save_animation(&self, animation: AnimationRecord) {
        (**self).save_animation(animation);
    }
    fn delete_animation(&self, id: &str) {
        (**self).delete_animation(id);
    }
}

/// Records with an id and a creation time.
trait Keyed {
    fn id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
}

impl Keyed for Blueprint {
    fn id(&self) -> &str {
        &self.id
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Keyed for AnimationRecord {
    fn id(&self) -> &str {
        &self.id
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn newest_first<T: Keyed>(mut records: Vec<T>) -> Vec<T> {
    records.sort_by_key(|r| std::cmp::Reverse(r.created_at()));
    records
}

fn upsert<T: Keyed>(records: &mut Vec<T>, record: T) {
    match records.iter().position(|r| r.id() == record.id()) {
        Some(i) => records[i] = record,
        None => records.push(record),
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    blueprints: RwLock<Vec<Blueprint>>,
    animations: RwLock<Vec<AnimationRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssetStore for MemoryStore {
    fn list_blueprints(&self) -> Vec<Blueprint> {
        newest_first(self.blueprints.read().clone())
    }

    fn get_blueprint(&self, id: &str) -> Option<Blueprint> {
        self.blueprints.read().iter().find(|b| b.id == id).cloned()
    }

    fn save_blueprint(&self, blueprint: Blueprint) {
        upsert(&mut *self.blueprints.write(), blueprint);
    }

    fn delete_blueprint(&self, id: &str) {
        self.blueprints.write().retain(|b| b.id != id);
    }

    fn list_animations(&self) -> Vec<AnimationRecord> {
        newest_first(self.animations.read().clone())
    }

    fn get_animation(&self, id: &str) -> Option<AnimationRecord> {
        self.animations.read().iter().find(|a| a.id == id).cloned()
    }

    fn save_animation(&self, animation: AnimationRecord) {
        upsert(&mut *self.animations.write(), animation);
    }

    fn delete_animation(&self, id: &str) {
        self.animations.write().retain(|a| a.id != id);
    }
}

// ============================================================================
// JsonFileStore
// ============================================================================

/// Two JSON array files, `blueprints.json` and `animations.json`, in one
/// directory.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    lock: RwLock<()>,
}

const BLUEPRINTS_FILE: &str = "blueprints.json";
const ANIMATIONS_FILE: &str = "animations.json";

impl JsonFileStore {
    /// The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: RwLock::new(()),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_all<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, StorageError> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn write_all<T: Serialize>(&self, file: &str, records: &[T]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let text = serde_json::to_string_pretty(records)?;
        fs::write(self.dir.join(file), text)?;
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, file: &str) -> Vec<T> {
        let _guard = self.lock.read();
        self.read_all(file).unwrap_or_else(|e| {
            log::error!("Failed to load {file} from {}: {e}", self.dir.display());
            Vec::new()
        })
    }

    /// Read-modify-write under the store lock. A failed read drops the write
    /// rather than overwriting the file with a partial list.
    fn modify<T: DeserializeOwned + Serialize>(&self, file: &str, f: impl FnOnce(&mut Vec<T>)) {
        let _guard = self.lock.write();
        let result = self.read_all(file).and_then(|mut records| {
            f(&mut records);
            self.write_all(file, &records)
        });
        if let Err(e) = result {
            log::error!("Failed to update {file} in {}: {e}", self.dir.display());
        }
    }
}

impl AssetStore for JsonFileStore {
    fn list_blueprints(&self) -> Vec<Blueprint> {
        newest_first(self.load(BLUEPRINTS_FILE))
    }

    fn get_blueprint(&self, id: &str) -> Option<Blueprint> {
        self.load::<Blueprint>(BLUEPRINTS_FILE).into_iter().find(|b| b.id == id)
    }

    fn save_blueprint(&self, blueprint: Blueprint) {
        self.modify(BLUEPRINTS_FILE, |records| upsert(records, blueprint));
    }

    fn delete_blueprint(&self, id: &str) {
        self.modify::<Blueprint>(BLUEPRINTS_FILE, |records| records.retain(|b| b.id != id));
    }

    fn list_animations(&self) -> Vec<AnimationRecord> {
        newest_first(self.load(ANIMATIONS_FILE))
    }

    fn get_animation(&self, id: &str) -> Option<AnimationRecord> {
        self.load::<AnimationRecord>(ANIMATIONS_FILE).into_iter().find(|a| a.id == id)
    }

    fn save_animation(&self, animation: AnimationRecord) {
        self.modify(ANIMATIONS_FILE, |records| upsert(records, animation));
    }

    fn delete_animation(&self, id: &str) {
        self.modify::<AnimationRecord>(ANIMATIONS_FILE, |records| records.retain(|a| a.id != id));
    }
}

// ============================================================================
// Import / export
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Blueprint,
    Animation,
}

impl RecordKind {
    fn suffix(self) -> &'static str {
        match self {
            Self::Blueprint => "blueprint",
            Self::Animation => "animation",
        }
    }
}

/// Parses `text` as a JSON object and checks that every field in `required`
/// is a string, and non-empty for `id`.
fn required_object(text: &str, required: &[&'static str]) -> Result<Value, ValidationError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
    let Some(object) = value.as_object() else {
        return Err(ValidationError::MalformedJson("expected a JSON object".to_string()));
    };
    for &field in required {
        match object.get(field).and_then(Value::as_str) {
            Some(s) if field != "id" || !s.trim().is_empty() => {}
            _ => return Err(ValidationError::MissingField(field)),
        }
    }
    Ok(value)
}

/// Validates an exported blueprint. Nothing is stored.
pub fn import_blueprint(text: &str) -> Result<Blueprint, ValidationError> {
    let value = required_object(text, &["id", "prompt", "threeJsCode"])?;
    let mut blueprint: Blueprint =
        serde_json::from_value(value).map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
    if blueprint.name.trim().is_empty() {
        blueprint.name.clone_from(&blueprint.prompt);
    }
    Ok(blueprint)
}

/// Validates an exported animation record. Nothing is stored.
pub fn import_animation(text: &str) -> Result<AnimationRecord, ValidationError> {
    let value = required_object(text, &["id", "code"])?;
    let mut animation: AnimationRecord =
        serde_json::from_value(value).map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
    if animation.name.trim().is_empty() {
        animation.name.clone_from(&animation.prompt);
    }
    Ok(animation)
}

pub fn export_blueprint(blueprint: &Blueprint) -> String {
    serde_json::to_string_pretty(blueprint).unwrap_or_else(|e| {
        log::error!("Failed to export blueprint `{}`: {e}", blueprint.id);
        String::new()
    })
}

pub fn export_animation(animation: &AnimationRecord) -> String {
    serde_json::to_string_pretty(animation).unwrap_or_else(|e| {
        log::error!("Failed to export animation `{}`: {e}", animation.id);
        String::new()
    })
}

/// `"My Sword"` → `my_sword_blueprint.json`.
#[must_use]
pub fn export_file_name(name: &str, kind: RecordKind) -> String {
    let safe: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{safe}_{}.json", kind.suffix())
}
