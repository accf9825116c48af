//! Pipeline Orchestrator
//!
//! Drives a [`GenerationSession`] through
//! `Prompt → ImageGeneration → Analysis → CodeGeneration → Render`, one
//! provider call per stage, awaited strictly in sequence.
//!
//! # Failure policy
//!
//! - A stage failure records the error, clears the loading flag, returns the
//!   session to [`PipelineStep::Prompt`] and discards every artifact.
//! - Improve and Animate failures record the error and clear the loading
//!   flag but keep `Render` and the asset, so the user can retry.
//!
//! Every operation takes `&mut self`, so two operations on one orchestrator
//! can never overlap. Dropping an operation's future cancels it at its
//! current provider call; the next operation starts from whatever state the
//! session was left in, and `start` always resets first.

use chrono::Utc;

use crate::errors::{GenerationError, GenerationStage, PipelineError};
use crate::pipeline::provider::{ContentProvider, extract_source};
use crate::pipeline::session::{GenerationSession, PipelineStep};
use crate::pipeline::store::{self, AnimationRecord, AssetStore, Blueprint};
use crate::rig::validate_rig;
use crate::runtime::SceneSink;
use crate::settings::PipelineSettings;

/// Splits a prompt into the base prompt and an optional requested animation.
///
/// The first vocabulary word found as a case-insensitive substring is
/// removed and whitespace is collapsed. Without a match the prompt is
/// returned unchanged.
///
/// `"a walking robot"` → `("a robot", Some("walking"))`.
#[must_use]
pub fn split_prompt(prompt: &str, vocabulary: &[String]) -> (String, Option<String>) {
    // ASCII lowering keeps byte offsets aligned with `prompt`
    let lowered = prompt.to_ascii_lowercase();
    for word in vocabulary {
        let word = word.to_ascii_lowercase();
        if word.is_empty() {
            continue;
        }
        if let Some(pos) = lowered.find(&word) {
            let stripped = format!("{}{}", &prompt[..pos], &prompt[pos + word.len()..]);
            let base = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
            return (base, Some(word));
        }
    }
    (prompt.to_string(), None)
}

fn stage_error(stage: GenerationStage, err: &anyhow::Error) -> GenerationError {
    GenerationError::new(stage, format!("{err:#}"))
}

pub struct Orchestrator<P: ContentProvider, S: AssetStore, K: SceneSink = ()> {
    provider: P,
    store: S,
    sink: K,
    settings: PipelineSettings,
    session: GenerationSession,
}

impl<P: ContentProvider, S: AssetStore, K: SceneSink> Orchestrator<P, S, K> {
    pub fn new(provider: P, store: S, sink: K, settings: PipelineSettings) -> Self {
        Self {
            provider,
            store,
            sink,
            settings,
            session: GenerationSession::default(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &GenerationSession {
        &self.session
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    #[must_use]
    pub fn preset_animations(&self) -> &[String] {
        &self.settings.preset_animations
    }

    /// Clears the user-visible error without touching anything else.
    pub fn dismiss_error(&mut self) {
        self.session.error = None;
    }

    /// Every session field back to its initial value.
    pub fn reset(&mut self) {
        self.session = GenerationSession::default();
        self.sink.clear();
        log::info!("Session reset");
    }

    // ========================================================================
    // Forward pipeline
    // ========================================================================

    /// Runs the whole pipeline for `prompt`.
    ///
    /// When the prompt names an action, Animate runs right after the asset
    /// reaches `Render`; its failure is returned but keeps the asset.
    pub async fn start(&mut self, prompt: &str) -> Result<(), PipelineError> {
        self.reset();
        let (base, requested) = split_prompt(prompt, &self.settings.animation_vocabulary);
        if let Some(action) = &requested {
            log::info!("Prompt requests animation `{action}`");
        }
        self.session.prompt = base;
        self.session.requested_animation = requested.clone();

        if let Err(err) = self.run_stages().await {
            log::error!("Pipeline failed: {err}");
            self.session.error = Some(err.to_string());
            self.session.discard_progress();
            return Err(err);
        }

        if let Some(action) = requested {
            if self.session.has_rig() {
                self.animate(&action).await?;
            } else {
                log::warn!("Asset has no rig; skipping requested animation `{action}`");
            }
        }
        Ok(())
    }

    async fn run_stages(&mut self) -> Result<(), PipelineError> {
        let prompt = self.session.prompt.clone();

        self.session.begin(PipelineStep::ImageGeneration, "Generating image...");
        let image = self
            .provider
            .generate_image(&prompt)
            .await
            .map_err(|e| stage_error(GenerationStage::Image, &e))?;
        self.session.image = Some(image.clone());

        self.session.begin(PipelineStep::Analysis, "Analyzing components...");
        let components = self
            .provider
            .analyze_image(&image)
            .await
            .map_err(|e| stage_error(GenerationStage::Analysis, &e))?;
        self.session.components = Some(components.clone());

        self.session.loading_message = "Designing rig...".to_string();
        let rig = self
            .provider
            .generate_rig(&components, &prompt)
            .await
            .map_err(|e| stage_error(GenerationStage::Rig, &e))?;
        let rig = if rig.is_empty() {
            None
        } else {
            validate_rig(&rig)?;
            Some(rig)
        };
        self.session.rig.clone_from(&rig);

        self.session.begin(PipelineStep::CodeGeneration, "Writing scene code...");
        let source = self
            .provider
            .generate_scene_code(&components, &prompt, rig.as_deref())
            .await
            .and_then(|raw| extract_source(&raw))
            .map_err(|e| stage_error(GenerationStage::SceneCode, &e))?;
        self.session.scene_source = Some(source.clone());

        self.session.step = PipelineStep::Render;
        self.session.finish_loading();
        self.sink.show_scene(&source);
        log::info!("Asset ready: {} components, rigged: {}", components.len(), rig.is_some());
        Ok(())
    }

    // ========================================================================
    // Side operations
    // ========================================================================

    /// Rewrites the scene source following `instruction`. Render only.
    pub async fn improve(&mut self, instruction: &str) -> Result<(), PipelineError> {
        if self.session.step != PipelineStep::Render {
            return Err(PipelineError::InvalidState("improve is only available once the asset is rendered"));
        }
        let Some(current) = self.session.scene_source.clone() else {
            return Err(PipelineError::InvalidState("there is no scene source to improve"));
        };

        self.session.error = None;
        self.session.is_loading = true;
        self.session.loading_message = "Improving model...".to_string();

        let result = self
            .provider
            .improve_scene_code(
                &self.session.prompt,
                self.session.image.as_deref(),
                &current,
                instruction,
                self.session.has_rig(),
            )
            .await
            .and_then(|raw| extract_source(&raw));
        self.session.finish_loading();

        match result {
            Ok(source) => {
                self.session.scene_source = Some(source.clone());
                self.sink.show_scene(&source);
                Ok(())
            }
            Err(e) => Err(self.side_failure(GenerationStage::Improve, &e)),
        }
    }

    /// Generates clip source for the current rig and persists it.
    pub async fn animate(&mut self, animation_prompt: &str) -> Result<(), PipelineError> {
        let Some(rig) = self.session.rig.clone().filter(|r| !r.is_empty()) else {
            return Err(PipelineError::InvalidState("animation requires a rigged asset"));
        };

        self.session.error = None;
        self.session.is_loading = true;
        self.session.loading_message = format!("Generating \"{animation_prompt}\" animation...");

        let result = self
            .provider
            .generate_animation_code(&rig, animation_prompt)
            .await
            .and_then(|raw| extract_source(&raw));
        self.session.finish_loading();

        match result {
            Ok(code) => {
                self.session.animation_source = Some(code.clone());
                self.sink.show_animation(&code);
                if self.settings.persist_animations {
                    self.store.save_animation(AnimationRecord::new(animation_prompt, code));
                }
                Ok(())
            }
            Err(e) => Err(self.side_failure(GenerationStage::Animation, &e)),
        }
    }

    fn side_failure(&mut self, stage: GenerationStage, err: &anyhow::Error) -> PipelineError {
        let err = stage_error(stage, err);
        log::error!("{err}");
        self.session.error = Some(err.to_string());
        err.into()
    }

    // ========================================================================
    // Library
    // ========================================================================

    #[must_use]
    pub fn blueprints(&self) -> Vec<Blueprint> {
        self.store.list_blueprints()
    }

    #[must_use]
    pub fn animations(&self) -> Vec<AnimationRecord> {
        self.store.list_animations()
    }

    /// Restores a stored blueprint as a rendered session.
    pub fn load_blueprint(&mut self, id: &str) -> Result<(), PipelineError> {
        let blueprint = self
            .store
            .get_blueprint(id)
            .ok_or_else(|| PipelineError::BlueprintNotFound(id.to_string()))?;

        self.session = GenerationSession {
            step: PipelineStep::Render,
            prompt: blueprint.prompt,
            image: blueprint.image,
            components: Some(blueprint.components),
            rig: blueprint.rig.filter(|r| !r.is_empty()),
            scene_source: Some(blueprint.scene_source.clone()),
            loaded_blueprint_id: Some(blueprint.id),
            ..GenerationSession::default()
        };
        self.sink.clear();
        self.sink.show_scene(&blueprint.scene_source);
        log::info!("Loaded blueprint `{}`", blueprint.name);
        Ok(())
    }

    fn snapshot(&self, id: String, name: String) -> Result<Blueprint, PipelineError> {
        let Some(scene_source) = self.session.scene_source.clone() else {
            return Err(PipelineError::InvalidState("there is no asset to save"));
        };
        Ok(Blueprint {
            id,
            name,
            prompt: self.session.prompt.clone(),
            image: self.session.image.clone(),
            components: self.session.components.clone().unwrap_or_default(),
            scene_source,
            rig: self.session.rig.clone(),
            created_at: Utc::now(),
        })
    }

    /// Stores the session under a new id and makes it the loaded blueprint.
    pub fn save_blueprint_as_new(&mut self, name: &str) -> Result<Blueprint, PipelineError> {
        let name = if name.trim().is_empty() {
            self.session.prompt.clone()
        } else {
            name.trim().to_string()
        };
        let blueprint = self.snapshot(uuid::Uuid::new_v4().to_string(), name)?;
        self.store.save_blueprint(blueprint.clone());
        self.session.loaded_blueprint_id = Some(blueprint.id.clone());
        Ok(blueprint)
    }

    /// Overwrites the loaded blueprint with the current session.
    pub fn update_blueprint(&mut self) -> Result<Blueprint, PipelineError> {
        let Some(id) = self.session.loaded_blueprint_id.clone() else {
            return Err(PipelineError::InvalidState("no blueprint is loaded"));
        };
        let name = self
            .store
            .get_blueprint(&id)
            .map_or_else(|| self.session.prompt.clone(), |b| b.name);
        let blueprint = self.snapshot(id, name)?;
        self.store.save_blueprint(blueprint.clone());
        Ok(blueprint)
    }

    pub fn delete_blueprint(&mut self, id: &str) {
        self.store.delete_blueprint(id);
        if self.session.loaded_blueprint_id.as_deref() == Some(id) {
            self.session.loaded_blueprint_id = None;
        }
    }

    /// Applies a stored clip to the current rigged asset.
    pub fn load_animation(&mut self, id: &str) -> Result<(), PipelineError> {
        if !self.session.has_rig() {
            return Err(PipelineError::InvalidState("animation requires a rigged asset"));
        }
        let animation = self
            .store
            .get_animation(id)
            .ok_or_else(|| PipelineError::AnimationNotFound(id.to_string()))?;
        self.session.animation_source = Some(animation.code.clone());
        self.sink.show_animation(&animation.code);
        Ok(())
    }

    pub fn delete_animation(&mut self, id: &str) {
        self.store.delete_animation(id);
    }

    /// Validates and stores an exported blueprint. Invalid text leaves the
    /// store untouched.
    pub fn import_blueprint(&mut self, text: &str) -> Result<Blueprint, PipelineError> {
        let blueprint = store::import_blueprint(text)?;
        self.store.save_blueprint(blueprint.clone());
        Ok(blueprint)
    }

    pub fn import_animation(&mut self, text: &str) -> Result<AnimationRecord, PipelineError> {
        let animation = store::import_animation(text)?;
        self.store.save_animation(animation.clone());
        Ok(animation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vec<String> {
        PipelineSettings::default().animation_vocabulary
    }

    #[test]
    fn test_split_prompt_extracts_action() {
        assert_eq!(
            split_prompt("a walking robot", &vocab()),
            ("a robot".to_string(), Some("walking".to_string()))
        );
    }

    #[test]
    fn test_split_prompt_without_action() {
        assert_eq!(split_prompt("a red sword", &vocab()), ("a red sword".to_string(), None));
    }

    #[test]
    fn test_split_prompt_is_case_insensitive() {
        let (base, action) = split_prompt("A DANCING  cat", &vocab());
        assert_eq!(base, "A cat");
        assert_eq!(action.as_deref(), Some("dancing"));
    }
}
