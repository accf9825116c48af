use serde::{Deserialize, Serialize};

use crate::rig::RigJoint;

/// Raw image bytes as returned by the provider.
pub type ImageBytes = Vec<u8>;

/// Where the session is in the generation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStep {
    #[default]
    Prompt,
    ImageGeneration,
    Analysis,
    CodeGeneration,
    /// Terminal. Improve and Animate run from here without leaving it.
    Render,
}

/// One visual part of the generated asset, as found by image analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetComponent {
    pub name: String,
    pub shape: String,
    /// Hex color such as `#FF5733`.
    pub color: String,
}

impl AssetComponent {
    pub fn new(name: impl Into<String>, shape: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: shape.into(),
            color: color.into(),
        }
    }
}

/// Everything the pipeline knows about the asset being generated.
///
/// Replaced wholesale on reset; each stage fills in its own artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationSession {
    pub step: PipelineStep,
    /// Prompt with any requested animation word removed.
    pub prompt: String,
    pub requested_animation: Option<String>,
    pub image: Option<ImageBytes>,
    pub components: Option<Vec<AssetComponent>>,
    pub rig: Option<Vec<RigJoint>>,
    pub scene_source: Option<String>,
    pub animation_source: Option<String>,
    pub loaded_blueprint_id: Option<String>,
    pub is_loading: bool,
    pub loading_message: String,
    pub error: Option<String>,
}

impl GenerationSession {
    #[must_use]
    pub fn has_rig(&self) -> bool {
        self.rig.as_ref().is_some_and(|r| !r.is_empty())
    }

    pub(crate) fn begin(&mut self, step: PipelineStep, message: &str) {
        self.step = step;
        self.is_loading = true;
        self.loading_message = message.to_string();
    }

    pub(crate) fn finish_loading(&mut self) {
        self.is_loading = false;
        self.loading_message.clear();
    }

    /// Drops every stage artifact and returns to [`PipelineStep::Prompt`].
    pub(crate) fn discard_progress(&mut self) {
        self.step = PipelineStep::Prompt;
        self.image = None;
        self.components = None;
        self.rig = None;
        self.scene_source = None;
        self.animation_source = None;
        self.finish_loading();
    }
}
