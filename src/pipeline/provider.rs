//! Content provider seam.
//!
//! The pipeline never talks to a model vendor directly. Everything it needs
//! comes through [`ContentProvider`]; timeouts and retries are the
//! implementation's business.

use std::cell::RefCell;
use std::future::Future;

use anyhow::{Context, anyhow, bail};

use crate::errors::GenerationStage;
use crate::pipeline::session::{AssetComponent, ImageBytes};
use crate::rig::RigJoint;

pub trait ContentProvider {
    fn generate_image(&self, prompt: &str) -> impl Future<Output = anyhow::Result<ImageBytes>>;

    fn analyze_image(&self, image: &[u8]) -> impl Future<Output = anyhow::Result<Vec<AssetComponent>>>;

    /// An empty joint list means the asset is not rigged.
    fn generate_rig(
        &self,
        components: &[AssetComponent],
        prompt: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<RigJoint>>>;

    fn generate_scene_code(
        &self,
        components: &[AssetComponent],
        prompt: &str,
        rig: Option<&[RigJoint]>,
    ) -> impl Future<Output = anyhow::Result<String>>;

    fn improve_scene_code(
        &self,
        prompt: &str,
        image: Option<&[u8]>,
        current_source: &str,
        instruction: &str,
        has_rig: bool,
    ) -> impl Future<Output = anyhow::Result<String>>;

    fn generate_animation_code(
        &self,
        rig: &[RigJoint],
        animation_prompt: &str,
    ) -> impl Future<Output = anyhow::Result<String>>;
}

/// Cleans raw model output into runnable source.
///
/// Takes the body of the first fenced code block when there is one
/// (optionally tagged `javascript`, `js` or `rhai`), otherwise the whole
/// text. Empty output and output without a `return` are rejected.
pub fn extract_source(raw: &str) -> anyhow::Result<String> {
    let code = fenced_block(raw).unwrap_or(raw).trim();
    if code.is_empty() {
        bail!("the model returned empty code");
    }
    if !code.contains("return") {
        log::error!("Generated code is missing a return statement:\n{code}");
        bail!("generated code is missing the required `return` statement");
    }
    Ok(code.to_string())
}

fn fenced_block(raw: &str) -> Option<&str> {
    let start = raw.find("```")?;
    let after = &raw[start + 3..];
    let after = ["javascript", "js", "rhai"]
        .iter()
        .find_map(|tag| after.strip_prefix(tag))
        .unwrap_or(after);
    let end = after.find("```")?;
    Some(&after[..end])
}

// ============================================================================
// Replay provider
// ============================================================================

/// Provider that answers every call from canned data.
///
/// Used by tests and the offline demo. `fail_at` makes one stage fail.
#[derive(Debug, Clone, Default)]
pub struct ReplayProvider {
    pub image: ImageBytes,
    pub components: Vec<AssetComponent>,
    pub rig: Vec<RigJoint>,
    pub scene_code: String,
    pub improved_code: String,
    pub animation_code: String,
    pub fail_at: Option<GenerationStage>,
    calls: RefCell<Vec<GenerationStage>>,
}

impl ReplayProvider {
    #[must_use]
    pub fn new(scene_code: impl Into<String>) -> Self {
        Self {
            image: b"\x89PNG replay".to_vec(),
            scene_code: scene_code.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_components(mut self, components: Vec<AssetComponent>) -> Self {
        self.components = components;
        self
    }

    #[must_use]
    pub fn with_rig(mut self, rig: Vec<RigJoint>) -> Self {
        self.rig = rig;
        self
    }

    #[must_use]
    pub fn with_improved_code(mut self, code: impl Into<String>) -> Self {
        self.improved_code = code.into();
        self
    }

    #[must_use]
    pub fn with_animation_code(mut self, code: impl Into<String>) -> Self {
        self.animation_code = code.into();
        self
    }

    #[must_use]
    pub fn failing_at(mut self, stage: GenerationStage) -> Self {
        self.fail_at = Some(stage);
        self
    }

    /// Stages called so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<GenerationStage> {
        self.calls.borrow().clone()
    }

    fn record(&self, stage: GenerationStage) -> anyhow::Result<()> {
        self.calls.borrow_mut().push(stage);
        if self.fail_at == Some(stage) {
            return Err(anyhow!("replayed failure")).with_context(|| format!("{stage} unavailable"));
        }
        Ok(())
    }
}

impl ContentProvider for ReplayProvider {
    async fn generate_image(&self, _prompt: &str) -> anyhow::Result<ImageBytes> {
        self.record(GenerationStage::Image)?;
        Ok(self.image.clone())
    }

    async fn analyze_image(&self, _image: &[u8]) -> anyhow::Result<Vec<AssetComponent>> {
        self.record(GenerationStage::Analysis)?;
        Ok(self.components.clone())
    }

    async fn generate_rig(&self, _components: &[AssetComponent], _prompt: &str) -> anyhow::Result<Vec<RigJoint>> {
        self.record(GenerationStage::Rig)?;
        Ok(self.rig.clone())
    }

    async fn generate_scene_code(
        &self,
        _components: &[AssetComponent],
        _prompt: &str,
        _rig: Option<&[RigJoint]>,
    ) -> anyhow::Result<String> {
        self.record(GenerationStage::SceneCode)?;
        Ok(self.scene_code.clone())
    }

    async fn improve_scene_code(
        &self,
        _prompt: &str,
        _image: Option<&[u8]>,
        _current_source: &str,
        _instruction: &str,
        _has_rig: bool,
    ) -> anyhow::Result<String> {
        self.record(GenerationStage::Improve)?;
        Ok(self.improved_code.clone())
    }

    async fn generate_animation_code(&self, _rig: &[RigJoint], _animation_prompt: &str) -> anyhow::Result<String> {
        self.record(GenerationStage::Animation)?;
        Ok(self.animation_code.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_source_strips_fence() {
        let raw = "Here you go:\n```javascript\nlet g = THREE.Group();\nreturn g;\n```\nEnjoy";
        assert_eq!(extract_source(raw).unwrap(), "let g = THREE.Group();\nreturn g;");
    }

    #[test]
    fn test_extract_source_plain_text() {
        assert_eq!(extract_source("  return THREE.Group();  ").unwrap(), "return THREE.Group();");
    }

    #[test]
    fn test_extract_source_rejects_empty_and_missing_return() {
        assert!(extract_source("```js\n\n```").is_err());
        assert!(extract_source("let g = THREE.Group();").is_err());
    }
}
