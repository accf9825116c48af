//! Runtime, pipeline and script configuration.
//!
//! Every struct is defaults-first: [`Settings::default`] reproduces the
//! stock viewer, and a JSON file only needs the fields it changes.
//!
//! ```rust,ignore
//! use kiln::settings::{RuntimeSettings, Settings};
//!
//! let settings = Settings {
//!     runtime: RuntimeSettings { fov: 60.0, ..Default::default() },
//!     ..Default::default()
//! };
//!
//! let from_disk = Settings::from_json(r#"{ "runtime": { "damping": 0.2 } }"#)?;
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{KilnError, Result};

// ---------------------------------------------------------------------------
// RuntimeSettings
// ---------------------------------------------------------------------------

/// Camera, lighting and framing defaults for the scene runtime.
///
/// | Field                   | Default          |
/// |-------------------------|------------------|
/// | `fov`                   | 75°              |
/// | `near` / `far`          | 0.1 / 1000       |
/// | `camera_distance`       | 5                |
/// | `background`            | `0x111827`       |
/// | `ambient_*`             | white, 0.8       |
/// | `directional_*`         | white, 1.0 at (5, 10, 7.5) |
/// | `damping`               | 0.1              |
/// | `framing_margin`        | 1.5              |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Initial camera position on +Z before any asset is framed.
    pub camera_distance: f32,
    /// Background color as `0xRRGGBB`.
    pub background: u32,

    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub directional_color: u32,
    pub directional_intensity: f32,
    pub directional_position: [f32; 3],

    /// Orbit controller damping factor.
    pub damping: f32,
    /// Multiplier applied to the fitted camera distance.
    pub framing_margin: f32,

    /// Initial viewport size in physical pixels.
    pub width: u32,
    pub height: u32,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            camera_distance: 5.0,
            background: 0x11_18_27,
            ambient_color: 0xff_ff_ff,
            ambient_intensity: 0.8,
            directional_color: 0xff_ff_ff,
            directional_intensity: 1.0,
            directional_position: [5.0, 10.0, 7.5],
            damping: 0.1,
            framing_margin: 1.5,
            width: 1280,
            height: 720,
        }
    }
}

impl RuntimeSettings {
    #[inline]
    #[must_use]
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineSettings
// ---------------------------------------------------------------------------

/// Orchestrator behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Action words recognised in a prompt as a requested animation, matched
    /// case-insensitively as substrings in list order.
    pub animation_vocabulary: Vec<String>,
    /// Animation prompts offered as one-click presets.
    pub preset_animations: Vec<String>,
    /// Persist an animation record after every successful animate call.
    pub persist_animations: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|s| (*s).to_string()).collect();
        Self {
            animation_vocabulary: words(&[
                "walking",
                "running",
                "jumping",
                "dancing",
                "waving",
                "flying",
                "swimming",
                "spinning",
                "crawling",
                "breathing",
                "idling",
            ]),
            preset_animations: words(&["Walk cycle", "Idle breathing"]),
            persist_animations: true,
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptSettings
// ---------------------------------------------------------------------------

/// Resource limits of the embedded script engine.
///
/// These bound runaway generated code; they are not a security boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// Maximum operations per run, 0 for unlimited.
    pub max_operations: u64,
    pub max_call_levels: usize,
    pub max_array_size: usize,
    pub max_string_size: usize,
    /// Upper bound for any primitive segment count.
    pub max_segments: u32,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            max_operations: 5_000_000,
            max_call_levels: 64,
            max_array_size: 1 << 20,
            max_string_size: 1 << 20,
            max_segments: 256,
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub runtime: RuntimeSettings,
    pub pipeline: PipelineSettings,
    pub script: ScriptSettings,
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| KilnError::Settings(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| KilnError::Settings(format!("{}: {e}", path.display())))?;
        let settings = Self::from_json(&text)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "runtime": { "damping": 0.25 } }"#).unwrap();
        assert!((settings.runtime.damping - 0.25).abs() < f32::EPSILON);
        assert!((settings.runtime.fov - 75.0).abs() < f32::EPSILON);
        assert_eq!(settings.runtime.background, 0x11_18_27);
        assert_eq!(settings.pipeline, PipelineSettings::default());
    }

    #[test]
    fn test_malformed_json_is_a_settings_error() {
        assert!(matches!(Settings::from_json("{"), Err(KilnError::Settings(_))));
    }
}
