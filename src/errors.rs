//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! Failures are split by where they surface:
//! - [`GenerationError`]: a content-provider stage failed; always user-visible
//! - [`BuildError`]: generated source could not be turned into a scene node or
//!   an animation clip; contained inside the scene runtime
//! - [`ValidationError`]: an imported record is malformed; rejected before it
//!   reaches the store
//! - [`StorageError`]: persistence read/write failed; degraded internally and
//!   never returned from the store's public API
//! - [`RigError`]: a rig joint list violates the single-rooted tree invariant
//!
//! [`PipelineError`] is what orchestrator operations return, and [`KilnError`]
//! is the umbrella type with `From` conversions for all of the above.
//!
//! # Usage
//!
//! ```rust,ignore
//! use kiln::errors::{KilnError, Result};
//!
//! fn import(text: &str) -> Result<()> {
//!     let blueprint = kiln::pipeline::store::import_blueprint(text)?;
//!     Ok(())
//! }
//! ```

use std::fmt;

use thiserror::Error;

// ============================================================================
// Generation Errors
// ============================================================================

/// Content-provider call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationStage {
    Image,
    Analysis,
    Rig,
    SceneCode,
    Improve,
    Animation,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Image => "image generation",
            Self::Analysis => "image analysis",
            Self::Rig => "rig generation",
            Self::SceneCode => "scene code generation",
            Self::Improve => "scene code improvement",
            Self::Animation => "animation generation",
        };
        f.write_str(name)
    }
}

/// A content-provider stage call failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} failed: {message}")]
pub struct GenerationError {
    /// The stage whose provider call failed
    pub stage: GenerationStage,
    /// Provider-supplied failure message
    pub message: String,
}

impl GenerationError {
    pub fn new(stage: GenerationStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

// ============================================================================
// Build Errors
// ============================================================================

/// Generated source could not be executed into a valid scene node or clip.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The script failed to parse or raised an error while running.
    #[error("Script error: {0}")]
    Script(String),

    /// The script returned something other than a single scene node.
    #[error("Expected the script to return one scene node, got `{0}`")]
    NotANode(String),

    /// The script returned something other than an animation clip.
    #[error("Expected the script to return one animation clip, got `{0}`")]
    NotAClip(String),

    /// The returned clip has no keyframe tracks.
    #[error("Animation clip `{0}` has no keyframe tracks")]
    EmptyClip(String),

    /// A keyframe track could not be constructed.
    #[error("Invalid keyframe track `{name}`: {reason}")]
    InvalidTrack {
        /// Track name as written by the script
        name: String,
        /// Why construction was rejected
        reason: String,
    },

    /// The returned node graph is not self-contained.
    #[error("Invalid node hierarchy: {0}")]
    InvalidHierarchy(String),

    /// Animation binding needs a skinned mesh in the mounted asset.
    #[error("The mounted asset has no skinned mesh to animate")]
    MissingSkinnedMesh,

    /// Animation binding was requested with no asset mounted.
    #[error("No asset is mounted")]
    NoAsset,
}

impl From<Box<rhai::EvalAltResult>> for BuildError {
    fn from(err: Box<rhai::EvalAltResult>) -> Self {
        BuildError::Script(err.to_string())
    }
}

// ============================================================================
// Validation & Storage Errors
// ============================================================================

/// An imported record was rejected before touching the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The text is not a JSON object.
    #[error("Malformed record: {0}")]
    MalformedJson(String),

    /// A required field is absent, empty or of the wrong type.
    #[error("Record is missing required field `{0}`")]
    MissingField(&'static str),
}

/// Persistence failure. Produced and logged inside store implementations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Rig Errors
// ============================================================================

/// A rig joint list does not form a single-rooted tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RigError {
    #[error("Rig has no joints")]
    Empty,

    #[error("Rig has no root joint")]
    NoRoot,

    #[error("Rig has multiple root joints: {0:?}")]
    MultipleRoots(Vec<String>),

    #[error("Rig joint with an empty name")]
    EmptyName,

    #[error("Duplicate rig joint name `{0}`")]
    DuplicateName(String),

    #[error("Joint `{joint}` references unknown parent `{parent}`")]
    UnknownParent {
        /// Joint carrying the bad reference
        joint: String,
        /// The missing parent name
        parent: String,
    },

    #[error("Parent chain of joint `{0}` forms a cycle")]
    Cycle(String),
}

// ============================================================================
// Pipeline Errors
// ============================================================================

/// Errors returned by orchestrator operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The operation is not valid in the session's current state.
    #[error("Invalid pipeline state: {0}")]
    InvalidState(&'static str),

    #[error("Blueprint `{0}` not found")]
    BlueprintNotFound(String),

    #[error("Animation `{0}` not found")]
    AnimationNotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Rig(#[from] RigError),
}

// ============================================================================
// Umbrella
// ============================================================================

/// The main error type for the crate.
#[derive(Error, Debug)]
pub enum KilnError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Rig(#[from] RigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Settings file could not be read or parsed.
    #[error("Settings error: {0}")]
    Settings(String),
}

/// Alias for `Result<T, KilnError>`.
pub type Result<T> = std::result::Result<T, KilnError>;
