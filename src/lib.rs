#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Kiln: a prompt-to-asset generation pipeline and the procedural scene and
//! animation runtime that shows its output.
//!
//! - [`pipeline`]: session state machine over an async [`ContentProvider`]
//! - [`builder`] / [`animation`]: run generated scene and clip sources
//! - [`runtime`]: persistent render loop with leak-free rebuilds

pub mod animation;
pub mod assets;
pub mod builder;
pub mod errors;
pub mod pipeline;
pub mod resources;
pub mod rig;
pub mod runtime;
pub mod scene;
pub mod script;
pub mod settings;
pub mod utils;

pub use animation::{AnimationAction, AnimationBinder, AnimationClip, AnimationMixer, PlaybackControls};
pub use assets::AssetServer;
pub use builder::{AssetBuilder, BuiltAsset};
pub use errors::{BuildError, KilnError, PipelineError, Result};
pub use pipeline::{
    AssetStore, ContentProvider, GenerationSession, JsonFileStore, MemoryStore, Orchestrator, PipelineStep,
    ReplayProvider,
};
pub use rig::{RigJoint, validate_rig};
pub use runtime::{HeadlessRenderer, RenderBackend, RuntimeEvent, SceneRuntime, SceneSink};
pub use scene::{Node, NodeHandle, Scene};
pub use script::ScriptHost;
pub use settings::Settings;
pub use utils::orbit_control::OrbitControls;
