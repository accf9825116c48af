//! Generation pipeline: session state, the provider and store seams, and the
//! orchestrator sequencing them.

pub mod orchestrator;
pub mod provider;
pub mod session;
pub mod store;

pub use orchestrator::{Orchestrator, split_prompt};
pub use provider::{ContentProvider, ReplayProvider, extract_source};
pub use session::{AssetComponent, GenerationSession, ImageBytes, PipelineStep};
pub use store::{
    AnimationRecord, AssetStore, Blueprint, JsonFileStore, MemoryStore, RecordKind, export_animation,
    export_blueprint, export_file_name, import_animation, import_blueprint,
};
