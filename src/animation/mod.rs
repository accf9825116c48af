//! Keyframe animation: tracks, clips, actions, the mixer driving them and
//! the binder that turns generated clip source into a playing action.

mod values;
pub mod tracks;
pub mod clip;
pub mod action;
pub mod binding;
pub mod binder;
pub mod mixer;

pub use clip::{AnimationClip, Track, TrackData, TrackKind};
pub use action::AnimationAction;
pub use mixer::AnimationMixer;
pub use binder::{AnimationBinder, Binder, PlaybackControls};
pub use binding::{Axis, PropertyBinding, TargetPath, TrackTarget, parse_track_name};
pub use tracks::KeyframeTrack;
pub use values::Interpolatable;
