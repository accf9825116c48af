use std::sync::Arc;

use glam::{EulerRot, Quat, Vec3};

use crate::animation::binding::{Axis, PropertyBinding, TargetPath};
use crate::animation::clip::{AnimationClip, TrackData};
use crate::animation::tracks::KeyframeCursor;
use crate::scene::Scene;

/// Playback state of one clip on one mixer.
///
/// An action starts out stopped: `enabled == false`, time zero. `play` turns
/// it on, `pause` freezes time, `restart` rewinds and plays. Time wraps at the
/// end of the clip.
#[derive(Debug, Clone)]
pub struct AnimationAction {
    clip: Arc<AnimationClip>,

    pub time: f32,
    pub paused: bool,
    pub enabled: bool,

    pub bindings: Vec<PropertyBinding>,

    pub(crate) track_cursors: Vec<KeyframeCursor>,
}

impl AnimationAction {
    #[must_use]
    pub fn new(clip: Arc<AnimationClip>) -> Self {
        let track_count = clip.tracks.len();
        Self {
            clip,
            time: 0.0,
            paused: false,
            enabled: false,
            bindings: Vec::new(),
            track_cursors: vec![KeyframeCursor::default(); track_count],
        }
    }

    #[must_use]
    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    // ========================================================================
    // Playback control
    // ========================================================================

    /// Starts a stopped action or resumes a paused one. No-op while playing.
    pub fn play(&mut self) {
        self.enabled = true;
        self.paused = false;
    }

    /// Freezes time without resetting it.
    pub fn pause(&mut self) {
        if self.enabled {
            self.paused = true;
        }
    }

    /// Rewinds to zero and plays, whatever the previous state.
    pub fn restart(&mut self) {
        self.reset_time();
        self.enabled = true;
        self.paused = false;
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.enabled && !self.paused
    }

    fn reset_time(&mut self) {
        self.time = 0.0;
        for cursor in &mut self.track_cursors {
            cursor.last_index = 0;
        }
    }

    // ========================================================================
    // Per-frame update
    // ========================================================================

    /// Advances time, wrapping at the clip duration.
    pub fn update(&mut self, dt: f32) {
        if !self.is_playing() {
            return;
        }

        let duration = self.clip.duration;
        if duration <= 0.0 {
            return;
        }

        self.time = (self.time + dt).rem_euclid(duration);
    }

    /// Writes the sampled pose of every bound track into the scene.
    pub fn apply(&mut self, scene: &mut Scene) {
        if !self.enabled {
            return;
        }

        let time = self.time;
        for binding in &self.bindings {
            let Some(track) = self.clip.tracks.get(binding.track_index) else {
                continue;
            };
            let Some(cursor) = self.track_cursors.get_mut(binding.track_index) else {
                continue;
            };
            let Some(node) = scene.get_node_mut(binding.node_handle) else {
                continue;
            };
            let transform = &mut node.transform;

            match (&track.data, binding.target) {
                (TrackData::Vector3(t), TargetPath::Translation) => {
                    if let Some(v) = t.sample_with_cursor(time, cursor) {
                        transform.position = v;
                    }
                }
                (TrackData::Vector3(t), TargetPath::Scale) => {
                    if let Some(v) = t.sample_with_cursor(time, cursor) {
                        transform.scale = v;
                    }
                }
                (TrackData::Quaternion(t), TargetPath::Rotation) => {
                    if let Some(q) = t.sample_with_cursor(time, cursor) {
                        transform.rotation = q;
                    }
                }
                (TrackData::Scalar(t), TargetPath::TranslationAxis(axis)) => {
                    if let Some(v) = t.sample_with_cursor(time, cursor) {
                        set_axis(&mut transform.position, axis, v);
                    }
                }
                (TrackData::Scalar(t), TargetPath::ScaleAxis(axis)) => {
                    if let Some(v) = t.sample_with_cursor(time, cursor) {
                        set_axis(&mut transform.scale, axis, v);
                    }
                }
                (TrackData::Scalar(t), TargetPath::RotationAxis(axis)) => {
                    if let Some(v) = t.sample_with_cursor(time, cursor) {
                        let (x, y, z) = transform.rotation.to_euler(EulerRot::XYZ);
                        let mut euler = Vec3::new(x, y, z);
                        set_axis(&mut euler, axis, v);
                        transform.rotation = Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z);
                    }
                }
                _ => {}
            }
        }
    }
}

fn set_axis(v: &mut Vec3, axis: Axis, value: f32) {
    v[axis.index()] = value;
}
