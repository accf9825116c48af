use glam::{EulerRot, Quat, Vec3};

use crate::animation::binding::{TargetPath, TrackTarget, parse_track_name};
use crate::animation::tracks::{KeyframeTrack, validate_times};
use crate::errors::BuildError;

/// Constructor family a track was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    /// Three floats per keyframe
    Vector,
    /// Four floats (x, y, z, w) per keyframe
    Quaternion,
    /// One float per keyframe
    Number,
}

impl TrackKind {
    #[must_use]
    pub fn item_size(self) -> usize {
        match self {
            TrackKind::Vector => 3,
            TrackKind::Quaternion => 4,
            TrackKind::Number => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TrackData {
    Vector3(KeyframeTrack<Vec3>),
    Quaternion(KeyframeTrack<Quat>),
    Scalar(KeyframeTrack<f32>),
}

impl TrackData {
    #[must_use]
    pub fn end_time(&self) -> f32 {
        match self {
            TrackData::Vector3(t) => t.end_time(),
            TrackData::Quaternion(t) => t.end_time(),
            TrackData::Scalar(t) => t.end_time(),
        }
    }
}

/// Full track definition: where it writes plus its keyframes.
#[derive(Debug, Clone)]
pub struct Track {
    /// Name as written by the clip source, e.g. `spine.quaternion`
    pub name: String,
    pub target: TrackTarget,
    pub data: TrackData,
}

impl Track {
    /// Builds a track from flat keyframe arrays, validating the name, the
    /// time ordering and the value count.
    pub fn from_raw(
        kind: TrackKind,
        name: &str,
        times: Vec<f32>,
        values: &[f32],
    ) -> Result<Self, BuildError> {
        let invalid = |reason: String| BuildError::InvalidTrack {
            name: name.to_string(),
            reason,
        };

        let target = parse_track_name(name).map_err(invalid)?;
        validate_times(&times).map_err(invalid)?;

        let item_size = kind.item_size();
        if values.len() != times.len() * item_size {
            return Err(invalid(format!(
                "expected {} values for {} keyframes, got {}",
                times.len() * item_size,
                times.len(),
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(invalid("keyframe values must be finite".to_string()));
        }

        let data = match (kind, target.path) {
            (TrackKind::Vector, TargetPath::Translation | TargetPath::Scale) => {
                let values = values.chunks_exact(3).map(Vec3::from_slice).collect();
                TrackData::Vector3(KeyframeTrack::new(times, values))
            }
            // Euler keyframes are converted once so rotation always blends as quaternions
            (TrackKind::Vector, TargetPath::Rotation) if target.property == "rotation" => {
                let values = values
                    .chunks_exact(3)
                    .map(|e| Quat::from_euler(EulerRot::XYZ, e[0], e[1], e[2]))
                    .collect();
                TrackData::Quaternion(KeyframeTrack::new(times, values))
            }
            (TrackKind::Quaternion, TargetPath::Rotation) if target.property == "quaternion" => {
                let values = values
                    .chunks_exact(4)
                    .map(|q| {
                        let q = Quat::from_xyzw(q[0], q[1], q[2], q[3]);
                        if q.length_squared() <= f32::EPSILON {
                            return Err(invalid("quaternion keyframes must not be zero".to_string()));
                        }
                        Ok(q.normalize())
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                TrackData::Quaternion(KeyframeTrack::new(times, values))
            }
            (
                TrackKind::Number,
                TargetPath::TranslationAxis(_) | TargetPath::RotationAxis(_) | TargetPath::ScaleAxis(_),
            ) => TrackData::Scalar(KeyframeTrack::new(times, values.to_vec())),
            (kind, _) => {
                return Err(invalid(format!(
                    "a {kind:?} track cannot animate `{}`",
                    target.property
                )));
            }
        };

        Ok(Self {
            name: name.to_string(),
            target,
            data,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    /// Creates a clip whose duration is the latest keyframe time.
    #[must_use]
    pub fn new(name: String, tracks: Vec<Track>) -> Self {
        let duration = tracks
            .iter()
            .map(|t| t.data.end_time())
            .fold(0.0_f32, f32::max);

        Self {
            name,
            duration,
            tracks,
        }
    }

    /// Creates a clip with an explicit duration; a negative value means
    /// "compute from the tracks".
    #[must_use]
    pub fn with_duration(name: String, duration: f32, tracks: Vec<Track>) -> Self {
        let mut clip = Self::new(name, tracks);
        if duration >= 0.0 && duration.is_finite() {
            clip.duration = duration;
        }
        clip
    }

    /// Ordered, deduplicated node names the clip targets.
    #[must_use]
    pub fn target_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for track in &self.tracks {
            let name = track.target.node_name.as_str();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_validates_value_count() {
        let err = Track::from_raw(TrackKind::Vector, "hips.position", vec![0.0, 1.0], &[0.0; 5])
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidTrack { .. }));
    }

    #[test]
    fn test_from_raw_rejects_mismatched_kind() {
        let err = Track::from_raw(TrackKind::Quaternion, "hips.position", vec![0.0], &[0.0, 0.0, 0.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidTrack { .. }));
    }

    #[test]
    fn test_clip_duration_defaults_to_last_key() {
        let track = Track::from_raw(TrackKind::Number, "hips.position.y", vec![0.0, 0.5, 1.5], &[0.0, 1.0, 0.0])
            .unwrap();
        let clip = AnimationClip::with_duration("bob".into(), -1.0, vec![track]);
        assert!((clip.duration - 1.5).abs() < 1e-6);
    }
}
