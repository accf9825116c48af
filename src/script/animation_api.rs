//! Keyframe track and animation clip constructors.

use rhai::{Array, Dynamic, Engine, ImmutableString};

use crate::animation::clip::{AnimationClip, Track, TrackKind};
use crate::errors::BuildError;
use crate::script::context::Three;
use crate::script::{ScriptResult, to_f32};

#[derive(Debug, Clone)]
pub struct TrackValue(pub Track);

#[derive(Debug, Clone)]
pub struct ClipValue(pub AnimationClip);

/// Records the typed error on the context and unwinds the script with it.
fn fail<T>(three: &Three, err: BuildError) -> ScriptResult<T> {
    let message = err.to_string();
    three.ctx.borrow_mut().failure = Some(err);
    Err(message.into())
}

fn float_array(values: &Array, what: &str) -> ScriptResult<Vec<f32>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| to_f32(v, &format!("{what}[{i}]")))
        .collect()
}

fn make_track(
    three: &Three,
    kind: TrackKind,
    name: &str,
    times: &Array,
    values: &Array,
) -> ScriptResult<TrackValue> {
    let times = float_array(times, "times")?;
    let values = float_array(values, "values")?;
    match Track::from_raw(kind, name, times, &values) {
        Ok(track) => Ok(TrackValue(track)),
        Err(err) => fail(three, err),
    }
}

fn make_clip(three: &Three, name: &str, duration: &Dynamic, tracks: &Array) -> ScriptResult<ClipValue> {
    let duration = to_f32(duration, "duration")?;
    let mut collected = Vec::with_capacity(tracks.len());
    for (i, value) in tracks.iter().enumerate() {
        let Some(track) = value.clone().try_cast::<TrackValue>() else {
            return Err(format!("tracks[{i}] is not a keyframe track, got {}", value.type_name()).into());
        };
        collected.push(track.0);
    }
    if collected.is_empty() {
        return fail(three, BuildError::EmptyClip(name.to_string()));
    }
    Ok(ClipValue(AnimationClip::with_duration(
        name.to_string(),
        duration,
        collected,
    )))
}

pub(crate) fn register(engine: &mut Engine) {
    engine
        .register_type_with_name::<TrackValue>("KeyframeTrack")
        .register_type_with_name::<ClipValue>("AnimationClip")
        .register_fn(
            "VectorKeyframeTrack",
            |three: Three, name: ImmutableString, times: Array, values: Array| {
                make_track(&three, TrackKind::Vector, &name, &times, &values)
            },
        )
        .register_fn(
            "QuaternionKeyframeTrack",
            |three: Three, name: ImmutableString, times: Array, values: Array| {
                make_track(&three, TrackKind::Quaternion, &name, &times, &values)
            },
        )
        .register_fn(
            "NumberKeyframeTrack",
            |three: Three, name: ImmutableString, times: Array, values: Array| {
                make_track(&three, TrackKind::Number, &name, &times, &values)
            },
        )
        .register_fn(
            "AnimationClip",
            |three: Three, name: ImmutableString, duration: Dynamic, tracks: Array| {
                make_clip(&three, &name, &duration, &tracks)
            },
        )
        .register_fn("AnimationClip", |three: Three, name: ImmutableString, tracks: Array| {
            make_clip(&three, &name, &Dynamic::from_float(-1.0), &tracks)
        })
        .register_get("name", |t: &mut TrackValue| t.0.name.clone())
        .register_get("name", |c: &mut ClipValue| c.0.name.clone())
        .register_get("duration", |c: &mut ClipValue| f64::from(c.0.duration));
}
