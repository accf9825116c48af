//! `Vector3`, `Quaternion` and `Box3` helpers.

use glam::{EulerRot, Quat, Vec3};
use rhai::{Array, Dynamic, Engine};

use crate::resources::BoundingBox;
use crate::script::context::Three;
use crate::script::scene_api::NodeRef;
use crate::script::{ScriptResult, to_f32};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3Value(pub Vec3);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuatValue(pub Quat);

impl Default for QuatValue {
    fn default() -> Self {
        Self(Quat::IDENTITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box3Value(pub Option<BoundingBox>);

fn vec3(x: &Dynamic, y: &Dynamic, z: &Dynamic) -> ScriptResult<Vec3> {
    Ok(Vec3::new(to_f32(x, "x")?, to_f32(y, "y")?, to_f32(z, "z")?))
}

fn floats(values: &[f32]) -> Array {
    values.iter().map(|&v| Dynamic::from_float(f64::from(v))).collect()
}

pub(crate) fn register(engine: &mut Engine) {
    // ========================================================================
    // Vector3
    // ========================================================================
    engine
        .register_type_with_name::<Vector3Value>("Vector3")
        .register_fn("Vector3", |_: Three| Vector3Value::default())
        .register_fn("Vector3", |_: Three, x: Dynamic, y: Dynamic, z: Dynamic| {
            vec3(&x, &y, &z).map(Vector3Value)
        })
        .register_get("x", |v: &mut Vector3Value| f64::from(v.0.x))
        .register_set("x", |v: &mut Vector3Value, value: Dynamic| -> ScriptResult<()> {
            v.0.x = to_f32(&value, "x")?;
            Ok(())
        })
        .register_get("y", |v: &mut Vector3Value| f64::from(v.0.y))
        .register_set("y", |v: &mut Vector3Value, value: Dynamic| -> ScriptResult<()> {
            v.0.y = to_f32(&value, "y")?;
            Ok(())
        })
        .register_get("z", |v: &mut Vector3Value| f64::from(v.0.z))
        .register_set("z", |v: &mut Vector3Value, value: Dynamic| -> ScriptResult<()> {
            v.0.z = to_f32(&value, "z")?;
            Ok(())
        })
        .register_fn(
            "set",
            |v: &mut Vector3Value, x: Dynamic, y: Dynamic, z: Dynamic| -> ScriptResult<()> {
                v.0 = vec3(&x, &y, &z)?;
                Ok(())
            },
        )
        .register_fn("length", |v: &mut Vector3Value| f64::from(v.0.length()))
        .register_fn("to_array", |v: &mut Vector3Value| floats(&v.0.to_array()))
        .register_fn("+", |a: Vector3Value, b: Vector3Value| Vector3Value(a.0 + b.0))
        .register_fn("-", |a: Vector3Value, b: Vector3Value| Vector3Value(a.0 - b.0))
        .register_fn("*", |a: Vector3Value, s: f64| Vector3Value(a.0 * s as f32))
        .register_fn("*", |a: Vector3Value, s: rhai::INT| Vector3Value(a.0 * s as f32))
        .register_fn("to_string", |v: &mut Vector3Value| {
            format!("Vector3({}, {}, {})", v.0.x, v.0.y, v.0.z)
        });

    // ========================================================================
    // Quaternion
    // ========================================================================
    engine
        .register_type_with_name::<QuatValue>("Quaternion")
        .register_fn("Quaternion", |_: Three| QuatValue(Quat::IDENTITY))
        .register_fn(
            "Quaternion",
            |_: Three, x: Dynamic, y: Dynamic, z: Dynamic, w: Dynamic| -> ScriptResult<QuatValue> {
                let q = Quat::from_xyzw(
                    to_f32(&x, "x")?,
                    to_f32(&y, "y")?,
                    to_f32(&z, "z")?,
                    to_f32(&w, "w")?,
                );
                Ok(QuatValue(q.normalize()))
            },
        )
        .register_fn(
            "QuaternionFromEuler",
            |_: Three, x: Dynamic, y: Dynamic, z: Dynamic| -> ScriptResult<QuatValue> {
                let e = vec3(&x, &y, &z)?;
                Ok(QuatValue(Quat::from_euler(EulerRot::XYZ, e.x, e.y, e.z)))
            },
        )
        .register_fn(
            "set_from_euler",
            |q: &mut QuatValue, x: Dynamic, y: Dynamic, z: Dynamic| -> ScriptResult<QuatValue> {
                let e = vec3(&x, &y, &z)?;
                q.0 = Quat::from_euler(EulerRot::XYZ, e.x, e.y, e.z);
                Ok(*q)
            },
        )
        .register_fn(
            "set_from_axis_angle",
            |q: &mut QuatValue, axis: Vector3Value, angle: Dynamic| -> ScriptResult<QuatValue> {
                let axis = axis.0.try_normalize().ok_or("axis must not be zero")?;
                q.0 = Quat::from_axis_angle(axis, to_f32(&angle, "angle")?);
                Ok(*q)
            },
        )
        .register_get("x", |q: &mut QuatValue| f64::from(q.0.x))
        .register_get("y", |q: &mut QuatValue| f64::from(q.0.y))
        .register_get("z", |q: &mut QuatValue| f64::from(q.0.z))
        .register_get("w", |q: &mut QuatValue| f64::from(q.0.w))
        .register_fn("to_array", |q: &mut QuatValue| floats(&q.0.to_array()));

    // ========================================================================
    // Box3
    // ========================================================================
    engine
        .register_type_with_name::<Box3Value>("Box3")
        .register_fn("Box3", |_: Three| Box3Value(None))
        .register_fn("set_from_object", |b: &mut Box3Value, node: NodeRef| {
            b.0 = node.world_bounding_box();
            *b
        })
        .register_fn("is_empty", |b: &mut Box3Value| b.0.is_none())
        .register_fn("get_center", |b: &mut Box3Value| {
            Vector3Value(b.0.map_or(Vec3::ZERO, |bbox| bbox.center()))
        })
        .register_fn("get_size", |b: &mut Box3Value| {
            Vector3Value(b.0.map_or(Vec3::ZERO, |bbox| bbox.size()))
        })
        .register_get("min", |b: &mut Box3Value| Vector3Value(b.0.map_or(Vec3::ZERO, |bbox| bbox.min)))
        .register_get("max", |b: &mut Box3Value| Vector3Value(b.0.map_or(Vec3::ZERO, |bbox| bbox.max)));
}
