//! Embedded script host.
//!
//! Generated scene and clip sources run on a [`rhai`] engine. Nothing is
//! registered globally: every constructor is a method of the `THREE`
//! capability object pushed into the script scope, e.g.
//!
//! ```text
//! let body = THREE.Mesh(THREE.BoxGeometry(1, 2, 1), THREE.MeshStandardMaterial(#{ color: "#3366ff" }));
//! let root = THREE.Group();
//! root.add(body);
//! return root;
//! ```
//!
//! Nodes and skeletons are created in a staging scene owned by the
//! [`BuildContext`]; the caller decides what to keep.

pub mod animation_api;
pub mod context;
pub mod math_api;
pub mod scene_api;

pub use animation_api::{ClipValue, TrackValue};
pub use context::{BuildContext, SharedContext, Three};
pub use math_api::{Box3Value, QuatValue, Vector3Value};
pub use scene_api::{GeometryRef, MaterialRef, NodeRef, SkeletonRef};

use rhai::{Dynamic, Engine, EvalAltResult, Scope};

use crate::errors::BuildError;
use crate::settings::ScriptSettings;

pub(crate) type ScriptResult<T> = Result<T, Box<EvalAltResult>>;

/// Name of the capability object inside scripts.
pub const CAPABILITY_NAME: &str = "THREE";

pub(crate) fn to_f32(value: &Dynamic, what: &str) -> ScriptResult<f32> {
    let number = if let Ok(f) = value.as_float() {
        f as f32
    } else if let Ok(i) = value.as_int() {
        i as f32
    } else {
        return Err(format!("{what} must be a number, got {}", value.type_name()).into());
    };
    if number.is_finite() {
        Ok(number)
    } else {
        Err(format!("{what} must be finite").into())
    }
}

/// A segment count clamped to `min..=max`.
pub(crate) fn to_segments(value: &Dynamic, what: &str, min: u32, max: u32) -> ScriptResult<u32> {
    let number = to_f32(value, what)?;
    if number < 0.0 {
        return Err(format!("{what} must not be negative").into());
    }
    let clamped = (number as u32).clamp(min, max.max(min));
    if clamped != number as u32 {
        log::warn!("{what} {number} clamped to {clamped}");
    }
    Ok(clamped)
}

/// A configured engine with the full capability surface registered.
pub struct ScriptHost {
    engine: Engine,
}

impl ScriptHost {
    #[must_use]
    pub fn new(settings: &ScriptSettings) -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(settings.max_operations);
        engine.set_max_call_levels(settings.max_call_levels);
        engine.set_max_array_size(settings.max_array_size);
        engine.set_max_string_size(settings.max_string_size);
        engine.on_print(|text| log::info!("[script] {text}"));
        engine.on_debug(|text, _, pos| log::debug!("[script] {pos:?} {text}"));

        math_api::register(&mut engine);
        scene_api::register(&mut engine, settings.max_segments);
        animation_api::register(&mut engine);

        Self { engine }
    }

    /// Runs `source` as a function body with `THREE` bound to `ctx`.
    ///
    /// `bind` may push extra variables into the scope. A typed error recorded
    /// by a capability call takes precedence over the script error it caused.
    pub fn run(
        &self,
        source: &str,
        ctx: &SharedContext,
        bind: impl FnOnce(&mut Scope<'static>),
    ) -> Result<Dynamic, BuildError> {
        let mut scope = Scope::new();
        scope.push(CAPABILITY_NAME, Three::new(ctx.clone()));
        bind(&mut scope);

        match self.engine.eval_with_scope::<Dynamic>(&mut scope, source) {
            Ok(value) => Ok(value),
            Err(err) => Err(ctx
                .borrow_mut()
                .failure
                .take()
                .unwrap_or_else(|| BuildError::from(err))),
        }
    }

    /// Script-facing name of a value's type.
    #[must_use]
    pub fn type_name_of(&self, value: &Dynamic) -> String {
        self.engine.map_type_name(value.type_name()).to_string()
    }
}

impl Default for ScriptHost {
    fn default() -> Self {
        Self::new(&ScriptSettings::default())
    }
}
