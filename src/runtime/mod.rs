//! Scene Runtime
//!
//! [`SceneRuntime`] owns the persistent render context: one backend, one
//! camera with orbit controls, one scene with a fixed ambient + directional
//! light rig, and at most one mounted asset.
//!
//! # Lifecycle
//!
//! 1. Create with [`SceneRuntime::new`] (or [`SceneRuntime::headless`])
//! 2. Drive [`SceneRuntime::frame`] from the host's frame callback
//! 3. Push generated sources with [`SceneRuntime::set_scene_source`] and
//!    [`SceneRuntime::set_animation_source`]
//! 4. Drop it; everything still mounted is released
//!
//! Every rebuild releases the previous asset before building the next one,
//! so live resource counts never grow across rebuilds. Build failures are
//! logged, reported through [`RuntimeEvent`] listeners and returned, but
//! never leave a half-built asset mounted.

pub mod renderer;

pub use renderer::{FrameStats, HeadlessRenderer, RenderBackend, RenderFrame};

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use glam::{Vec3, Vec4};
use rustc_hash::FxHashSet;

use crate::animation::{AnimationAction, AnimationBinder, AnimationMixer, Binder, PlaybackControls};
use crate::assets::{AssetServer, GeometryHandle, MaterialHandle};
use crate::builder::AssetBuilder;
use crate::errors::BuildError;
use crate::resources::color_from_hex;
use crate::scene::{Camera, Light, NodeHandle, Scene, SkeletonKey};
use crate::script::ScriptHost;
use crate::settings::{RuntimeSettings, Settings};
use crate::utils::{OrbitControls, OrbitInput, Timer};

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    /// A new asset is mounted under `root`.
    AssetMounted { root: NodeHandle },
    /// The mounted asset was released.
    AssetCleared,
    BuildFailed(BuildError),
    AnimationReady { clip: String, duration: f32 },
    AnimationFailed(BuildError),
}

type Listener = Box<dyn FnMut(&RuntimeEvent)>;

// ============================================================================
// Scene resources
// ============================================================================

/// What the mounted asset owns.
///
/// Handles are deduplicated, so each one is released exactly once.
#[derive(Debug)]
pub struct SceneResources {
    pub root: NodeHandle,
    pub geometries: FxHashSet<GeometryHandle>,
    pub materials: FxHashSet<MaterialHandle>,
    pub skeletons: FxHashSet<SkeletonKey>,
    /// Skeleton of the first skinned mesh, if any.
    pub skeleton: Option<SkeletonKey>,
    pub mixer: Option<AnimationMixer>,
}

/// Live counters for leak checks and overlays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub live_geometries: usize,
    pub live_materials: usize,
    pub geometries_created: usize,
    pub geometries_disposed: usize,
    pub materials_created: usize,
    pub materials_disposed: usize,
    pub nodes: usize,
    pub frames: u64,
}

/// Camera distance that fits an object of extent `max_dim` into a vertical
/// field of view of `fov_degrees`, scaled by `margin`.
#[must_use]
pub fn framing_distance(max_dim: f32, fov_degrees: f32, margin: f32) -> f32 {
    let half_fov = fov_degrees.to_radians() / 2.0;
    (max_dim / 2.0 / half_fov.tan()).abs() * margin
}

// ============================================================================
// Runtime
// ============================================================================

pub struct SceneRuntime<R: RenderBackend = HeadlessRenderer> {
    settings: RuntimeSettings,
    backend: R,
    host: ScriptHost,
    assets: AssetServer,
    scene: Scene,
    camera: NodeHandle,
    controls: OrbitControls,
    input: OrbitInput,
    timer: Timer,
    size: (u32, u32),

    asset: Option<SceneResources>,
    scene_source: Option<String>,
    animation_source: Option<String>,

    listeners: Vec<Listener>,
}

impl SceneRuntime<HeadlessRenderer> {
    #[must_use]
    pub fn headless(settings: &Settings) -> Self {
        let backend = HeadlessRenderer::new(settings.runtime.width, settings.runtime.height);
        Self::new(backend, settings)
    }
}

impl<R: RenderBackend> SceneRuntime<R> {
    #[must_use]
    pub fn new(mut backend: R, settings: &Settings) -> Self {
        let rs = settings.runtime.clone();
        let mut scene = Scene::new();
        let bg = color_from_hex(rs.background);
        scene.background = Vec4::new(bg.x, bg.y, bg.z, 1.0);

        let camera = scene.add_camera(Camera::new_perspective(rs.fov, rs.aspect(), rs.near, rs.far));
        let start = Vec3::new(0.0, 0.0, rs.camera_distance);
        if let Some(node) = scene.get_node_mut(camera) {
            node.transform.position = start;
        }
        scene.active_camera = Some(camera);

        scene.add_light(Light::new_ambient(color_from_hex(rs.ambient_color), rs.ambient_intensity));
        let sun = scene.add_light(Light::new_directional(
            color_from_hex(rs.directional_color),
            rs.directional_intensity,
        ));
        if let Some(node) = scene.get_node_mut(sun) {
            node.transform.position = Vec3::from_array(rs.directional_position);
            node.transform.look_at(Vec3::ZERO, Vec3::Y);
        }
        scene.update_matrix_world();

        let size = (rs.width, rs.height);
        if size.0 > 0 && size.1 > 0 {
            backend.resize(size.0, size.1);
        }

        log::info!("Scene runtime ready ({}x{}, fov {}°)", size.0, size.1, rs.fov);

        Self {
            controls: OrbitControls::new(start, Vec3::ZERO, rs.damping),
            settings: rs,
            backend,
            host: ScriptHost::new(&settings.script),
            assets: AssetServer::new(),
            scene,
            camera,
            input: OrbitInput::default(),
            timer: Timer::new(),
            size,
            asset: None,
            scene_source: None,
            animation_source: None,
            listeners: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub fn assets(&self) -> &AssetServer {
        &self.assets
    }

    #[must_use]
    pub fn backend(&self) -> &R {
        &self.backend
    }

    #[must_use]
    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    #[must_use]
    pub fn camera_node(&self) -> NodeHandle {
        self.camera
    }

    #[must_use]
    pub fn camera_position(&self) -> Vec3 {
        self.scene
            .get_node(self.camera)
            .map_or(Vec3::ZERO, |n| n.transform.position)
    }

    #[must_use]
    pub fn mounted_root(&self) -> Option<NodeHandle> {
        self.asset.as_ref().map(|a| a.root)
    }

    #[must_use]
    pub fn resources(&self) -> Option<&SceneResources> {
        self.asset.as_ref()
    }

    #[must_use]
    pub fn scene_source(&self) -> Option<&str> {
        self.scene_source.as_deref()
    }

    #[must_use]
    pub fn animation_source(&self) -> Option<&str> {
        self.animation_source.as_deref()
    }

    #[must_use]
    pub fn stats(&self) -> RuntimeStats {
        let counters = self.assets.counters();
        RuntimeStats {
            live_geometries: counters.geometries.live,
            live_materials: counters.materials.live,
            geometries_created: counters.geometries.created,
            geometries_disposed: counters.geometries.disposed,
            materials_created: counters.materials.created,
            materials_disposed: counters.materials.disposed,
            nodes: self.scene.nodes.len(),
            frames: self.timer.frame_count,
        }
    }

    /// Ordered bone names of the mounted skeleton.
    #[must_use]
    pub fn bone_names(&self) -> Vec<String> {
        let Some(key) = self.asset.as_ref().and_then(|a| a.skeleton) else {
            return Vec::new();
        };
        self.scene.skeletons.get(key).map_or_else(Vec::new, |skeleton| {
            skeleton
                .bones
                .iter()
                .filter_map(|&b| self.scene.get_node(b).map(|n| n.name.clone()))
                .collect()
        })
    }

    pub fn on_event(&mut self, listener: impl FnMut(&RuntimeEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: &RuntimeEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }

    // ========================================================================
    // Frame loop
    // ========================================================================

    /// Host pointer input for the next frame.
    pub fn push_input(&mut self, input: OrbitInput) {
        self.input.rotate += input.rotate;
        self.input.pan += input.pan;
        self.input.zoom += input.zoom;
    }

    /// Advances the mixer, updates the controls and renders one frame.
    pub fn frame(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.timer.advance(Duration::from_secs_f32(dt));

        if let Some(asset) = &mut self.asset
            && let Some(mixer) = &mut asset.mixer
        {
            mixer.update(dt, &mut self.scene);
        }

        let mut input = std::mem::take(&mut self.input);
        input.viewport_height = self.size.1 as f32;
        if let Some((transform, camera)) = self.scene.query_camera_bundle(self.camera) {
            let fov = camera.fov.to_degrees();
            self.controls.update(transform, &input, fov, dt);
        }

        self.scene.update_matrix_world();
        self.scene.update_skeletons();

        if let Some(camera) = self.scene.main_camera() {
            self.backend.render(&RenderFrame {
                scene: &self.scene,
                camera,
                assets: &self.assets,
                background: self.scene.background,
            });
        }
    }

    /// Frame driven by wall-clock time since the previous frame.
    pub fn tick(&mut self) {
        let dt = self.timer.lap();
        self.frame(dt.as_secs_f32());
    }

    /// Layout-change notification from the host. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        self.backend.resize(width, height);
        let aspect = width as f32 / height as f32;
        if let Some((transform, camera)) = self.scene.query_camera_bundle(self.camera) {
            camera.set_aspect(aspect);
            camera.update_view_projection(transform.world_matrix());
        }
    }

    // ========================================================================
    // Asset lifecycle
    // ========================================================================

    /// Replaces the mounted asset with the result of `source`.
    ///
    /// The previous asset is released first, whether or not the new one
    /// builds. When an animation source is current it is re-bound to the new
    /// asset.
    pub fn set_scene_source(&mut self, source: &str) -> Result<NodeHandle, BuildError> {
        self.dispose_asset();
        self.scene_source = Some(source.to_string());

        let built = match AssetBuilder::build(&self.host, source, &mut self.scene, &self.assets) {
            Ok(built) => built,
            Err(err) => {
                log::error!("Scene build failed: {err}");
                self.emit(&RuntimeEvent::BuildFailed(err.clone()));
                return Err(err);
            }
        };

        let root = built.root;
        let skeleton = self
            .scene
            .find_skinned(root)
            .and_then(|h| self.scene.get_node(h))
            .and_then(|n| n.skin.as_ref())
            .map(|s| s.skeleton);
        self.asset = Some(SceneResources {
            root,
            geometries: built.resources.geometries,
            materials: built.resources.materials,
            skeletons: built.resources.skeletons,
            skeleton,
            mixer: None,
        });

        self.frame_asset(root);
        self.emit(&RuntimeEvent::AssetMounted { root });

        if let Some(source) = self.animation_source.clone() {
            // Failure is reported through events; the asset stays mounted
            let _ = self.bind_animation(&source);
        }
        Ok(root)
    }

    /// Releases the mounted asset and forgets both sources.
    pub fn clear(&mut self) {
        self.dispose_asset();
        self.scene_source = None;
        self.animation_source = None;
    }

    fn dispose_asset(&mut self) {
        let Some(asset) = self.asset.take() else {
            return;
        };
        let removed = self.scene.remove_node(asset.root);
        for key in &asset.skeletons {
            self.scene.skeletons.remove(*key);
        }
        for &handle in &asset.geometries {
            self.assets.dispose_geometry(handle);
        }
        for &handle in &asset.materials {
            self.assets.dispose_material(handle);
        }
        log::debug!(
            "Released asset: {removed} nodes, {} geometries, {} materials",
            asset.geometries.len(),
            asset.materials.len()
        );
        self.emit(&RuntimeEvent::AssetCleared);
    }

    /// Points the camera at the asset's bounding box from +Z.
    fn frame_asset(&mut self, root: NodeHandle) {
        self.scene.update_matrix_world();
        let Some(bbox) = self.scene.bounding_box_of(root, &self.assets) else {
            log::debug!("Mounted asset has no geometry; camera left in place");
            return;
        };
        let center = bbox.center();
        let distance = framing_distance(bbox.max_dimension(), self.settings.fov, self.settings.framing_margin);
        let position = center + Vec3::new(0.0, 0.0, distance);

        if let Some(node) = self.scene.get_node_mut(self.camera) {
            node.transform.position = position;
            node.transform.look_at(center, Vec3::Y);
        }
        self.controls.look_from(position, center);
        self.scene.update_matrix_world();
    }

    // ========================================================================
    // Animation
    // ========================================================================

    /// Compiles `source` and plays it in a loop on the mounted skinned mesh.
    ///
    /// The source is kept and re-applied after every later asset rebuild.
    pub fn set_animation_source(&mut self, source: &str) -> Result<(), BuildError> {
        self.animation_source = Some(source.to_string());
        self.bind_animation(source)
    }

    pub fn clear_animation(&mut self) {
        self.animation_source = None;
        if let Some(asset) = &mut self.asset {
            asset.mixer = None;
        }
    }

    fn bind_animation(&mut self, source: &str) -> Result<(), BuildError> {
        let result = self.try_bind_animation(source);
        match &result {
            Ok((clip, duration)) => {
                self.emit(&RuntimeEvent::AnimationReady {
                    clip: clip.clone(),
                    duration: *duration,
                });
            }
            Err(err) => {
                log::error!("Animation bind failed: {err}");
                self.emit(&RuntimeEvent::AnimationFailed(err.clone()));
            }
        }
        result.map(|_| ())
    }

    fn try_bind_animation(&mut self, source: &str) -> Result<(String, f32), BuildError> {
        let bone_names = self.bone_names();
        let Some(asset) = &mut self.asset else {
            return Err(BuildError::NoAsset);
        };
        // The previous mixer goes first; the asset itself is untouched
        asset.mixer = None;

        let skinned = self
            .scene
            .find_skinned(asset.root)
            .ok_or(BuildError::MissingSkinnedMesh)?;
        let clip = Arc::new(AnimationBinder::compile(&self.host, source, &bone_names)?);

        let mut action = AnimationAction::new(Arc::clone(&clip));
        action.bindings = Binder::bind(&self.scene, skinned, &clip);
        action.play();

        let mut mixer = AnimationMixer::new();
        mixer.add_action(action);
        asset.mixer = Some(mixer);

        log::info!("Playing clip `{}` on `{}`", clip.name, self.scene.get_node(skinned).map_or("", |n| n.name.as_str()));
        Ok((clip.name.clone(), clip.duration))
    }

    /// Controls for the playing action; `None` without a bound clip.
    pub fn playback(&mut self) -> Option<PlaybackControls<'_>> {
        let mixer = self.asset.as_mut()?.mixer.as_mut()?;
        mixer.action_mut(0).map(PlaybackControls::new)
    }
}

impl<R: RenderBackend> Drop for SceneRuntime<R> {
    fn drop(&mut self) {
        self.listeners.clear();
        self.dispose_asset();
    }
}

// ============================================================================
// SceneSink
// ============================================================================

/// Receiver for sources produced by the pipeline.
///
/// Implementations contain their own failures; the pipeline never waits on
/// or reacts to a build.
pub trait SceneSink {
    fn show_scene(&mut self, source: &str);
    fn show_animation(&mut self, source: &str);
    fn clear(&mut self);
}

impl<R: RenderBackend> SceneSink for SceneRuntime<R> {
    fn show_scene(&mut self, source: &str) {
        let _ = self.set_scene_source(source);
    }

    fn show_animation(&mut self, source: &str) {
        let _ = self.set_animation_source(source);
    }

    fn clear(&mut self) {
        SceneRuntime::clear(self);
    }
}

impl<T: SceneSink> SceneSink for Rc<RefCell<T>> {
    fn show_scene(&mut self, source: &str) {
        self.borrow_mut().show_scene(source);
    }

    fn show_animation(&mut self, source: &str) {
        self.borrow_mut().show_animation(source);
    }

    fn clear(&mut self) {
        self.borrow_mut().clear();
    }
}

/// Sink that drops everything, for pipelines without a viewer.
impl SceneSink for () {
    fn show_scene(&mut self, _source: &str) {}
    fn show_animation(&mut self, _source: &str) {}
    fn clear(&mut self) {}
}
