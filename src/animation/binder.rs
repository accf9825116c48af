use rhai::{Array, Dynamic};

use crate::animation::action::AnimationAction;
use crate::animation::binding::PropertyBinding;
use crate::animation::clip::AnimationClip;
use crate::assets::AssetServer;
use crate::errors::BuildError;
use crate::scene::{NodeHandle, Scene};
use crate::script::{BuildContext, ClipValue, ScriptHost};

pub struct Binder;

impl Binder {
    /// Resolves every track of `clip` to a node.
    ///
    /// Names are looked up among the bones of `root`'s skeleton first, then in
    /// the subtree under `root`. Tracks whose node cannot be found are skipped
    /// with a warning; bone names are never checked before the clip runs.
    #[must_use]
    pub fn bind(scene: &Scene, root: NodeHandle, clip: &AnimationClip) -> Vec<PropertyBinding> {
        let bones: &[NodeHandle] = scene
            .get_node(root)
            .and_then(|n| n.skin.as_ref())
            .and_then(|skin| scene.skeletons.get(skin.skeleton))
            .map_or(&[], |skeleton| skeleton.bones.as_slice());

        let mut bindings = Vec::with_capacity(clip.tracks.len());

        for (track_index, track) in clip.tracks.iter().enumerate() {
            let node_name = &track.target.node_name;
            let found = bones
                .iter()
                .copied()
                .find(|&b| scene.get_node(b).is_some_and(|n| n.name == *node_name))
                .or_else(|| scene.find_by_name(root, node_name));
            match found {
                Some(node_handle) => bindings.push(PropertyBinding {
                    track_index,
                    node_handle,
                    target: track.target.path,
                }),
                None => log::warn!(
                    "Clip `{}`: no node named `{node_name}` for track `{}`",
                    clip.name,
                    track.name
                ),
            }
        }

        bindings
    }
}

pub struct AnimationBinder;

impl AnimationBinder {
    /// Executes clip source with `bones` (ordered bone names) in scope.
    ///
    /// The script must return exactly one clip holding at least one track.
    pub fn compile(
        host: &ScriptHost,
        source: &str,
        bone_names: &[String],
    ) -> Result<AnimationClip, BuildError> {
        // Clip scripts never create scene resources; the context only carries
        // the capability object and failure slot.
        let ctx = BuildContext::shared(AssetServer::new());
        let bones: Array = bone_names.iter().map(|n| Dynamic::from(n.clone())).collect();

        let outcome = host.run(source, &ctx, |scope| {
            scope.push("bones", bones);
        });
        let value = match outcome {
            Ok(value) => value,
            Err(err) => {
                ctx.borrow_mut().release_all();
                return Err(err);
            }
        };

        let type_name = host.type_name_of(&value);
        let Some(ClipValue(clip)) = value.try_cast::<ClipValue>() else {
            ctx.borrow_mut().release_all();
            return Err(BuildError::NotAClip(type_name));
        };
        ctx.borrow_mut().release_all();

        if clip.tracks.is_empty() {
            return Err(BuildError::EmptyClip(clip.name));
        }
        log::info!(
            "Compiled clip `{}`: {} tracks, {:.2}s",
            clip.name,
            clip.tracks.len(),
            clip.duration
        );
        Ok(clip)
    }
}

/// Playback handle for the active action.
///
/// Borrows the runtime, so it cannot outlive a rebuild.
pub struct PlaybackControls<'a> {
    action: &'a mut AnimationAction,
}

impl<'a> PlaybackControls<'a> {
    pub(crate) fn new(action: &'a mut AnimationAction) -> Self {
        Self { action }
    }

    /// Resumes when paused, starts when stopped, no-op when playing.
    pub fn play(&mut self) {
        self.action.play();
    }

    pub fn pause(&mut self) {
        self.action.pause();
    }

    /// Time back to zero and playing, whatever the prior state.
    pub fn restart(&mut self) {
        self.action.restart();
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.action.is_playing()
    }

    #[must_use]
    pub fn time(&self) -> f32 {
        self.action.time
    }

    #[must_use]
    pub fn clip_name(&self) -> &str {
        &self.action.clip().name
    }
}
