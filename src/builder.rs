//! Asset Builder
//!
//! Runs generated scene source against the `THREE` capability object and
//! mounts the returned node into a scene.
//!
//! Every node and skeleton the script creates lives in a staging scene. Only
//! the subtree of the returned node is grafted into the destination; the
//! staging scene is dropped afterwards. Geometries and materials go straight
//! into the shared [`AssetServer`], so whatever the returned subtree does not
//! reference is released before `build` returns. On failure everything the
//! script created is released.

use crate::assets::AssetServer;
use crate::errors::BuildError;
use crate::scene::{NodeHandle, Scene, SubtreeResources};
use crate::script::{BuildContext, NodeRef, ScriptHost, SharedContext};

/// A successfully mounted asset.
#[derive(Debug, Clone)]
pub struct BuiltAsset {
    /// Root node in the destination scene.
    pub root: NodeHandle,
    /// Deduplicated geometry, material and skeleton references of the subtree.
    pub resources: SubtreeResources,
}

pub struct AssetBuilder;

impl AssetBuilder {
    /// Executes `source` and grafts the node it returns into `scene` as a new
    /// root. No partial results: on error nothing is mounted and every
    /// resource the script allocated has been released.
    pub fn build(
        host: &ScriptHost,
        source: &str,
        scene: &mut Scene,
        assets: &AssetServer,
    ) -> Result<BuiltAsset, BuildError> {
        let ctx = BuildContext::shared(assets.clone());
        let outcome = Self::execute(host, source, &ctx, scene);

        let mut ctx = ctx.borrow_mut();
        match outcome {
            Ok(built) => {
                let (mut released_geometries, mut released_materials) = (0, 0);
                for handle in std::mem::take(&mut ctx.geometries) {
                    if !built.resources.geometries.contains(&handle) && ctx.assets.dispose_geometry(handle) {
                        released_geometries += 1;
                    }
                }
                for handle in std::mem::take(&mut ctx.materials) {
                    if !built.resources.materials.contains(&handle) && ctx.assets.dispose_material(handle) {
                        released_materials += 1;
                    }
                }
                if released_geometries + released_materials > 0 {
                    log::debug!(
                        "Released {released_geometries} geometries and {released_materials} materials not reachable from the returned node"
                    );
                }
                log::info!(
                    "Built asset: {} geometries, {} materials, {} skeletons",
                    built.resources.geometries.len(),
                    built.resources.materials.len(),
                    built.resources.skeletons.len()
                );
                Ok(built)
            }
            Err(err) => {
                ctx.release_all();
                Err(err)
            }
        }
    }

    fn execute(
        host: &ScriptHost,
        source: &str,
        ctx: &SharedContext,
        scene: &mut Scene,
    ) -> Result<BuiltAsset, BuildError> {
        let value = host.run(source, ctx, |_| {})?;
        let type_name = host.type_name_of(&value);
        let Some(node) = value.try_cast::<NodeRef>() else {
            return Err(BuildError::NotANode(type_name));
        };

        let staging = ctx.borrow();
        let resources = staging.scene.subtree_resources(node.handle());
        let grafted = scene.graft_subtree(&staging.scene, node.handle())?;

        // Skeleton keys now refer to the destination scene
        let mut resources = resources;
        resources.skeletons = grafted.skeletons.iter().copied().collect();

        scene.update_subtree(grafted.root);
        Ok(BuiltAsset {
            root: grafted.root,
            resources,
        })
    }
}
