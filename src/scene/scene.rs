use glam::{Vec3, Vec4};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use crate::assets::{AssetServer, GeometryHandle, MaterialHandle};
use crate::errors::BuildError;
use crate::resources::BoundingBox;
use crate::scene::camera::Camera;
use crate::scene::light::Light;
use crate::scene::node::Node;
use crate::scene::skeleton::{BindMode, Skeleton};
use crate::scene::transform::Transform;
use crate::scene::transform_system;
use crate::scene::{CameraKey, LightKey, NodeHandle, SkeletonKey};

/// Scene graph
///
/// Pure data: node hierarchy plus component maps. Geometry and material data
/// live in the [`AssetServer`]; nodes only hold handles.
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,

    pub cameras: SlotMap<CameraKey, Camera>,
    pub lights: SlotMap<LightKey, Light>,
    pub skeletons: SlotMap<SkeletonKey, Skeleton>,

    /// Clear color (RGBA)
    pub background: Vec4,

    pub active_camera: Option<NodeHandle>,
}

/// Handles created in the destination scene by [`Scene::graft_subtree`].
#[derive(Debug, Clone)]
pub struct GraftedSubtree {
    pub root: NodeHandle,
    pub nodes: Vec<NodeHandle>,
    pub skeletons: Vec<SkeletonKey>,
}

/// Deduplicated GPU-side resources referenced by a subtree.
#[derive(Debug, Clone, Default)]
pub struct SubtreeResources {
    pub geometries: FxHashSet<GeometryHandle>,
    pub materials: FxHashSet<MaterialHandle>,
    pub skeletons: FxHashSet<SkeletonKey>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            cameras: SlotMap::with_key(),
            lights: SlotMap::with_key(),
            skeletons: SlotMap::with_key(),
            background: Vec4::new(0.0, 0.0, 0.0, 1.0),
            active_camera: None,
        }
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Adds a node as a scene root.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    pub fn add_to_parent(&mut self, mut child: Node, parent: NodeHandle) -> NodeHandle {
        if !self.nodes.contains_key(parent) {
            log::warn!("Parent node not found, adding child as a root");
            child.parent = None;
            return self.add_node(child);
        }
        child.parent = Some(parent);
        let handle = self.nodes.insert(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(handle);
        }
        handle
    }

    /// Moves `child` (with its subtree) under `parent`.
    ///
    /// Returns `false` and leaves the graph untouched when either handle is
    /// stale or the move would create a cycle.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) -> bool {
        if child == parent {
            log::warn!("Cannot attach node to itself");
            return false;
        }
        if !self.nodes.contains_key(child) || !self.nodes.contains_key(parent) {
            log::warn!("Attach called with a stale node handle");
            return false;
        }
        if self.is_ancestor(child, parent) {
            log::warn!("Cannot attach a node below one of its own descendants");
            return false;
        }

        self.unlink(child);

        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.transform.mark_dirty();
        }
        true
    }

    /// Removes `handle` from its parent's child list or from the root list.
    fn unlink(&mut self, handle: NodeHandle) {
        let parent = self.nodes.get(handle).and_then(|n| n.parent);
        match parent {
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(p)
                    && let Some(i) = parent_node.children.iter().position(|&x| x == handle)
                {
                    parent_node.children.remove(i);
                }
            }
            None => self.root_nodes.retain(|&r| r != handle),
        }
    }

    /// Whether `ancestor` lies on the parent chain of `node` (or equals it).
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.nodes.get(handle).and_then(|n| n.parent);
        }
        false
    }

    /// Removes a node and its whole subtree, including camera and light
    /// components. Skeletons and asset handles are left to the caller.
    ///
    /// Returns the number of nodes removed.
    pub fn remove_node(&mut self, handle: NodeHandle) -> usize {
        if !self.nodes.contains_key(handle) {
            return 0;
        }
        self.unlink(handle);

        let subtree = self.collect_subtree(handle);
        for &h in &subtree {
            if let Some(node) = self.nodes.remove(h) {
                if let Some(cam) = node.camera {
                    self.cameras.remove(cam);
                }
                if let Some(light) = node.light {
                    self.lights.remove(light);
                }
            }
            if self.active_camera == Some(h) {
                self.active_camera = None;
            }
        }
        subtree.len()
    }

    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Depth-first pre-order list of `root` and all of its descendants.
    #[must_use]
    pub fn collect_subtree(&self, root: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            out.push(handle);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// First node named `name` in pre-order below (and including) `root`.
    #[must_use]
    pub fn find_by_name(&self, root: NodeHandle, name: &str) -> Option<NodeHandle> {
        self.collect_subtree(root)
            .into_iter()
            .find(|&h| self.nodes.get(h).is_some_and(|n| n.name == name))
    }

    /// First skinned node in pre-order below (and including) `root`.
    #[must_use]
    pub fn find_skinned(&self, root: NodeHandle) -> Option<NodeHandle> {
        self.collect_subtree(root)
            .into_iter()
            .find(|&h| self.nodes.get(h).is_some_and(|n| n.skin.is_some()))
    }

    /// Geometry, material and skeleton references held by a subtree.
    #[must_use]
    pub fn subtree_resources(&self, root: NodeHandle) -> SubtreeResources {
        let mut res = SubtreeResources::default();
        for handle in self.collect_subtree(root) {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            if let Some(mesh) = node.mesh {
                res.geometries.insert(mesh.geometry);
                res.materials.insert(mesh.material);
            }
            if let Some(skin) = &node.skin {
                res.skeletons.insert(skin.skeleton);
            }
        }
        res
    }

    // ========================================================================
    // Components
    // ========================================================================

    pub fn add_skeleton(&mut self, skeleton: Skeleton) -> SkeletonKey {
        self.skeletons.insert(skeleton)
    }

    pub fn add_camera(&mut self, camera: Camera) -> NodeHandle {
        let mut node = Node::new("Camera");
        node.camera = Some(self.cameras.insert(camera));
        self.add_node(node)
    }

    pub fn add_light(&mut self, light: Light) -> NodeHandle {
        let mut node = Node::new("Light");
        node.light = Some(self.lights.insert(light));
        self.add_node(node)
    }

    pub fn query_camera_bundle(
        &mut self,
        node_id: NodeHandle,
    ) -> Option<(&mut Transform, &mut Camera)> {
        let camera_key = self.nodes.get(node_id)?.camera?;
        let camera = self.cameras.get_mut(camera_key)?;
        let transform = &mut self.nodes.get_mut(node_id)?.transform;
        Some((transform, camera))
    }

    #[must_use]
    pub fn main_camera(&self) -> Option<&Camera> {
        let key = self.nodes.get(self.active_camera?)?.camera?;
        self.cameras.get(key)
    }

    // ========================================================================
    // Per-frame updates
    // ========================================================================

    pub fn update_matrix_world(&mut self) {
        transform_system::update_hierarchy_iterative(
            &mut self.nodes,
            &mut self.cameras,
            &self.root_nodes,
        );
    }

    pub fn update_subtree(&mut self, root: NodeHandle) {
        transform_system::update_subtree(&mut self.nodes, &mut self.cameras, root);
    }

    pub fn update_skeletons(&mut self) {
        let mut tasks = Vec::new();
        for (_, node) in &self.nodes {
            if let Some(binding) = &node.skin {
                let root_inv = match binding.bind_mode {
                    BindMode::Attached => node.transform.world_matrix.inverse(),
                    BindMode::Detached => binding.bind_matrix_inv,
                };
                tasks.push((binding.skeleton, root_inv));
            }
        }

        let nodes = &self.nodes;
        for (skeleton_id, root_inv) in tasks {
            if let Some(skeleton) = self.skeletons.get_mut(skeleton_id) {
                skeleton.compute_joint_matrices(nodes, root_inv);
            }
        }
    }

    // ========================================================================
    // Bounds
    // ========================================================================

    fn bbox_of_one_node(&self, handle: NodeHandle, assets: &AssetServer) -> Option<BoundingBox> {
        let node = self.nodes.get(handle)?;
        let mesh = node.mesh?;
        let geometry = assets.get_geometry(mesh.geometry)?;
        let local = geometry.bounding_box?;
        Some(local.transform(&node.transform.world_matrix))
    }

    /// World-space box around every mesh in the subtree.
    ///
    /// Uses the cached world matrices; call [`Scene::update_subtree`] first
    /// when transforms changed since the last update. Returns `None` when the
    /// subtree has no geometry.
    #[must_use]
    pub fn bounding_box_of(&self, root: NodeHandle, assets: &AssetServer) -> Option<BoundingBox> {
        self.collect_subtree(root)
            .into_iter()
            .filter_map(|h| self.bbox_of_one_node(h, assets))
            .reduce(|a, b| a.union(&b))
    }

    // ========================================================================
    // Grafting
    // ========================================================================

    /// Copies the subtree rooted at `root` from `source` into this scene as a
    /// new root, remapping every node and skeleton handle.
    ///
    /// Fails without modifying `self` when a skinned node references a bone
    /// outside the subtree.
    pub fn graft_subtree(
        &mut self,
        source: &Scene,
        root: NodeHandle,
    ) -> Result<GraftedSubtree, BuildError> {
        let order = source.collect_subtree(root);
        if order.is_empty() {
            return Err(BuildError::InvalidHierarchy("root node not found".to_string()));
        }
        let members: FxHashSet<NodeHandle> = order.iter().copied().collect();

        // Validate skeleton references before touching the destination
        let mut skeleton_keys: Vec<SkeletonKey> = Vec::new();
        for &handle in &order {
            let Some(skin) = source.nodes.get(handle).and_then(|n| n.skin.as_ref()) else {
                continue;
            };
            let skeleton = source.skeletons.get(skin.skeleton).ok_or_else(|| {
                BuildError::InvalidHierarchy("skinned mesh bound to a missing skeleton".to_string())
            })?;
            if let Some(outside) = skeleton.bones.iter().find(|b| !members.contains(*b)) {
                let name = source.nodes.get(*outside).map_or("", |n| n.name.as_str());
                return Err(BuildError::InvalidHierarchy(format!(
                    "skeleton bone `{name}` is not part of the returned object"
                )));
            }
            if !skeleton_keys.contains(&skin.skeleton) {
                skeleton_keys.push(skin.skeleton);
            }
        }

        let mut node_map: FxHashMap<NodeHandle, NodeHandle> = FxHashMap::default();
        for &old in &order {
            let Some(src) = source.nodes.get(old) else {
                continue;
            };
            let mut node = src.clone();
            node.parent = None;
            node.children.clear();
            node.skin = None;
            node.camera = src
                .camera
                .and_then(|k| source.cameras.get(k))
                .map(|cam| self.cameras.insert(cam.clone()));
            node.light = src
                .light
                .and_then(|k| source.lights.get(k))
                .map(|light| self.lights.insert(light.clone()));
            node.transform.mark_dirty();
            node_map.insert(old, self.nodes.insert(node));
        }

        let mut skeleton_map: FxHashMap<SkeletonKey, SkeletonKey> = FxHashMap::default();
        for &old_key in &skeleton_keys {
            if let Some(skeleton) = source.skeletons.get(old_key) {
                let mut copy = skeleton.clone();
                copy.bones = skeleton.bones.iter().map(|b| node_map[b]).collect();
                skeleton_map.insert(old_key, self.skeletons.insert(copy));
            }
        }

        // Re-link hierarchy and skin bindings
        for &old in &order {
            let Some(src) = source.nodes.get(old) else {
                continue;
            };
            let new = node_map[&old];
            let children: Vec<NodeHandle> = src
                .children
                .iter()
                .filter_map(|c| node_map.get(c).copied())
                .collect();
            for &child in &children {
                if let Some(c) = self.nodes.get_mut(child) {
                    c.parent = Some(new);
                }
            }
            if let Some(node) = self.nodes.get_mut(new) {
                node.children.extend(children);
                if let Some(skin) = &src.skin {
                    let mut binding = skin.clone();
                    binding.skeleton = skeleton_map[&skin.skeleton];
                    node.skin = Some(binding);
                }
            }
        }

        let new_root = node_map[&root];
        self.root_nodes.push(new_root);

        Ok(GraftedSubtree {
            root: new_root,
            nodes: order.iter().map(|h| node_map[h]).collect(),
            skeletons: skeleton_map.into_values().collect(),
        })
    }

    /// World-space position of a node after the last matrix update.
    #[must_use]
    pub fn world_position(&self, handle: NodeHandle) -> Option<Vec3> {
        self.nodes
            .get(handle)
            .map(|n| n.transform.world_matrix.translation.into())
    }
}
