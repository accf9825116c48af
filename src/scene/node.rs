use glam::Affine3A;
use smallvec::SmallVec;

use crate::assets::{GeometryHandle, MaterialHandle};
use crate::scene::skeleton::SkinBinding;
use crate::scene::transform::Transform;
use crate::scene::{CameraKey, LightKey, NodeHandle};

/// Geometry + material pair drawn at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBinding {
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
}

/// A scene node.
///
/// # Hierarchy
///
/// Nodes form a tree through parent-child relationships:
/// - `parent`: handle to the parent node (None for root nodes)
/// - `children`: child node handles, in insertion order
///
/// Components (mesh, skin, camera, light) are optional. Camera and light data
/// live in the [`Scene`](crate::scene::Scene) component maps and are referenced
/// by key.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,

    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: SmallVec<[NodeHandle; 8]>,

    pub transform: Transform,
    pub visible: bool,

    /// Set for nodes created as skeleton bones
    pub is_bone: bool,

    pub mesh: Option<MeshBinding>,
    pub skin: Option<SkinBinding>,
    pub camera: Option<CameraKey>,
    pub light: Option<LightKey>,
}

impl Node {
    /// Creates an empty node with default transform and visibility.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: SmallVec::new(),
            transform: Transform::new(),
            visible: true,
            is_bone: false,
            mesh: None,
            skin: None,
            camera: None,
            light: None,
        }
    }

    #[must_use]
    pub fn new_mesh(geometry: GeometryHandle, material: MaterialHandle) -> Self {
        let mut node = Self::new("");
        node.mesh = Some(MeshBinding { geometry, material });
        node
    }

    #[must_use]
    pub fn new_bone() -> Self {
        let mut node = Self::new("");
        node.is_bone = true;
        node
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }

    /// Short type label used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match (self.mesh.is_some(), self.skin.is_some(), self.is_bone) {
            (true, true, _) => "SkinnedMesh",
            (true, false, _) => "Mesh",
            (false, _, true) => "Bone",
            _ if self.camera.is_some() => "Camera",
            _ if self.light.is_some() => "Light",
            _ => "Group",
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("")
    }
}
