use glam::{Affine3A, Mat4};
use slotmap::SlotMap;

use crate::resources::BoundingBox;
use crate::scene::{Node, NodeHandle, SkeletonKey};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BindMode {
    /// Bones follow the skinned node (character skinning)
    Attached,
    /// Uses the matrix snapshot taken at bind time
    Detached,
}

#[derive(Debug, Clone)]
pub struct SkinBinding {
    pub skeleton: SkeletonKey,
    pub bind_mode: BindMode,
    /// Inverse of the skinned node's world matrix at bind time
    pub bind_matrix_inv: Affine3A,
}

#[derive(Debug, Clone)]
pub struct Skeleton {
    pub name: String,

    /// Ordered bone list; `bones[i]` drives joint `i`.
    pub bones: Vec<NodeHandle>,

    /// Transforms from mesh space into each bone's bind-pose local space.
    pub(crate) inverse_bind_matrices: Vec<Affine3A>,

    /// Final per-frame joint matrices
    pub(crate) joint_matrices: Vec<Mat4>,
}

impl Skeleton {
    /// Creates a skeleton whose inverse bind matrices are computed later by
    /// [`Skeleton::calculate_inverses`].
    #[must_use]
    pub fn new(name: &str, bones: Vec<NodeHandle>) -> Self {
        let count = bones.len();
        Self {
            name: name.to_string(),
            bones,
            inverse_bind_matrices: vec![Affine3A::IDENTITY; count],
            joint_matrices: vec![Mat4::IDENTITY; count],
        }
    }

    /// Snapshots the current bone world matrices as the bind pose.
    ///
    /// World matrices must be up to date before calling this.
    pub fn calculate_inverses(&mut self, nodes: &SlotMap<NodeHandle, Node>) {
        self.inverse_bind_matrices = self
            .bones
            .iter()
            .map(|&bone| {
                nodes
                    .get(bone)
                    .map_or(Affine3A::IDENTITY, |n| n.transform.world_matrix.inverse())
            })
            .collect();
    }

    #[inline]
    #[must_use]
    pub fn root_bone(&self) -> Option<NodeHandle> {
        self.bones.first().copied()
    }

    #[inline]
    #[must_use]
    pub fn joint_matrices(&self) -> &[Mat4] {
        &self.joint_matrices
    }

    /// Tight world-space box around the current bone positions.
    #[must_use]
    pub fn compute_tight_world_bounds(
        &self,
        nodes: &SlotMap<NodeHandle, Node>,
    ) -> Option<BoundingBox> {
        BoundingBox::from_points(
            self.bones
                .iter()
                .filter_map(|&bone| nodes.get(bone))
                .map(|n| n.transform.world_matrix.translation.into()),
        )
    }

    /// Updates joint matrices.
    ///
    /// `root_matrix_inv` is the inverse world matrix of the skinned node, used
    /// to bring bone transforms back into mesh space.
    pub fn compute_joint_matrices(
        &mut self,
        nodes: &SlotMap<NodeHandle, Node>,
        root_matrix_inv: Affine3A,
    ) {
        for (i, &bone_handle) in self.bones.iter().enumerate() {
            let Some(bone_node) = nodes.get(bone_handle) else {
                continue;
            };
            let ibm = self.inverse_bind_matrices[i];
            self.joint_matrices[i] = (root_matrix_inv * bone_node.transform.world_matrix * ibm).into();
        }
    }
}
