//! Transform System
//!
//! Hierarchical world-matrix update, kept apart from [`Scene`](super::Scene)
//! so it only borrows the node and camera maps.

use glam::Affine3A;
use slotmap::SlotMap;

use crate::scene::camera::Camera;
use crate::scene::node::Node;
use crate::scene::{CameraKey, NodeHandle};

/// Updates world matrices for every tree under `roots`.
///
/// Uses an explicit stack so deep hierarchies cannot overflow. A node's world
/// matrix is recomputed when its local TRS changed or any ancestor's did.
pub fn update_hierarchy_iterative(
    nodes: &mut SlotMap<NodeHandle, Node>,
    cameras: &mut SlotMap<CameraKey, Camera>,
    roots: &[NodeHandle],
) {
    // (node, parent world matrix, parent changed)
    let mut stack: Vec<(NodeHandle, Affine3A, bool)> = Vec::with_capacity(64);

    for &root_handle in roots.iter().rev() {
        stack.push((root_handle, Affine3A::IDENTITY, false));
    }

    while let Some((node_handle, parent_world_matrix, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(node_handle) else {
            continue;
        };

        let local_changed = node.transform.update_local_matrix();
        let world_needs_update = local_changed || parent_changed;

        if world_needs_update {
            let new_world = parent_world_matrix * *node.transform.local_matrix();
            node.transform.set_world_matrix(new_world);

            if let Some(camera_key) = node.camera
                && let Some(camera) = cameras.get_mut(camera_key)
            {
                camera.update_view_projection(&new_world);
            }
        }

        let current_world = node.transform.world_matrix;
        for &child_handle in node.children.iter().rev() {
            stack.push((child_handle, current_world, world_needs_update));
        }
    }
}

/// Forces a world-matrix update of the subtree rooted at `root_handle`.
pub fn update_subtree(
    nodes: &mut SlotMap<NodeHandle, Node>,
    cameras: &mut SlotMap<CameraKey, Camera>,
    root_handle: NodeHandle,
) {
    let Some(node) = nodes.get(root_handle) else {
        return;
    };
    let parent_world = node
        .parent
        .and_then(|p| nodes.get(p))
        .map_or(Affine3A::IDENTITY, |p| p.transform.world_matrix);

    if let Some(node) = nodes.get_mut(root_handle) {
        node.transform.mark_dirty();
    }

    let mut stack = vec![(root_handle, parent_world, true)];
    while let Some((handle, parent_world, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(handle) else {
            continue;
        };
        let local_changed = node.transform.update_local_matrix();
        let world_needs_update = local_changed || parent_changed;
        if world_needs_update {
            let new_world = parent_world * *node.transform.local_matrix();
            node.transform.set_world_matrix(new_world);
            if let Some(camera_key) = node.camera
                && let Some(camera) = cameras.get_mut(camera_key)
            {
                camera.update_view_projection(&new_world);
            }
        }
        let world = node.transform.world_matrix;
        for &child in node.children.iter().rev() {
            stack.push((child, world, world_needs_update));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_hierarchy_update() {
        let mut nodes: SlotMap<NodeHandle, Node> = SlotMap::with_key();
        let mut cameras: SlotMap<CameraKey, Camera> = SlotMap::with_key();

        let mut parent = Node::new("parent");
        parent.transform.position = Vec3::new(1.0, 0.0, 0.0);
        let parent_handle = nodes.insert(parent);

        let mut child = Node::new("child");
        child.transform.position = Vec3::new(0.0, 1.0, 0.0);
        child.parent = Some(parent_handle);
        let child_handle = nodes.insert(child);

        nodes.get_mut(parent_handle).unwrap().children.push(child_handle);

        update_hierarchy_iterative(&mut nodes, &mut cameras, &[parent_handle]);

        let child_world_pos = nodes.get(child_handle).unwrap().transform.world_matrix.translation;
        assert!((child_world_pos.x - 1.0).abs() < 1e-5);
        assert!((child_world_pos.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_parent_change_propagates() {
        let mut nodes: SlotMap<NodeHandle, Node> = SlotMap::with_key();
        let mut cameras: SlotMap<CameraKey, Camera> = SlotMap::with_key();

        let parent_handle = nodes.insert(Node::new("parent"));
        let mut child = Node::new("child");
        child.parent = Some(parent_handle);
        let child_handle = nodes.insert(child);
        nodes.get_mut(parent_handle).unwrap().children.push(child_handle);

        update_hierarchy_iterative(&mut nodes, &mut cameras, &[parent_handle]);

        nodes.get_mut(parent_handle).unwrap().transform.position = Vec3::new(0.0, 0.0, 2.0);
        update_hierarchy_iterative(&mut nodes, &mut cameras, &[parent_handle]);

        let z = nodes.get(child_handle).unwrap().transform.world_matrix.translation.z;
        assert!((z - 2.0).abs() < 1e-5);
    }
}
