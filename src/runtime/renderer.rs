//! Render backend seam.
//!
//! The runtime hands each frame to a [`RenderBackend`]. No GPU backend ships
//! with the crate; [`HeadlessRenderer`] walks the scene, frustum-culls meshes
//! and records what a real backend would have drawn.

use glam::{Vec3, Vec4};

use crate::assets::AssetServer;
use crate::scene::{Camera, NodeHandle, Scene};

/// Everything a backend needs to draw one frame.
pub struct RenderFrame<'a> {
    pub scene: &'a Scene,
    pub camera: &'a Camera,
    pub assets: &'a AssetServer,
    /// Linear RGBA clear color.
    pub background: Vec4,
}

/// Per-frame draw statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: usize,
    pub culled: usize,
    pub triangles: usize,
}

pub trait RenderBackend {
    /// Resizes the output surface. Never called with a zero dimension.
    fn resize(&mut self, width: u32, height: u32);

    fn render(&mut self, frame: &RenderFrame<'_>);

    fn size(&self) -> (u32, u32);
}

/// Backend with no output surface.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    width: u32,
    height: u32,
    frames: u64,
    last_frame: FrameStats,
}

impl HeadlessRenderer {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub fn last_frame(&self) -> FrameStats {
        self.last_frame
    }
}

/// Visible unless the node or any ancestor is hidden.
fn is_visible(scene: &Scene, handle: NodeHandle) -> bool {
    let mut current = Some(handle);
    while let Some(h) = current {
        let Some(node) = scene.get_node(h) else {
            return false;
        };
        if !node.visible {
            return false;
        }
        current = node.parent();
    }
    true
}

impl RenderBackend for HeadlessRenderer {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn render(&mut self, frame: &RenderFrame<'_>) {
        let mut stats = FrameStats::default();
        let frustum = frame.camera.frustum();

        for (handle, node) in &frame.scene.nodes {
            let Some(mesh) = node.mesh else {
                continue;
            };
            if !is_visible(frame.scene, handle) {
                continue;
            }
            let Some(geometry) = frame.assets.get_geometry(mesh.geometry) else {
                log::warn!("Mesh `{}` references a released geometry", node.name);
                continue;
            };
            // Skinned meshes deform past their rest bounds; never cull them
            let in_view = node.skin.is_some()
                || geometry.bounding_box.is_none_or(|local| {
                    let world = local.transform(node.world_matrix());
                    let center: Vec3 = world.center();
                    frustum.intersects_sphere(center, world.size().length() * 0.5)
                });
            if in_view {
                stats.draw_calls += 1;
                stats.triangles += geometry.triangle_count();
            } else {
                stats.culled += 1;
            }
        }

        self.frames += 1;
        self.last_frame = stats;
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
