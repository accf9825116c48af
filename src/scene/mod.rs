//! Scene graph
//!
//! - [`Node`]: hierarchy entry with transform and optional components
//! - [`Transform`]: TRS with cached matrices and dirty checking
//! - [`Scene`]: node storage plus camera, light and skeleton maps
//! - [`Camera`], [`Light`], [`Skeleton`]
//! - `transform_system`: hierarchical world-matrix update

pub mod camera;
pub mod light;
pub mod node;
pub mod scene;
pub mod skeleton;
pub mod transform;
pub mod transform_system;

pub use camera::{Camera, Frustum};
pub use light::{Light, LightKind};
pub use node::{MeshBinding, Node};
pub use scene::{GraftedSubtree, Scene, SubtreeResources};
pub use skeleton::{BindMode, SkinBinding, Skeleton};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct CameraKey;
    pub struct LightKey;
    pub struct SkeletonKey;
}
