pub mod box_shape;
pub mod cylinder;
pub mod plane;
pub mod sphere;
pub mod torus;

pub use box_shape::create_box;
pub use cylinder::{CylinderOptions, create_cone, create_cylinder};
pub use plane::{PlaneOptions, create_plane};
pub use sphere::{SphereOptions, create_sphere};
pub use torus::{TorusOptions, create_torus};
