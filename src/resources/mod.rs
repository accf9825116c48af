//! CPU-side resource definitions: geometry, materials and primitive builders.

pub mod geometry;
pub mod material;
pub mod primitives;

pub use geometry::{BoundingBox, Geometry, PrimitiveShape};
pub use material::{Material, color_from_hex, parse_color};
