//! Utility Module
//!
//! - [`OrbitControls`]: damped orbit camera driven by host pointer input
//! - [`Timer`]: frame clock for the render loop

pub mod orbit_control;
pub mod time;

pub use orbit_control::{OrbitControls, OrbitInput};
pub use time::Timer;
