//! Resource handle tables.
//!
//! [`AssetServer`] owns every geometry and material created by generated scene
//! sources. Handles are `slotmap` keys; disposal removes the entry and bumps a
//! counter so resource growth across rebuilds can be observed.

pub mod server;
pub mod storage;

pub use server::{AssetServer, GeometryHandle, MaterialHandle, ResourceCounters};
pub use storage::{AssetStorage, StorageCounters};
