use std::sync::Arc;

use slotmap::new_key_type;

use crate::assets::storage::{AssetStorage, StorageCounters};
use crate::resources::{Geometry, Material};

// Strongly-typed handles
new_key_type! {
    pub struct GeometryHandle;
    pub struct MaterialHandle;
}

/// Geometry/material handle table standing in for GPU-side buffers.
///
/// Cheap to clone: every clone shares the same storages, which is how the
/// script capability surface allocates into the runtime's pool.
#[derive(Clone, Default)]
pub struct AssetServer {
    pub geometries: Arc<AssetStorage<GeometryHandle, Geometry>>,
    pub materials: Arc<AssetStorage<MaterialHandle, Material>>,
}

/// Snapshot of both storages' counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounters {
    pub geometries: StorageCounters,
    pub materials: StorageCounters,
}

impl AssetServer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geometry(&self, geometry: Geometry) -> GeometryHandle {
        self.geometries.add(geometry)
    }

    pub fn add_material(&self, material: Material) -> MaterialHandle {
        self.materials.add(material)
    }

    #[must_use]
    pub fn get_geometry(&self, handle: GeometryHandle) -> Option<Arc<Geometry>> {
        self.geometries.get(handle)
    }

    #[must_use]
    pub fn get_material(&self, handle: MaterialHandle) -> Option<Arc<Material>> {
        self.materials.get(handle)
    }

    pub fn dispose_geometry(&self, handle: GeometryHandle) -> bool {
        self.geometries.dispose(handle)
    }

    pub fn dispose_material(&self, handle: MaterialHandle) -> bool {
        self.materials.dispose(handle)
    }

    #[must_use]
    pub fn counters(&self) -> ResourceCounters {
        ResourceCounters {
            geometries: self.geometries.counters(),
            materials: self.materials.counters(),
        }
    }
}
