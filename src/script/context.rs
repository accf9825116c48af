use std::cell::RefCell;
use std::rc::Rc;

use crate::assets::{AssetServer, GeometryHandle, MaterialHandle};
use crate::errors::BuildError;
use crate::scene::Scene;

/// Everything one script run may create.
///
/// Nodes and skeletons go into a private staging scene; geometries and
/// materials go straight into the shared [`AssetServer`] and are recorded so
/// the caller can release whatever ends up unused.
pub struct BuildContext {
    pub scene: Scene,
    pub assets: AssetServer,
    pub geometries: Vec<GeometryHandle>,
    pub materials: Vec<MaterialHandle>,
    /// Typed error raised by a capability call, preferred over the generic
    /// script error it unwinds into.
    pub failure: Option<BuildError>,
}

pub type SharedContext = Rc<RefCell<BuildContext>>;

impl BuildContext {
    #[must_use]
    pub fn new(assets: AssetServer) -> Self {
        Self {
            scene: Scene::new(),
            assets,
            geometries: Vec::new(),
            materials: Vec::new(),
            failure: None,
        }
    }

    #[must_use]
    pub fn shared(assets: AssetServer) -> SharedContext {
        Rc::new(RefCell::new(Self::new(assets)))
    }

    /// Releases every geometry and material this run created.
    pub fn release_all(&mut self) {
        for handle in self.geometries.drain(..) {
            self.assets.dispose_geometry(handle);
        }
        for handle in self.materials.drain(..) {
            self.assets.dispose_material(handle);
        }
    }
}

/// The capability object handed to scripts as `THREE`.
#[derive(Clone)]
pub struct Three {
    pub(crate) ctx: SharedContext,
}

impl Three {
    #[must_use]
    pub fn new(ctx: SharedContext) -> Self {
        Self { ctx }
    }
}
