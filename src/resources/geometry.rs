use glam::{Affine3A, Vec3};
use uuid::Uuid;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// An inverted box that any `expand_by_point` call will overwrite.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut bbox = Self::EMPTY;
        for p in points {
            bbox.expand_by_point(p);
        }
        (!bbox.is_empty()).then_some(bbox)
    }

    pub fn expand_by_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Largest extent along any axis.
    #[must_use]
    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Transforms the eight corners and re-fits an axis-aligned box around them.
    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut out = Self::EMPTY;
        for point in corners {
            out.expand_by_point(matrix.transform_point3(point));
        }
        out
    }
}

/// Which primitive constructor produced a geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimitiveShape {
    Box,
    Sphere,
    Cylinder,
    Cone,
    Plane,
    Torus,
}

impl PrimitiveShape {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Sphere => "sphere",
            Self::Cylinder => "cylinder",
            Self::Cone => "cone",
            Self::Plane => "plane",
            Self::Torus => "torus",
        }
    }
}

/// CPU-side triangle geometry.
///
/// Vertex data is kept in planar arrays; the bounding box is computed once at
/// construction by [`Geometry::compute_bounding_volume`].
#[derive(Debug, Clone)]
pub struct Geometry {
    pub uuid: Uuid,
    pub shape: PrimitiveShape,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub bounding_box: Option<BoundingBox>,
}

impl Geometry {
    #[must_use]
    pub fn new(shape: PrimitiveShape) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            shape,
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
            bounding_box: None,
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn compute_bounding_volume(&mut self) {
        self.bounding_box = BoundingBox::from_points(self.positions.iter().map(|p| Vec3::from_array(*p)));
    }
}
