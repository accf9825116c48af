use std::f32::consts::PI;

use glam::Vec3;

use crate::resources::geometry::{Geometry, PrimitiveShape};

pub struct TorusOptions {
    pub radius: f32,
    pub tube: f32,
    pub radial_segments: u32,
    pub tubular_segments: u32,
}

impl Default for TorusOptions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            tube: 0.4,
            radial_segments: 12,
            tubular_segments: 48,
        }
    }
}

/// Torus lying in the XY plane.
#[must_use]
pub fn create_torus(options: TorusOptions) -> Geometry {
    let radial = options.radial_segments.max(3);
    let tubular = options.tubular_segments.max(3);

    let mut geo = Geometry::new(PrimitiveShape::Torus);

    for j in 0..=radial {
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * 2.0 * PI;
            let v = j as f32 / radial as f32 * 2.0 * PI;

            let ring = options.radius + options.tube * v.cos();
            let position = Vec3::new(ring * u.cos(), ring * u.sin(), options.tube * v.sin());
            let center = Vec3::new(options.radius * u.cos(), options.radius * u.sin(), 0.0);

            geo.positions.push(position.to_array());
            geo.normals.push((position - center).normalize_or_zero().to_array());
            geo.uvs.push([i as f32 / tubular as f32, j as f32 / radial as f32]);
        }
    }

    let stride = tubular + 1;
    for j in 1..=radial {
        for i in 1..=tubular {
            let a = stride * j + i - 1;
            let b = stride * (j - 1) + i - 1;
            let c = stride * (j - 1) + i;
            let d = stride * j + i;
            geo.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    geo.compute_bounding_volume();
    geo
}
