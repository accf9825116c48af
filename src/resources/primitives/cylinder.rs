use std::f32::consts::PI;

use crate::resources::geometry::{Geometry, PrimitiveShape};

pub struct CylinderOptions {
    pub radius_top: f32,
    pub radius_bottom: f32,
    pub height: f32,
    pub radial_segments: u32,
    pub open_ended: bool,
}

impl Default for CylinderOptions {
    fn default() -> Self {
        Self {
            radius_top: 1.0,
            radius_bottom: 1.0,
            height: 1.0,
            radial_segments: 32,
            open_ended: false,
        }
    }
}

/// Y-aligned cylinder (or frustum) centred on the origin.
#[must_use]
pub fn create_cylinder(options: CylinderOptions) -> Geometry {
    build(options, PrimitiveShape::Cylinder)
}

/// A cone is a cylinder with a zero top radius.
#[must_use]
pub fn create_cone(radius: f32, height: f32, radial_segments: u32) -> Geometry {
    build(
        CylinderOptions {
            radius_top: 0.0,
            radius_bottom: radius,
            height,
            radial_segments,
            open_ended: false,
        },
        PrimitiveShape::Cone,
    )
}

fn build(options: CylinderOptions, shape: PrimitiveShape) -> Geometry {
    let segments = options.radial_segments.max(3);
    let half_height = options.height / 2.0;
    let slope = (options.radius_bottom - options.radius_top) / options.height.max(f32::EPSILON);

    let mut geo = Geometry::new(shape);

    // Side wall: two rings (top, bottom)
    for (row, (y, radius)) in [
        (half_height, options.radius_top),
        (-half_height, options.radius_bottom),
    ]
    .into_iter()
    .enumerate()
    {
        for x in 0..=segments {
            let u = x as f32 / segments as f32;
            let theta = u * 2.0 * PI;
            let (sin, cos) = theta.sin_cos();

            geo.positions.push([radius * sin, y, radius * cos]);
            let normal = glam::Vec3::new(sin, slope, cos).normalize_or_zero();
            geo.normals.push(normal.to_array());
            geo.uvs.push([u, row as f32]);
        }
    }

    let stride = segments + 1;
    for x in 0..segments {
        let a = x;
        let b = x + stride;
        let c = x + stride + 1;
        let d = x + 1;
        geo.indices.extend_from_slice(&[a, b, d, b, c, d]);
    }

    if !options.open_ended {
        for (top, y, radius) in [
            (true, half_height, options.radius_top),
            (false, -half_height, options.radius_bottom),
        ] {
            if radius <= 0.0 {
                continue;
            }
            let sign = if top { 1.0 } else { -1.0 };
            let center = geo.positions.len() as u32;
            geo.positions.push([0.0, y, 0.0]);
            geo.normals.push([0.0, sign, 0.0]);
            geo.uvs.push([0.5, 0.5]);

            for x in 0..=segments {
                let theta = x as f32 / segments as f32 * 2.0 * PI;
                let (sin, cos) = theta.sin_cos();
                geo.positions.push([radius * sin, y, radius * cos]);
                geo.normals.push([0.0, sign, 0.0]);
                geo.uvs.push([cos * 0.5 + 0.5, sin * 0.5 * sign + 0.5]);
            }

            for x in 0..segments {
                let i = center + 1 + x;
                if top {
                    geo.indices.extend_from_slice(&[i, i + 1, center]);
                } else {
                    geo.indices.extend_from_slice(&[i + 1, i, center]);
                }
            }
        }
    }

    geo.compute_bounding_volume();
    geo
}
