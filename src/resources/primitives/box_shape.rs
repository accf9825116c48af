use crate::resources::geometry::{Geometry, PrimitiveShape};

/// Face directions as (normal axis, sign); each face gets its own four
/// vertices so normals stay flat.
const FACES: [(usize, f32); 6] = [
    (2, 1.0),  // +Z
    (2, -1.0), // -Z
    (1, 1.0),  // +Y
    (1, -1.0), // -Y
    (0, 1.0),  // +X
    (0, -1.0), // -X
];

#[must_use]
pub fn create_box(width: f32, height: f32, depth: f32) -> Geometry {
    let half = [width / 2.0, height / 2.0, depth / 2.0];

    let mut geo = Geometry::new(PrimitiveShape::Box);

    for (face, &(axis, sign)) in FACES.iter().enumerate() {
        // The two in-plane axes, ordered so the winding stays CCW seen from outside.
        let (u_axis, v_axis) = match axis {
            0 => (2, 1),
            1 => (0, 2),
            _ => (0, 1),
        };
        let flip = if axis == 1 { -sign } else { sign };

        for (u, v) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let mut p = [0.0_f32; 3];
            p[axis] = sign * half[axis];
            p[u_axis] = u * flip * half[u_axis];
            p[v_axis] = v * half[v_axis];
            geo.positions.push(p);

            let mut n = [0.0_f32; 3];
            n[axis] = sign;
            geo.normals.push(n);

            geo.uvs.push([(u + 1.0) / 2.0, 1.0 - (v + 1.0) / 2.0]);
        }

        let base = (face * 4) as u32;
        geo.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    geo.compute_bounding_volume();
    geo
}
