use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::scene::transform::Transform;

/// Pointer input accumulated by the host since the last frame.
///
/// The runtime has no window system of its own; hosts translate their events
/// into this struct and hand it to [`OrbitControls::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrbitInput {
    /// Drag delta in pixels with the rotate button held.
    pub rotate: Vec2,
    /// Drag delta in pixels with the pan button held.
    pub pan: Vec2,
    /// Scroll steps; positive zooms in.
    pub zoom: f32,
    /// Viewport height in pixels.
    pub viewport_height: f32,
}

impl OrbitInput {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.rotate == Vec2::ZERO && self.pan == Vec2::ZERO && self.zoom == 0.0
    }
}

/// Damped orbit around a target point, expressed in spherical coordinates.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub damping_factor: f32,
    pub enable_damping: bool,
    pub min_distance: f32,
    pub max_distance: f32,

    pub target: Vec3,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,

    rotate_delta: Vec2,
}

const PHI_EPS: f32 = 0.0001;

impl OrbitControls {
    /// Orbit that reproduces a camera at `position` looking at `target`.
    #[must_use]
    pub fn new(position: Vec3, target: Vec3, damping_factor: f32) -> Self {
        let mut controls = Self {
            rotate_speed: 1.0,
            zoom_speed: 0.05,
            pan_speed: 1.0,
            damping_factor,
            enable_damping: damping_factor > 0.0,
            min_distance: 0.01,
            max_distance: 1000.0,

            target,
            radius: 1.0,
            theta: 0.0,
            phi: PI / 2.0,

            rotate_delta: Vec2::ZERO,
        };
        controls.look_from(position, target);
        controls
    }

    /// Re-derives the orbit from an explicit camera position and target,
    /// dropping any pending rotation inertia.
    pub fn look_from(&mut self, position: Vec3, target: Vec3) {
        let offset = position - target;
        self.target = target;
        self.radius = offset.length().max(self.min_distance);
        self.theta = offset.x.atan2(offset.z);
        self.phi = (offset.y / self.radius).clamp(-1.0, 1.0).acos().clamp(PHI_EPS, PI - PHI_EPS);
        self.rotate_delta = Vec2::ZERO;
        if self.radius > self.max_distance {
            self.max_distance = self.radius * 2.0;
        }
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.target + self.offset_direction() * self.radius
    }

    fn offset_direction(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta)
    }

    /// Applies `input` and inertia, then writes the camera pose.
    pub fn update(&mut self, transform: &mut Transform, input: &OrbitInput, fov_degrees: f32, dt: f32) {
        let screen_height = input.viewport_height.max(1.0);

        if input.rotate != Vec2::ZERO {
            let rotate_per_pixel = 2.0 * PI / screen_height;
            self.rotate_delta -= input.rotate * rotate_per_pixel * self.rotate_speed;
        }

        if self.enable_damping {
            // Frame-rate independent retention, tuned at 60 fps
            let retention = (1.0 - self.damping_factor).powf(dt * 60.0);
            let applied = self.rotate_delta * (1.0 - retention);
            self.theta += applied.x;
            self.phi += applied.y;
            self.rotate_delta *= retention;
        } else {
            self.theta += self.rotate_delta.x;
            self.phi += self.rotate_delta.y;
            self.rotate_delta = Vec2::ZERO;
        }
        self.phi = self.phi.clamp(PHI_EPS, PI - PHI_EPS);

        if input.zoom != 0.0 {
            let scale = (1.0 - self.zoom_speed).powf(input.zoom.abs());
            if input.zoom > 0.0 {
                self.radius *= scale;
            } else {
                self.radius /= scale;
            }
            self.radius = self.radius.clamp(self.min_distance, self.max_distance);
        }

        if input.pan != Vec2::ZERO {
            let half_fov = fov_degrees.to_radians() / 2.0;
            let world_per_pixel = 2.0 * self.radius * half_fov.tan() / screen_height;
            let forward = -self.offset_direction();
            let right = forward.cross(Vec3::Y).normalize_or_zero();
            let up = right.cross(forward).normalize_or_zero();
            self.target += (right * -input.pan.x + up * input.pan.y) * world_per_pixel * self.pan_speed;
        }

        transform.position = self.position();
        transform.look_at(self.target, Vec3::Y);
    }
}
