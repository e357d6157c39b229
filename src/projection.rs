//! Perspective projection and viewport parameters.
//!
//! [`Projection`] is the single source of truth for the lens (FOV, aspect
//! ratio, near/far planes). [`Viewport`] maps NDC to pixels. Both also build
//! the clipping planes of the space they produce.

use crate::clipper::Plane;
use crate::math::{Mat4, Vec3};

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in radians.
    fov_y: f32,
    /// Aspect ratio (width / height).
    aspect_ratio: f32,
    z_near: f32,
    z_far: f32,
}

impl Projection {
    /// Creates a new projection with the given parameters.
    ///
    /// # Arguments
    /// * `fov_y` - Vertical field of view in radians
    /// * `aspect_ratio` - Width divided by height
    /// * `z_near` - Near clipping plane distance (must be > 0)
    /// * `z_far` - Far clipping plane distance (must be > z_near)
    pub fn new(fov_y: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            fov_y,
            aspect_ratio,
            z_near,
            z_far,
        }
    }

    pub fn from_degrees(fov_y_degrees: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        Self::new(fov_y_degrees.to_radians(), aspect_ratio, z_near, z_far)
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// Horizontal field of view in radians, derived from FOV and aspect.
    pub fn fov_x(&self) -> f32 {
        2.0 * (self.aspect_ratio * (self.fov_y / 2.0).tan()).atan()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Left-handed perspective matrix, depth in `[0, 1]`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov_y, self.aspect_ratio, self.z_near, self.z_far)
    }

    /// View-space near plane at `z = z_near`, keeping everything in front.
    pub fn near_plane(&self) -> Plane {
        Plane::new(Vec3::new(0.0, 0.0, self.z_near), Vec3::FORWARD)
    }
}

/// Destination rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x_min: f32,
    pub y_min: f32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x_min: 0.0,
            y_min: 0.0,
            width,
            height,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::viewport(
            self.x_min,
            self.y_min,
            self.width as f32,
            self.height as f32,
        )
    }

    /// Screen-space planes bounding the addressable pixel centres:
    /// top, bottom, left, right.
    pub fn edge_planes(&self) -> [Plane; 4] {
        let right = self.x_min + self.width.saturating_sub(1) as f32;
        let bottom = self.y_min + self.height.saturating_sub(1) as f32;
        [
            Plane::new(Vec3::new(0.0, self.y_min, 0.0), Vec3::UP),
            Plane::new(Vec3::new(0.0, bottom, 0.0), -Vec3::UP),
            Plane::new(Vec3::new(self.x_min, 0.0, 0.0), Vec3::RIGHT),
            Plane::new(Vec3::new(right, 0.0, 0.0), -Vec3::RIGHT),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn fov_x_matches_aspect_ratio() {
        let proj = Projection::new(FRAC_PI_4, 1.0, 0.1, 100.0);
        assert_relative_eq!(proj.fov_x(), proj.fov_y(), epsilon = 1e-6);
    }

    #[test]
    fn fov_x_wider_with_higher_aspect() {
        let proj = Projection::new(FRAC_PI_4, 16.0 / 9.0, 0.1, 100.0);
        assert!(proj.fov_x() > proj.fov_y());
    }

    #[test]
    fn near_plane_keeps_points_in_front() {
        let plane = Projection::new(FRAC_PI_4, 1.0, 0.5, 100.0).near_plane();
        assert!(plane.signed_distance(Vec3::new(0.0, 0.0, 1.0)) > 0.0);
        assert!(plane.signed_distance(Vec3::new(0.0, 0.0, 0.1)) < 0.0);
    }

    #[test]
    fn edge_planes_bound_the_pixel_grid() {
        let viewport = Viewport::new(20, 10);
        let inside = Vec3::new(19.0, 9.0, 0.0);
        let outside = Vec3::new(20.0, 4.0, 0.0);
        assert!(viewport
            .edge_planes()
            .iter()
            .all(|p| p.signed_distance(inside) >= 0.0));
        assert!(viewport
            .edge_planes()
            .iter()
            .any(|p| p.signed_distance(outside) < 0.0));
    }
}
