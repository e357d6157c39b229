//! Transform component for 3D objects.
//!
//! Provides a [`Transform`] struct with a fluent API for managing position,
//! rotation (Euler angles), and scale.

use serde::{Deserialize, Serialize};

use crate::math::{mat4::Mat4, vec3::Vec3};

/// A 3D transform with position, rotation (Euler angles), and scale.
///
/// Mutating methods return `&mut Self` for chaining:
///
/// ```ignore
/// transform
///     .set_position_xyz(5.0, 2.0, 0.0)
///     .rotate_y(0.1)
///     .set_scale_uniform(2.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    position: Vec3,
    rotation: Vec3, // Euler angles in radians, applied X then Y then Z
    scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) -> &mut Self {
        self.position = position;
        self
    }

    pub fn set_position_xyz(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn translate(&mut self, delta: Vec3) -> &mut Self {
        self.position += delta;
        self
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vec3) -> &mut Self {
        self.rotation = rotation;
        self
    }

    pub fn rotate(&mut self, delta: Vec3) -> &mut Self {
        self.rotation += delta;
        self
    }

    pub fn rotate_x(&mut self, angle: f32) -> &mut Self {
        self.rotation.x += angle;
        self
    }

    pub fn rotate_y(&mut self, angle: f32) -> &mut Self {
        self.rotation.y += angle;
        self
    }

    pub fn rotate_z(&mut self, angle: f32) -> &mut Self {
        self.rotation.z += angle;
        self
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) -> &mut Self {
        self.scale = scale;
        self
    }

    pub fn set_scale_uniform(&mut self, s: f32) -> &mut Self {
        self.scale = Vec3::splat(s);
        self
    }

    /// Model matrix.
    ///
    /// Order: Scale * RotationX * RotationY * RotationZ * Translation
    /// (row vectors, so scale is applied first and translation last).
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::model(self.scale, self.rotation, self.position)
    }

    /// Matrix for transforming normals into world space.
    ///
    /// Inverse transpose of the model matrix restricted to its linear part, so
    /// non-uniform scale keeps normals perpendicular to their surfaces.
    pub fn normal_matrix(&self) -> Mat4 {
        normal_matrix(&self.to_matrix())
    }
}

/// Inverse transpose of `m`'s linear part. Falls back to the linear part
/// itself when it is singular (a zero scale axis).
pub fn normal_matrix(m: &Mat4) -> Mat4 {
    let linear = m.linear();
    linear
        .inverse()
        .map(|inv| inv.transpose())
        .unwrap_or(linear)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_default() {
        let t = Transform::default();
        assert_eq!(t.position(), Vec3::ZERO);
        assert_eq!(t.rotation(), Vec3::ZERO);
        assert_eq!(t.scale(), Vec3::ONE);
        assert_eq!(t.to_matrix(), Mat4::identity());
    }

    #[test]
    fn test_fluent_api() {
        let mut t = Transform::new();
        t.set_position_xyz(1.0, 2.0, 3.0)
            .rotate_y(0.5)
            .set_scale_uniform(2.0);

        assert_eq!(t.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(t.rotation().y, 0.5);
        assert_eq!(t.scale(), Vec3::splat(2.0));
    }

    #[test]
    fn rotation_happens_about_origin_before_translation() {
        let mut t = Transform::new();
        t.set_position_xyz(0.0, 0.0, 10.0).rotate_y(FRAC_PI_2);
        let p = t.to_matrix().transform_point(Vec3::RIGHT);
        assert_abs_diff_eq!(p, Vec3::new(0.0, 0.0, 9.0), epsilon = 1e-5);
    }

    #[test]
    fn normal_matrix_keeps_normals_perpendicular_under_non_uniform_scale() {
        let mut t = Transform::new();
        t.set_scale(Vec3::new(4.0, 1.0, 1.0));
        // Surface spanned by (1,1,0) and (0,0,1) with normal (1,-1,0).
        let tangent = t.to_matrix().transform_direction(Vec3::new(1.0, 1.0, 0.0));
        let normal = t
            .normal_matrix()
            .transform_direction(Vec3::new(1.0, -1.0, 0.0));
        assert_abs_diff_eq!(tangent.dot(normal), 0.0, epsilon = 1e-5);
    }
}
