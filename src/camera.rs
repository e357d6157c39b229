//! Scene camera.
//!
//! # Coordinate System
//!
//! Uses a **left-handed** coordinate system:
//! - X: positive right
//! - Y: positive up
//! - Z: positive forward (into screen)
//!
//! # Orientation
//!
//! A camera is oriented either by yaw/pitch/roll angles or by a target point
//! and up vector. Both produce the same kind of rigid view matrix.
//!
//! - **Yaw**: Rotation around Y-axis (positive = look right)
//! - **Pitch**: Rotation around X-axis (positive = look down)
//! - **Roll**: Rotation around the forward axis

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::math::{Mat4, Vec3};
use crate::projection::Projection;

const PITCH_LIMIT: f32 = 89.0 * PI / 180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    Euler { yaw: f32, pitch: f32, roll: f32 },
    LookAt { target: Vec3, up: Vec3 },
}

/// Camera with position, orientation and lens.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    orientation: Orientation,
    fov_y: f32,
    z_near: f32,
    z_far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl Camera {
    /// Camera at `position` looking along +Z with a 90 degree vertical FOV.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            orientation: Orientation::Euler {
                yaw: 0.0,
                pitch: 0.0,
                roll: 0.0,
            },
            fov_y: FRAC_PI_2,
            z_near: 0.1,
            z_far: 200.0,
        }
    }

    /// Camera tracking `target` with the given up vector.
    pub fn targeting(position: Vec3, target: Vec3, up: Vec3) -> Self {
        Self {
            orientation: Orientation::LookAt { target, up },
            ..Self::new(position)
        }
    }

    /// Euler camera turned toward `target`.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let mut camera = Self::new(position);
        camera.look_at(target);
        camera
    }

    pub fn with_lens(mut self, fov_y: f32, z_near: f32, z_far: f32) -> Self {
        self.fov_y = fov_y;
        self.z_near = z_near;
        self.z_far = z_far;
        self
    }

    /// Rotation part of the camera's world transform: roll, then pitch, then yaw.
    fn rotation_matrix(&self) -> Mat4 {
        match self.orientation {
            Orientation::Euler { yaw, pitch, roll } => {
                Mat4::rotation_z(roll) * Mat4::rotation_x(pitch) * Mat4::rotation_y(yaw)
            }
            Orientation::LookAt { target, up } => {
                let forward = (target - self.position).normalize();
                let right = up.cross(forward).normalize();
                let up = forward.cross(right);
                Mat4::new([
                    [right.x, right.y, right.z, 0.0],
                    [up.x, up.y, up.z, 0.0],
                    [forward.x, forward.y, forward.z, 0.0],
                    [0.0, 0.0, 0.0, 1.0],
                ])
            }
        }
    }

    fn euler_angles(&self) -> (f32, f32, f32) {
        match self.orientation {
            Orientation::Euler { yaw, pitch, roll } => (yaw, pitch, roll),
            Orientation::LookAt { target, .. } => {
                let (yaw, pitch) = angles_toward(target - self.position);
                (yaw, pitch, 0.0)
            }
        }
    }

    /// Rotates by yaw and pitch deltas. A look-at camera switches to Euler
    /// angles first. Pitch is clamped short of straight up or down.
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        let (yaw, pitch, roll) = self.euler_angles();
        self.orientation = Orientation::Euler {
            yaw: (yaw + yaw_delta).rem_euclid(TAU),
            pitch: (pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT),
            roll,
        };
    }

    /// Rolls about the forward vector. Result is kept in `(-PI, PI]`.
    pub fn rotate_roll(&mut self, delta: f32) {
        let (yaw, pitch, roll) = self.euler_angles();
        let mut roll = (roll + delta).rem_euclid(TAU);
        if roll > PI {
            roll -= TAU;
        }
        self.orientation = Orientation::Euler { yaw, pitch, roll };
    }

    /// Points the camera at a world position, keeping the current roll.
    pub fn look_at(&mut self, target: Vec3) {
        let (_, _, roll) = self.euler_angles();
        let direction = target - self.position;
        if direction.magnitude() <= f32::EPSILON {
            return;
        }
        let (yaw, pitch) = angles_toward(direction);
        self.orientation = Orientation::Euler { yaw, pitch, roll };
    }

    pub fn move_forward(&mut self, distance: f32) {
        self.translate(self.forward() * distance);
    }

    pub fn move_right(&mut self, distance: f32) {
        self.translate(self.right() * distance);
    }

    /// Moves the camera; a look-at target stays fixed.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    /// +Z carried into world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation_matrix().transform_direction(Vec3::FORWARD)
    }

    pub fn right(&self) -> Vec3 {
        self.rotation_matrix().transform_direction(Vec3::RIGHT)
    }

    pub fn up(&self) -> Vec3 {
        self.rotation_matrix().transform_direction(Vec3::UP)
    }

    /// View matrix: inverse of the camera's world transform `R * T(position)`.
    ///
    /// Euler cameras go through the rigid fast inverse; look-at cameras
    /// build the basis directly.
    pub fn view_matrix(&self) -> Mat4 {
        match self.orientation {
            Orientation::Euler { .. } => {
                let p = self.position;
                (self.rotation_matrix() * Mat4::translation(p.x, p.y, p.z)).fast_inverse()
            }
            Orientation::LookAt { target, up } => Mat4::look_at_lh(self.position, target, up),
        }
    }

    pub fn projection(&self, aspect_ratio: f32) -> Projection {
        Projection::new(self.fov_y, aspect_ratio, self.z_near, self.z_far)
    }
}

/// Yaw and pitch that turn +Z toward `direction`, pitch clamped.
fn angles_toward(direction: Vec3) -> (f32, f32) {
    let horizontal = (direction.x * direction.x + direction.z * direction.z).sqrt();
    let yaw = if horizontal > f32::EPSILON {
        direction.x.atan2(direction.z)
    } else {
        0.0
    };
    let pitch = (-direction.y).atan2(horizontal).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    (yaw, pitch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn camera_starts_looking_forward() {
        let camera = Camera::new(Vec3::ZERO);
        assert_abs_diff_eq!(camera.forward(), Vec3::FORWARD, epsilon = 1e-6);
    }

    #[test]
    fn yaw_rotates_horizontally() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.rotate(FRAC_PI_2, 0.0);
        assert_abs_diff_eq!(camera.forward(), Vec3::RIGHT, epsilon = 1e-5);
    }

    #[test]
    fn positive_pitch_looks_down() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.rotate(0.0, 0.3);
        assert!(camera.forward().y < 0.0);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.rotate(0.0, PI);
        let Orientation::Euler { pitch, .. } = camera.orientation() else {
            panic!("rotate produces Euler angles");
        };
        assert_relative_eq!(pitch, PITCH_LIMIT);
    }

    #[test]
    fn roll_turns_up_vector() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.rotate_roll(FRAC_PI_2);
        assert_abs_diff_eq!(camera.up(), Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_abs_diff_eq!(camera.forward(), Vec3::FORWARD, epsilon = 1e-5);
    }

    #[test]
    fn move_forward_changes_position() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.move_forward(5.0);
        assert_relative_eq!(camera.position().z, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn move_right_strafes_without_turning() {
        let mut camera = Camera::looking_at(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0));
        camera.move_right(2.0);
        assert_abs_diff_eq!(camera.position(), Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-5);
        assert_abs_diff_eq!(camera.forward(), Vec3::FORWARD, epsilon = 1e-5);
    }

    #[test]
    fn lens_feeds_the_projection() {
        let camera = Camera::new(Vec3::ZERO).with_lens(FRAC_PI_2, 0.5, 40.0);
        let projection = camera.projection(2.0);
        assert_relative_eq!(projection.fov_y(), FRAC_PI_2);
        assert_relative_eq!(projection.z_near(), 0.5);
        assert_relative_eq!(projection.z_far(), 40.0);
        assert_relative_eq!(projection.aspect_ratio(), 2.0);
    }

    #[test]
    fn euler_view_places_target_in_front() {
        let camera = Camera::looking_at(Vec3::new(3.0, 4.0, -5.0), Vec3::ZERO);
        let p = camera.view_matrix().transform_point(Vec3::ZERO);
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(p.z, 50f32.sqrt(), epsilon = 1e-4);
    }

    #[test]
    fn both_orientations_agree() {
        let eye = Vec3::new(-2.0, 1.0, -6.0);
        let target = Vec3::new(0.5, 0.0, 1.0);
        let euler = Camera::looking_at(eye, target).view_matrix();
        let look_at = Camera::targeting(eye, target, Vec3::UP).view_matrix();
        assert_abs_diff_eq!(euler, look_at, epsilon = 1e-4);
    }
}
