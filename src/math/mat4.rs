//! 4x4 transformation matrix using the row-vector convention.
//!
//! # Convention
//! - Vectors are **row vectors** on the left: `Vec * Mat4`
//! - Translation is stored in the **last row**
//! - Transforms chain **left-to-right**: `v * A * B` applies A first, then B
//!
//! # Example
//! ```ignore
//! let model = scale * rotation * translation; // scale applied first
//! let world = vertex * model;
//! ```

use std::ops::Mul;

use approx::{AbsDiffEq, RelativeEq};

use super::vec3::Vec3;
use super::vec4::Vec4;

/// Pivot magnitude below which [`Mat4::inverse`] reports a singular matrix.
const SINGULAR_EPSILON: f32 = 1e-8;

/// 4x4 matrix stored as `data[row][col]` with row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    data: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub const fn new(data: [[f32; 4]; 4]) -> Self {
        Mat4 { data }
    }

    pub const fn identity() -> Self {
        Mat4::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a translation matrix. Translation lives in the last row.
    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        Mat4::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [x, y, z, 1.0],
        ])
    }

    pub fn scaling(x: f32, y: f32, z: f32) -> Self {
        Mat4::new([
            [x, 0.0, 0.0, 0.0],
            [0.0, y, 0.0, 0.0],
            [0.0, 0.0, z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a rotation matrix around the X axis.
    pub fn rotation_x(angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Mat4::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, s, 0.0],
            [0.0, -s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a rotation matrix around the Y axis.
    pub fn rotation_y(angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Mat4::new([
            [c, 0.0, -s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a rotation matrix around the Z axis.
    pub fn rotation_z(angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Mat4::new([
            [c, s, 0.0, 0.0],
            [-s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Euler rotation composed as `Rx * Ry * Rz` (X applied first).
    pub fn rotation_euler(x: f32, y: f32, z: f32) -> Self {
        Self::rotation_x(x) * Self::rotation_y(y) * Self::rotation_z(z)
    }

    /// Rotation of `angle` radians about `axis` (Rodrigues' formula).
    ///
    /// The axis is normalized; a zero axis yields the identity.
    pub fn rotation_axis(axis: Vec3, angle: f32) -> Self {
        let a = axis.normalize();
        if a == Vec3::ZERO {
            return Self::identity();
        }
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (a.x, a.y, a.z);
        Mat4::new([
            [c + x * x * t, x * y * t + z * s, x * z * t - y * s, 0.0],
            [x * y * t - z * s, c + y * y * t, y * z * t + x * s, 0.0],
            [x * z * t + y * s, y * z * t - x * s, c + z * z * t, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Model matrix `S * R * T`: scale, then Euler rotation, then translation.
    pub fn model(scale: Vec3, rotation: Vec3, translation: Vec3) -> Self {
        Self::scaling(scale.x, scale.y, scale.z)
            * Self::rotation_euler(rotation.x, rotation.y, rotation.z)
            * Self::translation(translation.x, translation.y, translation.z)
    }

    /// Left-handed perspective projection.
    ///
    /// View-space Z in `[near, far]` maps to clip Z in `[0, 1]` after the
    /// divide, and clip W equals view-space Z.
    pub fn perspective_lh(fov: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        let tan_half = (fov / 2.0).tan();
        let depth = far - near;
        Mat4::new([
            [1.0 / (aspect_ratio * tan_half), 0.0, 0.0, 0.0],
            [0.0, 1.0 / tan_half, 0.0, 0.0],
            [0.0, 0.0, far / depth, 1.0],
            [0.0, 0.0, -far * near / depth, 0.0],
        ])
    }

    /// Left-handed orthographic projection of the box
    /// `[-half_width, half_width] x [-half_height, half_height] x [near, far]`
    /// onto X,Y in `[-1, 1]` and Z in `[0, 1]`.
    pub fn orthographic_lh(half_width: f32, half_height: f32, near: f32, far: f32) -> Self {
        let depth = far - near;
        Mat4::new([
            [1.0 / half_width, 0.0, 0.0, 0.0],
            [0.0, 1.0 / half_height, 0.0, 0.0],
            [0.0, 0.0, 1.0 / depth, 0.0],
            [0.0, 0.0, -near / depth, 1.0],
        ])
    }

    /// Maps NDC X,Y in `[-1, 1]` to pixels in
    /// `[x_min, x_min + width] x [y_min, y_min + height]`, flipping Y so that
    /// raster rows grow downward. Z passes through.
    pub fn viewport(x_min: f32, y_min: f32, width: f32, height: f32) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Mat4::new([
            [half_w, 0.0, 0.0, 0.0],
            [0.0, -half_h, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [x_min + half_w, y_min + half_h, 0.0, 1.0],
        ])
    }

    /// Creates a view matrix with left-handed coordinate system.
    ///
    /// # Arguments
    ///
    /// * `eye` - The position of the camera.
    /// * `target` - The point the camera is looking at.
    /// * `up` - The up direction of the camera.
    ///
    /// The basis vectors are stored as columns so that `p * view` yields
    /// `(p·right, p·up, p·forward)` relative to the eye.
    pub fn look_at_lh(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let forward = (target - eye).normalize();
        let right = up.cross(forward).normalize();
        let up = forward.cross(right);

        Self::new([
            [right.x, up.x, forward.x, 0.0],
            [right.y, up.y, forward.y, 0.0],
            [right.z, up.z, forward.z, 0.0],
            [-right.dot(eye), -up.dot(eye), -forward.dot(eye), 1.0],
        ])
    }

    pub fn transpose(&self) -> Self {
        let m = &self.data;
        let mut out = [[0.0f32; 4]; 4];
        for (row, out_row) in out.iter_mut().enumerate() {
            for (col, value) in out_row.iter_mut().enumerate() {
                *value = m[col][row];
            }
        }
        Mat4::new(out)
    }

    /// Inverse of a rigid (rotation + translation) matrix.
    ///
    /// Transposes the 3x3 rotation block and rebuilds the translation row as
    /// the negated dot products of the old translation with the rotation rows.
    /// Only valid for orthonormal rotation blocks: the result is wrong for
    /// matrices carrying scale, shear or projection. Use [`Mat4::inverse`]
    /// for those.
    pub fn fast_inverse(&self) -> Self {
        let m = &self.data;
        let t = Vec3::new(m[3][0], m[3][1], m[3][2]);
        let row = |i: usize| Vec3::new(m[i][0], m[i][1], m[i][2]);
        Mat4::new([
            [m[0][0], m[1][0], m[2][0], 0.0],
            [m[0][1], m[1][1], m[2][1], 0.0],
            [m[0][2], m[1][2], m[2][2], 0.0],
            [-t.dot(row(0)), -t.dot(row(1)), -t.dot(row(2)), 1.0],
        ])
    }

    /// General inverse by Gauss-Jordan elimination with partial pivoting.
    /// Returns `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<Mat4> {
        let mut a = self.data;
        let mut inv = Self::identity().data;

        for col in 0..4 {
            let pivot = (col..4)
                .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
                .unwrap_or(col);
            if a[pivot][col].abs() < SINGULAR_EPSILON {
                return None;
            }
            a.swap(col, pivot);
            inv.swap(col, pivot);

            let scale = 1.0 / a[col][col];
            for k in 0..4 {
                a[col][k] *= scale;
                inv[col][k] *= scale;
            }

            for row in 0..4 {
                if row == col {
                    continue;
                }
                let factor = a[row][col];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..4 {
                    a[row][k] -= factor * a[col][k];
                    inv[row][k] -= factor * inv[col][k];
                }
            }
        }

        Some(Mat4::new(inv))
    }

    /// The upper-left 3x3 block with translation removed.
    pub fn linear(&self) -> Self {
        let m = &self.data;
        Mat4::new([
            [m[0][0], m[0][1], m[0][2], 0.0],
            [m[1][0], m[1][1], m[1][2], 0.0],
            [m[2][0], m[2][1], m[2][2], 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Transforms a point (w=1) and performs the homogeneous divide.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        (Vec4::from_vec3(p, 1.0) * *self)
            .perspective_divide()
            .to_vec3()
    }

    /// Transforms a direction (w=0); translation has no effect.
    pub fn transform_direction(&self, d: Vec3) -> Vec3 {
        (Vec4::from_vec3(d, 0.0) * *self).to_vec3()
    }

    /// Access element at [row][col].
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row][col]
    }

    /// Set element at [row][col].
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row][col] = value;
    }
}

/// Matrix multiplication: `A * B` applies A first when used as `v * A * B`.
impl Mul<Mat4> for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Self::Output {
        let mut result = [[0.0f32; 4]; 4];

        for (row, out_row) in result.iter_mut().enumerate() {
            for (col, value) in out_row.iter_mut().enumerate() {
                *value = self.data[row][0] * rhs.data[0][col]
                    + self.data[row][1] * rhs.data[1][col]
                    + self.data[row][2] * rhs.data[2][col]
                    + self.data[row][3] * rhs.data[3][col];
            }
        }

        Mat4::new(result)
    }
}

/// Transform a row vector: `Vec4 * Mat4`.
impl Mul<Mat4> for Vec4 {
    type Output = Vec4;

    fn mul(self, m: Mat4) -> Self::Output {
        let d = &m.data;
        let column = |c: usize| {
            self.x * d[0][c] + self.y * d[1][c] + self.z * d[2][c] + self.w * d[3][c]
        };
        Vec4::new(column(0), column(1), column(2), column(3))
    }
}

impl AbsDiffEq for Mat4 {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.data
            .iter()
            .flatten()
            .zip(other.data.iter().flatten())
            .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl RelativeEq for Mat4 {
    fn default_max_relative() -> f32 {
        f32::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f32, max_relative: f32) -> bool {
        self.data
            .iter()
            .flatten()
            .zip(other.data.iter().flatten())
            .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}
