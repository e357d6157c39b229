//! Pixel shader seam between coverage and colour.
//!
//! The rasterizer handles:
//! - Coverage (which pixels a triangle touches)
//! - Barycentric weights and depth
//! - The depth test
//!
//! The shader handles:
//! - Attribute interpolation (colours, normals, UVs, world position)
//! - Texture sampling and lighting
//! - Final colour computation

use std::ops::{Add, Mul};

use crate::triangle::Triangle;

/// Twice the signed screen area below which a triangle is treated as degenerate.
pub const DEGENERATE_AREA: f32 = 1e-6;

/// Barycentric weights by Cramer's rule for a fixed screen triangle.
#[derive(Clone, Copy, Debug)]
pub struct Barycentric {
    origin: (f32, f32),
    e1: (f32, f32),
    e2: (f32, f32),
    det: f32,
    inv_det: f32,
}

impl Barycentric {
    /// `None` for collinear or zero-area triangles.
    pub fn new(triangle: &Triangle) -> Option<Self> {
        let [p0, p1, p2] = triangle.vertices.map(|v| (v.position.x, v.position.y));
        let e1 = (p1.0 - p0.0, p1.1 - p0.1);
        let e2 = (p2.0 - p0.0, p2.1 - p0.1);
        let det = e1.0 * e2.1 - e2.0 * e1.1;
        if det.abs() < DEGENERATE_AREA {
            return None;
        }
        Some(Self {
            origin: p0,
            e1,
            e2,
            det,
            inv_det: 1.0 / det,
        })
    }

    /// Weights of the three vertices at (x, y). They sum to one; all lie in
    /// `[0, 1]` exactly when the point is inside.
    ///
    /// The numerators are exact for integer inputs, so a point on an edge
    /// gets a weight of exactly zero.
    #[inline]
    pub fn at(&self, x: f32, y: f32) -> [f32; 3] {
        let p = (x - self.origin.0, y - self.origin.1);
        let n1 = p.0 * self.e2.1 - self.e2.0 * p.1;
        let n2 = self.e1.0 * p.1 - p.0 * self.e1.1;
        let n0 = self.det - n1 - n2;
        [n0 * self.inv_det, n1 * self.inv_det, n2 * self.inv_det]
    }
}

/// A covered pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fragment {
    pub x: i32,
    pub y: i32,
    /// Depth interpolated with screen-space weights.
    pub depth: f32,
    /// Screen-space weights, clamped to `[0, 1]` and renormalized.
    pub screen: [f32; 3],
    /// Perspective-correct weights for view-dependent attributes.
    pub perspective: [f32; 3],
}

impl Fragment {
    pub fn new(x: i32, y: i32, weights: [f32; 3], triangle: &Triangle) -> Self {
        let clamped = weights.map(|w| w.clamp(0.0, 1.0));
        let sum = clamped[0] + clamped[1] + clamped[2];
        let screen = if sum > 0.0 {
            clamped.map(|w| w / sum)
        } else {
            [1.0 / 3.0; 3]
        };

        let v = &triangle.vertices;
        let depth =
            screen[0] * v[0].position.z + screen[1] * v[1].position.z + screen[2] * v[2].position.z;

        let q = [
            screen[0] * v[0].inv_w,
            screen[1] * v[1].inv_w,
            screen[2] * v[2].inv_w,
        ];
        let q_sum = q[0] + q[1] + q[2];
        let perspective = if q_sum.abs() > f32::EPSILON {
            q.map(|w| w / q_sum)
        } else {
            screen
        };

        Self {
            x,
            y,
            depth,
            screen,
            perspective,
        }
    }

    /// Perspective-correct blend of one attribute per vertex.
    #[inline]
    pub fn interpolate<T>(&self, values: [T; 3]) -> T
    where
        T: Mul<f32, Output = T> + Add<Output = T>,
    {
        let [a, b, c] = values;
        let [w0, w1, w2] = self.perspective;
        a * w0 + b * w1 + c * w2
    }
}

/// Trait for per-pixel shading computations.
///
/// The rasterizer calls `shade()` for each pixel that passes the depth test.
pub trait PixelShader: Sync {
    fn shade(&self, triangle: &Triangle, fragment: &Fragment) -> u32;
}

/// Flat shader - returns a constant colour for all pixels.
pub struct FlatShader {
    color: u32,
}

impl FlatShader {
    pub fn new(color: u32) -> Self {
        Self { color }
    }
}

impl PixelShader for FlatShader {
    #[inline]
    fn shade(&self, _triangle: &Triangle, _fragment: &Fragment) -> u32 {
        self.color
    }
}
