//! Edge function-based triangle rasterization.
//!
//! The edge function algorithm is the foundation of GPU rasterization. Each
//! pixel of the triangle's bounding box is tested against three edge
//! equations to decide coverage.
//!
//! # Algorithm Overview
//!
//! 1. Compute the bounding box of the snapped triangle, clamped to the frame
//!    width and the rows of the current band
//! 2. For each pixel in the box, evaluate the three edge functions
//! 3. A pixel is covered when all three values share a sign (zero counts for
//!    both, so pixels on an edge are covered)
//!
//! # Edge Function
//!
//! For an edge from point A to point B, the edge function at point P is:
//!
//! ```text
//! E(P) = (B.x - A.x) * (P.y - A.y) - (B.y - A.y) * (P.x - A.x)
//! ```
//!
//! This is the 2D cross product (B - A) × (P - A). With snapped vertices and
//! integer sample positions every value is a small integer, so coverage is
//! exact and matches the scanline rasterizer pixel for pixel.
//!
//! Stepping one pixel in X changes E by `-(B.y - A.y)`, one row in Y by
//! `(B.x - A.x)`. The inner loop only adds.
//!
//! # Winding Order
//!
//! Both clockwise and counter-clockwise triangles are accepted: interior
//! points are all-positive for one winding and all-negative for the other.
//!
//! # References
//!
//! - Juan Pineda, "A Parallel Algorithm for Polygon Rasterization" (1988)
//! - Scratchapixel, "Rasterization: a Practical Implementation"

use super::shader::{Barycentric, PixelShader};
use super::{band_rows, shade_pixel, snap, Rasterizer};
use crate::render::framebuffer::FrameSlice;
use crate::triangle::Triangle;

/// Triangle rasterizer using the edge function algorithm.
///
/// Simple and uniform, but it tests every pixel of the bounding box, which
/// wastes work on thin diagonal triangles.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeFunctionRasterizer;

impl EdgeFunctionRasterizer {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Clone, Copy)]
struct Edge {
    step_x: f32,
    step_y: f32,
    origin: f32,
}

impl Edge {
    /// Edge A→B, with its value evaluated at (x, y).
    fn new(a: (f32, f32), b: (f32, f32), x: f32, y: f32) -> Self {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        Self {
            step_x: -dy,
            step_y: dx,
            origin: dx * (y - a.1) - dy * (x - a.0),
        }
    }
}

impl Rasterizer for EdgeFunctionRasterizer {
    fn fill_triangle<S: PixelShader>(
        &self,
        triangle: &Triangle,
        slice: &mut FrameSlice,
        shader: &S,
    ) {
        let tri = snap(triangle);
        let Some(bary) = Barycentric::new(&tri) else {
            return;
        };

        let [p0, p1, p2] = tri.vertices.map(|v| (v.position.x, v.position.y));
        let min_x = p0.0.min(p1.0).min(p2.0);
        let max_x = p0.0.max(p1.0).max(p2.0);
        let (min_y, max_y) = tri.y_range();

        let x_start = (min_x.ceil() as i32).max(0);
        let x_end = (max_x.floor() as i32).min(slice.width() as i32 - 1);
        let (y_start, y_end) = band_rows(min_y, max_y, slice);
        if x_start > x_end || y_start > y_end {
            return;
        }

        let (fx, fy) = (x_start as f32, y_start as f32);
        let edges = [
            Edge::new(p1, p2, fx, fy),
            Edge::new(p2, p0, fx, fy),
            Edge::new(p0, p1, fx, fy),
        ];
        let mut row = edges.map(|e| e.origin);

        for y in y_start..=y_end {
            let mut w = row;
            for x in x_start..=x_end {
                let inside = (w[0] >= 0.0 && w[1] >= 0.0 && w[2] >= 0.0)
                    || (w[0] <= 0.0 && w[1] <= 0.0 && w[2] <= 0.0);
                if inside {
                    let weights = bary.at(x as f32, y as f32);
                    shade_pixel(&tri, weights, x, y, slice, shader);
                }
                for (value, edge) in w.iter_mut().zip(&edges) {
                    *value += edge.step_x;
                }
            }
            for (value, edge) in row.iter_mut().zip(&edges) {
                *value += edge.step_y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec2, Vec3};
    use crate::render::framebuffer::FrameBuffer;
    use crate::render::rasterizer::FlatShader;
    use crate::triangle::Vertex;

    fn tri(points: [(f32, f32); 3]) -> Triangle {
        Triangle::new(
            points.map(|(x, y)| Vertex::new(Vec3::new(x, y, 0.5), Vec3::FORWARD, Vec2::ZERO)),
        )
    }

    #[test]
    fn edges_and_vertices_are_covered() {
        let mut fb = FrameBuffer::new(20, 20);
        let t = tri([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
        EdgeFunctionRasterizer::new().fill_triangle(&t, &mut fb.as_slice(), &FlatShader::new(7));

        for (x, y) in [(0, 0), (10, 0), (0, 10), (5, 5), (5, 0), (0, 5)] {
            assert_eq!(fb.get_pixel(x, y), Some(7), "pixel ({x}, {y})");
        }
        assert_ne!(fb.get_pixel(6, 5), Some(7));
        assert_ne!(fb.get_pixel(11, 0), Some(7));
    }

    #[test]
    fn winding_does_not_matter() {
        let mut cw = FrameBuffer::new(16, 16);
        let mut ccw = FrameBuffer::new(16, 16);
        let r = EdgeFunctionRasterizer::new();
        let shader = FlatShader::new(1);
        let (a, b, c) = ((1.0, 1.0), (14.0, 3.0), (4.0, 13.0));
        r.fill_triangle(&tri([a, b, c]), &mut cw.as_slice(), &shader);
        r.fill_triangle(&tri([a, c, b]), &mut ccw.as_slice(), &shader);
        assert_eq!(cw.color(), ccw.color());
    }

    #[test]
    fn partially_offscreen_triangle_is_clamped_without_drops() {
        let mut fb = FrameBuffer::new(8, 8);
        let t = tri([(-4.0, -4.0), (12.0, -4.0), (-4.0, 12.0)]);
        let dropped = fb.for_each_band(3, |slice| {
            EdgeFunctionRasterizer::new().fill_triangle(&t, slice, &FlatShader::new(3));
        });
        assert_eq!(dropped, 0);
        assert_eq!(fb.get_pixel(0, 0), Some(3));
        assert_eq!(fb.get_pixel(4, 4), Some(3));
    }
}
