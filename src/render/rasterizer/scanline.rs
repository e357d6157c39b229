//! Scanline-based triangle rasterization.
//!
//! This module implements triangle rasterization using the classic scanline algorithm
//! with flat-top/flat-bottom triangle decomposition. This approach was widely used
//! in early software renderers and remains an efficient choice for CPU-based rendering.
//!
//! # Algorithm Overview
//!
//! The scanline algorithm processes triangles one horizontal line at a time:
//!
//! 1. **Sort vertices** by Y coordinate (top to bottom in screen space)
//! 2. **Decompose** the triangle into a flat-bottom and a flat-top half
//! 3. **Rasterize** each scanline by computing left/right edge intersections
//!
//! # Triangle Decomposition
//!
//! ```text
//!        v0                   v0
//!        /\                   /\
//!       /  \                 /  \
//!      /    \       =>      /----\<- split at v1.y
//!     /      \             v1   split
//!    /________\             \    /
//!   v1        v2             \  /
//!                             \/
//!                             v2
//!
//!   General triangle      Flat-bottom (top) + Flat-top (bottom)
//! ```
//!
//! Rows `ceil(v0.y)..=floor(v1.y)` belong to the flat-bottom half, rows
//! `floor(v1.y) + 1..=floor(v2.y)` to the flat-top half. Either half may be
//! empty.
//!
//! # Edge Intersections
//!
//! For each scanline the X position along an edge is
//!
//! ```text
//! x = x_start + (y - y_start) * (x_end - x_start) / (y_end - y_start)
//! ```
//!
//! The product is taken before the division so that integer vertices give
//! exact spans. The span covers pixels `ceil(min(xl, xr))..=floor(max(xl, xr))`.
//!
//! # Attributes
//!
//! Sorting only decides which rows and spans to walk. Weights for every
//! covered pixel come from barycentric coordinates against the unsorted
//! triangle, so attribute order matches the input vertex order.
//!
//! # Comparison with Edge Function Rasterization
//!
//! | Aspect | Scanline | Edge Function |
//! |--------|----------|---------------|
//! | Approach | Process rows sequentially | Test each pixel independently |
//! | Memory access | Cache-friendly (row by row) | Random within bounding box |
//! | Thin triangles | Touches covered pixels only | Tests the empty bounding box |
//! | Complexity | More code, edge cases | Simpler, uniform |
//!
//! # References
//!
//! - Foley, van Dam et al., "Computer Graphics: Principles and Practice"
//! - Abrash, Michael, "Graphics Programming Black Book"

use super::shader::{Barycentric, PixelShader};
use super::{band_rows, shade_pixel, snap, Rasterizer};
use crate::render::framebuffer::FrameSlice;
use crate::triangle::Triangle;

/// Scanline-based triangle rasterizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanlineRasterizer;

type Point = (f32, f32);

impl ScanlineRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Sort three points by ascending Y.
    fn sort_by_y(mut p: [Point; 3]) -> [Point; 3] {
        if p[0].1 > p[1].1 {
            p.swap(0, 1);
        }
        if p[1].1 > p[2].1 {
            p.swap(1, 2);
        }
        if p[0].1 > p[1].1 {
            p.swap(0, 1);
        }
        p
    }

    /// X where edge a→b crosses row y. The edge must not be horizontal.
    #[inline]
    fn edge_x(a: Point, b: Point, y: f32) -> f32 {
        a.0 + ((y - a.1) * (b.0 - a.0)) / (b.1 - a.1)
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_span<S: PixelShader>(
        tri: &Triangle,
        bary: &Barycentric,
        y: i32,
        xa: f32,
        xb: f32,
        slice: &mut FrameSlice,
        shader: &S,
    ) {
        let x_start = (xa.min(xb).ceil() as i32).max(0);
        let x_end = (xa.max(xb).floor() as i32).min(slice.width() as i32 - 1);
        for x in x_start..=x_end {
            let weights = bary.at(x as f32, y as f32);
            shade_pixel(tri, weights, x, y, slice, shader);
        }
    }
}

impl Rasterizer for ScanlineRasterizer {
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

        let [v0, v1, v2] = Self::sort_by_y(tri.vertices.map(|v| (v.position.x, v.position.y)));
        let (first, last) = band_rows(v0.1, v2.1, slice);
        let split = v1.1.floor() as i32;

        // Flat-bottom half: long edge v0→v2 against v0→v1.
        for y in first..=last.min(split) {
            let fy = y as f32;
            let long = Self::edge_x(v0, v2, fy);
            let short = if v1.1 > v0.1 {
                Self::edge_x(v0, v1, fy)
            } else {
                v1.0
            };
            Self::fill_span(&tri, &bary, y, long, short, slice, shader);
        }

        // Flat-top half: long edge v0→v2 against v1→v2.
        for y in first.max(split + 1)..=last {
            let fy = y as f32;
            let long = Self::edge_x(v0, v2, fy);
            let short = Self::edge_x(v1, v2, fy);
            Self::fill_span(&tri, &bary, y, long, short, slice, shader);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{pack_color, unpack_color};
    use crate::math::{Vec2, Vec3};
    use crate::render::framebuffer::FrameBuffer;
    use crate::render::rasterizer::{FlatShader, Fragment};
    use crate::triangle::Vertex;
    use approx::assert_relative_eq;

    fn tri(points: [(f32, f32); 3]) -> Triangle {
        Triangle::new(
            points.map(|(x, y)| Vertex::new(Vec3::new(x, y, 0.5), Vec3::FORWARD, Vec2::ZERO)),
        )
    }

    #[test]
    fn sort_orders_by_y() {
        let sorted = ScanlineRasterizer::sort_by_y([(0.0, 9.0), (1.0, 2.0), (2.0, 5.0)]);
        assert_eq!(sorted, [(1.0, 2.0), (2.0, 5.0), (0.0, 9.0)]);
    }

    #[test]
    fn flat_top_and_flat_bottom_triangles_fill() {
        let r = ScanlineRasterizer::new();
        let mut flat_top = FrameBuffer::new(12, 12);
        let shader = FlatShader::new(4);
        r.fill_triangle(
            &tri([(1.0, 1.0), (10.0, 1.0), (5.0, 10.0)]),
            &mut flat_top.as_slice(),
            &shader,
        );
        assert_eq!(flat_top.get_pixel(1, 1), Some(4));
        assert_eq!(flat_top.get_pixel(10, 1), Some(4));
        assert_eq!(flat_top.get_pixel(5, 10), Some(4));

        let mut flat_bottom = FrameBuffer::new(12, 12);
        r.fill_triangle(
            &tri([(5.0, 1.0), (1.0, 10.0), (10.0, 10.0)]),
            &mut flat_bottom.as_slice(),
            &shader,
        );
        assert_eq!(flat_bottom.get_pixel(5, 1), Some(4));
        assert_eq!(flat_bottom.get_pixel(1, 10), Some(4));
        assert_eq!(flat_bottom.get_pixel(10, 10), Some(4));
        assert_ne!(flat_bottom.get_pixel(1, 2), Some(4));
    }

    /// Writes the red channel of the interpolated vertex colour.
    struct ColorShader;

    impl PixelShader for ColorShader {
        fn shade(&self, triangle: &Triangle, fragment: &Fragment) -> u32 {
            pack_color(fragment.interpolate(triangle.vertices.map(|v| v.color)))
        }
    }

    #[test]
    fn attributes_follow_input_vertex_order() {
        let mut t = tri([(0.0, 10.0), (10.0, 10.0), (0.0, 0.0)]);
        t.vertices[0].color = Vec3::new(1.0, 0.0, 0.0);
        t.vertices[1].color = Vec3::new(0.0, 1.0, 0.0);
        t.vertices[2].color = Vec3::new(0.0, 0.0, 1.0);

        let mut fb = FrameBuffer::new(12, 12);
        ScanlineRasterizer::new().fill_triangle(&t, &mut fb.as_slice(), &ColorShader);

        let at = |x, y| unpack_color(fb.get_pixel(x, y).unwrap_or_default());
        assert_relative_eq!(at(0, 10), Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-2);
        assert_relative_eq!(at(10, 10), Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-2);
        assert_relative_eq!(at(0, 0), Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-2);
    }

    #[test]
    fn band_clamps_rows() {
        let mut fb = FrameBuffer::new(10, 10);
        let t = tri([(0.0, 0.0), (9.0, 0.0), (0.0, 9.0)]);
        let dropped = fb.for_each_band(2, |slice| {
            if slice.y0() == 4 {
                ScanlineRasterizer::new().fill_triangle(&t, slice, &FlatShader::new(5));
            }
        });
        assert_eq!(dropped, 0);
        for y in 0..10 {
            let painted = fb.get_pixel(0, y) == Some(5);
            assert_eq!(painted, y == 4 || y == 5, "row {y}");
        }
    }
}
