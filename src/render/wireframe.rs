//! Triangle outlines for wireframe mode.

use super::framebuffer::FrameSlice;
use crate::triangle::Triangle;

/// Draws the three edges of a screen-space triangle into `slice`.
/// No depth test is performed.
pub fn draw_triangle_edges(triangle: &Triangle, slice: &mut FrameSlice, color: u32) {
    let p = triangle
        .vertices
        .map(|v| (v.position.x.round() as i32, v.position.y.round() as i32));
    for i in 0..3 {
        let (a, b) = (p[i], p[(i + 1) % 3]);
        slice.draw_line(a.0, a.1, b.0, b.1, color);
    }
}
