//! Triangle rasterization algorithms.
//!
//! Two interchangeable rasterizers fill screen-space triangles into one
//! framebuffer band:
//! - [`ScanlineRasterizer`]: Flat-top/flat-bottom triangle decomposition
//! - [`EdgeFunctionRasterizer`]: Bounding box iteration with edge function tests
//!
//! Both sample at integer pixel positions after snapping vertex X/Y to the
//! nearest pixel, skip degenerate triangles, and hand every covered pixel to
//! a [`PixelShader`] only after it passes the depth test.

mod edgefunction;
mod scanline;
pub mod shader;

pub use edgefunction::EdgeFunctionRasterizer;
pub use scanline::ScanlineRasterizer;
pub use shader::{Barycentric, FlatShader, Fragment, PixelShader};

use serde::{Deserialize, Serialize};

use super::framebuffer::FrameSlice;
use crate::triangle::Triangle;

/// Trait for triangle rasterization algorithms.
///
/// Implementors only write pixels inside the slice's rows.
pub trait Rasterizer {
    fn fill_triangle<S: PixelShader>(
        &self,
        triangle: &Triangle,
        slice: &mut FrameSlice,
        shader: &S,
    );
}

/// Available rasterization algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RasterizerType {
    /// Scanline rasterizer using flat-top/flat-bottom triangle decomposition.
    #[default]
    Scanline,
    /// Edge function rasterizer that tests each pixel in the bounding box.
    EdgeFunction,
}

impl std::fmt::Display for RasterizerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RasterizerType::Scanline => write!(f, "Scanline"),
            RasterizerType::EdgeFunction => write!(f, "EdgeFunction"),
        }
    }
}

/// Holds both rasterizer implementations and forwards to the active one.
pub struct RasterizerDispatcher {
    scanline: ScanlineRasterizer,
    edge_function: EdgeFunctionRasterizer,
    active: RasterizerType,
}

impl RasterizerDispatcher {
    pub fn new(rasterizer_type: RasterizerType) -> Self {
        Self {
            scanline: ScanlineRasterizer::new(),
            edge_function: EdgeFunctionRasterizer::new(),
            active: rasterizer_type,
        }
    }

    pub fn set_type(&mut self, rasterizer_type: RasterizerType) {
        self.active = rasterizer_type;
    }

    pub fn active_type(&self) -> RasterizerType {
        self.active
    }
}

impl Rasterizer for RasterizerDispatcher {
    #[inline]
    fn fill_triangle<S: PixelShader>(
        &self,
        triangle: &Triangle,
        slice: &mut FrameSlice,
        shader: &S,
    ) {
        match self.active {
            RasterizerType::Scanline => self.scanline.fill_triangle(triangle, slice, shader),
            RasterizerType::EdgeFunction => {
                self.edge_function.fill_triangle(triangle, slice, shader)
            }
        }
    }
}

/// Copy of `triangle` with screen X/Y rounded to whole pixels.
pub(crate) fn snap(triangle: &Triangle) -> Triangle {
    triangle.map_vertices(|v| {
        let mut v = *v;
        v.position.x = v.position.x.round();
        v.position.y = v.position.y.round();
        v
    })
}

/// Depth-tests pixel (x, y) and shades it on success.
#[inline]
pub(crate) fn shade_pixel<S: PixelShader>(
    triangle: &Triangle,
    weights: [f32; 3],
    x: i32,
    y: i32,
    slice: &mut FrameSlice,
    shader: &S,
) {
    let fragment = Fragment::new(x, y, weights, triangle);
    if let Some(index) = slice.test_depth(x, y, fragment.depth) {
        slice.write_color(index, shader.shade(triangle, &fragment));
    }
}

/// Rows of `triangle` that fall in `slice`, inclusive.
#[inline]
pub(crate) fn band_rows(y_min: f32, y_max: f32, slice: &FrameSlice) -> (i32, i32) {
    let first = (y_min.ceil() as i32).max(slice.y0() as i32);
    let last = (y_max.floor() as i32).min(slice.y1() as i32 - 1);
    (first, last)
}
