//! Framebuffer, rasterizers and per-pixel shading.

pub mod framebuffer;
pub mod rasterizer;
pub mod shading;
pub mod wireframe;

pub use framebuffer::{FrameBuffer, FrameSlice};
pub use rasterizer::{
    EdgeFunctionRasterizer, Fragment, PixelShader, Rasterizer, RasterizerDispatcher,
    RasterizerType, ScanlineRasterizer,
};
pub use shading::{RenderMode, ShadingContext, SurfaceShader};
