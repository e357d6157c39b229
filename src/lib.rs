//! A CPU software rendering pipeline.
//!
//! Triangles go through model, view and projection transforms, back-face
//! culling, near-plane and viewport clipping, and are filled by a scanline
//! or edge-function rasterizer into row bands of a framebuffer on the rayon
//! pool. Pixels are shaded per vertex (Phong), per pixel from material maps,
//! or with a Cook-Torrance PBR model, optionally with shadow maps.
//!
//! # Quick Start
//!
//! ```no_run
//! use shadeline::prelude::*;
//!
//! let mut engine = Engine::new(800, 600);
//! engine.set_render_mode(RenderMode::Pbr);
//! let stats = engine.render();
//! println!("{} triangles in {:?}", stats.rasterized, stats.elapsed);
//! let pixels: &[u32] = engine.frame().color();
//! # let _ = pixels;
//! ```

pub mod camera;
pub mod clipper;
pub mod colors;
pub mod config;
pub mod engine;
pub mod light;
pub mod material;
pub mod math;
pub mod model;
pub mod pipeline;
pub mod projection;
pub mod render;
pub mod scene;
pub mod texture;
pub mod transform;
pub mod triangle;

// Re-export commonly needed types at crate root for convenience
pub use config::RenderConfig;
pub use engine::{Engine, FrameStats};
pub use model::{Model, ModelError};
pub use render::{RasterizerType, RenderMode};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use shadeline::prelude::*;
/// ```
pub mod prelude {
    // Scene
    pub use crate::camera::{Camera, Orientation};
    pub use crate::light::PointLight;
    pub use crate::scene::Scene;

    // Engine
    pub use crate::config::{PbrConfig, RenderConfig, ShadowComposition, ShadowConfig};
    pub use crate::engine::{Engine, FrameStats};

    // Model
    pub use crate::material::Material;
    pub use crate::model::{Model, ModelError};
    pub use crate::texture::Texture;
    pub use crate::transform::Transform;
    pub use crate::triangle::{Triangle, Vertex};

    // Projection
    pub use crate::projection::{Projection, Viewport};

    // Math
    pub use crate::math::{Mat4, Vec2, Vec3, Vec4};

    // Rendering
    pub use crate::render::{FrameBuffer, RasterizerType, RenderMode};
}
