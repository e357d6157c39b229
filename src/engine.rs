//! Core rendering engine.
//!
//! The [`Engine`] struct is the main entry point for the renderer. It owns
//! the model, scene, configuration and framebuffers, and runs the pipeline
//! stages of [`crate::pipeline`] for every [`Engine::render`] call.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::RenderConfig;
use crate::model::{Model, ModelError};
use crate::pipeline::shadow::{ShadowKey, ShadowSet};
use crate::pipeline::{self, FrameMatrices};
use crate::projection::Viewport;
use crate::render::framebuffer::FrameBuffer;
use crate::render::rasterizer::{RasterizerDispatcher, RasterizerType};
use crate::render::shading::{RenderMode, ShadingContext, SurfaceShader};
use crate::scene::Scene;

/// What the last frame did, for timing displays.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Model triangles entering the pipeline.
    pub input_triangles: usize,
    pub after_culling: usize,
    pub after_near_clip: usize,
    /// Triangles handed to the rasterizer.
    pub rasterized: usize,
    pub dropped_writes: usize,
    pub shadow_maps_rebuilt: bool,
    pub elapsed: Duration,
}

impl FrameStats {
    pub fn fps(&self) -> f32 {
        let secs = self.elapsed.as_secs_f32();
        if secs > 0.0 {
            1.0 / secs
        } else {
            0.0
        }
    }
}

pub struct Engine {
    width: u32,
    height: u32,
    framebuffer: FrameBuffer,
    /// Render target at `supersample` times the output size.
    supersampled: FrameBuffer,
    config: RenderConfig,
    rasterizer: RasterizerDispatcher,
    model: Model,
    scene: Scene,
    shadows: Option<(ShadowKey, ShadowSet)>,
    stats: FrameStats,
}

impl Engine {
    /// Engine rendering the built-in cube with the default scene.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_config(width, height, RenderConfig::default())
    }

    pub fn with_config(width: u32, height: u32, config: RenderConfig) -> Self {
        Self {
            width,
            height,
            framebuffer: FrameBuffer::new(width, height),
            supersampled: FrameBuffer::new(0, 0),
            rasterizer: RasterizerDispatcher::new(config.rasterizer),
            config,
            model: Model::cube(),
            scene: Scene::default(),
            shadows: None,
            stats: FrameStats::default(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resizes the output. Must not overlap a [`Engine::render`] call.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        log::info!("resizing framebuffer to {width}x{height}");
        self.width = width;
        self.height = height;
        self.framebuffer.resize(width, height);
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RenderConfig) {
        self.rasterizer.set_type(config.rasterizer);
        self.config = config;
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.config.render_mode = mode;
    }

    pub fn render_mode(&self) -> RenderMode {
        self.config.render_mode
    }

    pub fn set_rasterizer(&mut self, rasterizer_type: RasterizerType) {
        self.config.rasterizer = rasterizer_type;
        self.rasterizer.set_type(rasterizer_type);
    }

    pub fn rasterizer(&self) -> RasterizerType {
        self.rasterizer.active_type()
    }

    pub fn load_obj<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ModelError> {
        self.set_model(Model::load_obj(path)?);
        Ok(())
    }

    pub fn set_model(&mut self, model: Model) {
        self.model = model;
        self.shadows = None;
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Forces the shadow maps to be rebuilt on the next frame.
    pub fn invalidate_shadows(&mut self) {
        self.shadows = None;
    }

    pub fn shadow_maps(&self) -> Option<&ShadowSet> {
        self.shadows.as_ref().map(|(_, set)| set)
    }

    /// The last rendered frame at output resolution.
    pub fn frame(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Renders one frame into [`Engine::frame`].
    pub fn render(&mut self) -> FrameStats {
        let start = Instant::now();
        let factor = self.config.supersample_factor();
        let mode = self.config.render_mode;
        let rows = self.config.band_rows();
        let viewport = Viewport::new(self.width * factor, self.height * factor);

        let camera = &self.scene.camera;
        let projection = camera.projection(viewport.aspect_ratio());
        let matrices = FrameMatrices {
            model: self.model.transform().to_matrix(),
            view: camera.view_matrix(),
            projection: projection.matrix(),
            viewport: viewport.matrix(),
        };
        let mut stats = FrameStats {
            input_triangles: self.model.triangles().len(),
            ..FrameStats::default()
        };

        let world = pipeline::to_world(self.model.triangles(), &matrices.model);

        let shadowed = self.config.shadows.enabled && mode.uses_shadows();
        if shadowed {
            let key = ShadowKey::new(
                matrices.model,
                &self.scene.lights,
                self.config.shadows,
                world.len(),
            );
            let fresh = matches!(&self.shadows, Some((cached, _)) if *cached == key);
            if !fresh {
                self.shadows = ShadowSet::build(
                    &self.scene.lights,
                    &world,
                    &self.config.shadows,
                    &self.rasterizer,
                    rows,
                )
                .map(|set| (key, set));
                stats.shadow_maps_rebuilt = true;
            }
        }
        let shadows = if shadowed {
            self.shadows.as_ref().map(|(_, set)| set)
        } else {
            None
        };

        let eye = self.scene.camera.position();
        let visible = if self.config.backface_culling {
            pipeline::cull_back_faces(world, eye)
        } else {
            world
        };
        stats.after_culling = visible.len();

        let ctx = ShadingContext {
            eye,
            lights: &self.scene.lights,
            ambient: self.scene.background,
            materials: self.model.materials(),
            environment: self.scene.environment.as_ref(),
            shadows,
            config: &self.config,
        };
        let lit = if mode.lights_vertices() {
            pipeline::light_vertices(visible, &ctx)
        } else {
            visible
        };

        let view = pipeline::to_view(lit, &matrices.view);
        let clipped = pipeline::clip_near(view, &projection);
        stats.after_near_clip = clipped.len();
        let screen = pipeline::project(clipped, &matrices.projection_viewport());
        let screen = pipeline::clip_viewport(screen, &viewport);
        let screen = pipeline::reconstruct_world(screen, &matrices.view_projection_viewport());
        stats.rasterized = screen.len();

        let target = if factor > 1 {
            &mut self.supersampled
        } else {
            &mut self.framebuffer
        };
        target.resize(viewport.width, viewport.height);
        target.clear(self.config.background_color);

        stats.dropped_writes = match mode {
            RenderMode::Wireframe => {
                pipeline::draw_wireframe(&screen, target, rows, self.config.wireframe_color)
            }
            _ => pipeline::rasterize(
                &screen,
                target,
                rows,
                &self.rasterizer,
                &SurfaceShader::new(mode, ctx),
            ),
        };
        if factor > 1 {
            self.supersampled.resolve_into(factor, &mut self.framebuffer);
        }

        if stats.dropped_writes > 0 {
            log::warn!(
                "dropped {} out-of-range pixel writes this frame",
                stats.dropped_writes
            );
        }
        stats.elapsed = start.elapsed();
        log::debug!(
            "frame {}x{} ({mode}, {}): {} in, {} kept, {} after clip, {} drawn in {:?}",
            self.width,
            self.height,
            self.rasterizer.active_type(),
            stats.input_triangles,
            stats.after_culling,
            stats.after_near_clip,
            stats.rasterized,
            stats.elapsed
        );
        self.stats = stats;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors;
    use crate::config::ShadowConfig;

    fn lit_pixels(engine: &Engine) -> usize {
        engine
            .frame()
            .color()
            .iter()
            .filter(|&&c| c != engine.config().background_color)
            .count()
    }

    #[test]
    fn cube_renders_in_the_middle_of_the_frame() {
        let mut engine = Engine::new(64, 64);
        let stats = engine.render();
        assert_eq!(stats.input_triangles, 12);
        assert!(stats.after_culling < 12);
        assert_eq!(stats.dropped_writes, 0);
        assert_ne!(engine.frame().get_pixel(32, 32), Some(colors::BLACK));
        assert_eq!(engine.frame().get_pixel(0, 0), Some(colors::BLACK));
    }

    #[test]
    fn every_render_mode_draws_something() {
        for mode in [
            RenderMode::Flat,
            RenderMode::VertexLit,
            RenderMode::MaterialMapped,
            RenderMode::Pbr,
            RenderMode::DepthOnly,
            RenderMode::Wireframe,
        ] {
            let mut engine = Engine::new(48, 48);
            engine.set_render_mode(mode);
            engine.render();
            assert!(lit_pixels(&engine) > 0, "{mode} drew nothing");
        }
    }

    #[test]
    fn supersampled_frame_keeps_output_size() {
        let config = RenderConfig {
            supersample: 2,
            ..RenderConfig::default()
        };
        let mut engine = Engine::with_config(40, 30, config);
        engine.render();
        assert_eq!((engine.frame().width(), engine.frame().height()), (40, 30));
        assert!(lit_pixels(&engine) > 0);
    }

    #[test]
    fn shadow_maps_are_cached_until_invalidated() {
        let config = RenderConfig {
            shadows: ShadowConfig {
                enabled: true,
                resolution: 64,
                ..ShadowConfig::default()
            },
            ..RenderConfig::default()
        };
        let mut engine = Engine::with_config(32, 32, config);
        assert!(engine.render().shadow_maps_rebuilt);
        assert!(!engine.render().shadow_maps_rebuilt);
        engine.invalidate_shadows();
        assert!(engine.render().shadow_maps_rebuilt);
        engine.model_mut().transform_mut().rotate_y(0.3);
        assert!(engine.render().shadow_maps_rebuilt);
        assert_eq!(engine.shadow_maps().map(ShadowSet::len), Some(1));
    }

    #[test]
    fn resize_changes_frame_size() {
        let mut engine = Engine::new(16, 16);
        engine.resize(20, 10);
        engine.render();
        assert_eq!((engine.frame().width(), engine.frame().height()), (20, 10));
    }
}
