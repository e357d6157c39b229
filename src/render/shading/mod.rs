//! Lighting models evaluated per pixel.
//!
//! [`SurfaceShader`] is the single [`PixelShader`] used for filled frames.
//! It selects a lighting model from the active [`RenderMode`] with one
//! `match` per pixel:
//!
//! - [`RenderMode::Flat`]: one grey level per face from its averaged normal
//! - [`RenderMode::VertexLit`]: interpolates colours lit per vertex by
//!   [`phong::light_vertex`] during the world-space stage
//! - [`RenderMode::MaterialMapped`]: Phong lighting per pixel from the
//!   material's texture maps, with normal mapping and environment reflection
//! - [`RenderMode::Pbr`]: Cook-Torrance microfacet shading, tone mapped
//! - [`RenderMode::DepthOnly`]: greyscale depth
//! - [`RenderMode::Wireframe`]: flat wireframe colour (edges are drawn
//!   separately, see [`crate::render::wireframe`])

pub mod material;
pub mod pbr;
pub mod phong;

use serde::{Deserialize, Serialize};

use super::rasterizer::{Fragment, PixelShader};
use crate::colors::{gray, pack_color};
use crate::config::{RenderConfig, ShadowComposition};
use crate::light::PointLight;
use crate::material::Material;
use crate::math::{Vec2, Vec3};
use crate::pipeline::shadow::ShadowSet;
use crate::texture::Texture;
use crate::triangle::Triangle;

/// Which lighting model fills covered pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderMode {
    Flat,
    VertexLit,
    #[default]
    MaterialMapped,
    Pbr,
    DepthOnly,
    Wireframe,
}

impl RenderMode {
    /// Whether lighting is evaluated per vertex before rasterization.
    pub fn lights_vertices(self) -> bool {
        matches!(self, RenderMode::VertexLit)
    }

    /// Whether the frame needs shadow maps when they are enabled.
    pub fn uses_shadows(self) -> bool {
        matches!(self, RenderMode::MaterialMapped | RenderMode::Pbr)
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RenderMode::Flat => "Flat",
            RenderMode::VertexLit => "VertexLit",
            RenderMode::MaterialMapped => "MaterialMapped",
            RenderMode::Pbr => "Pbr",
            RenderMode::DepthOnly => "DepthOnly",
            RenderMode::Wireframe => "Wireframe",
        };
        f.write_str(name)
    }
}

/// Everything lighting needs besides the triangle and fragment.
#[derive(Clone, Copy)]
pub struct ShadingContext<'a> {
    /// World-space camera position.
    pub eye: Vec3,
    pub lights: &'a [PointLight],
    /// Background light intensity, used as the ambient term.
    pub ambient: Vec3,
    pub materials: &'a [Material],
    /// Sphere-mapped environment for reflections.
    pub environment: Option<&'a Texture>,
    /// One shadow map per light, when shadows are enabled.
    pub shadows: Option<&'a ShadowSet>,
    pub config: &'a RenderConfig,
}

impl<'a> ShadingContext<'a> {
    pub fn material(&self, triangle: &Triangle) -> Option<&'a Material> {
        triangle.material.and_then(|i| self.materials.get(i))
    }

    /// Shadow factor of light `index` at a world-space point, 0 when lit.
    pub fn shadow(&self, index: usize, position: Vec3, normal: Vec3) -> f32 {
        match (self.shadows, self.lights.get(index)) {
            (Some(set), Some(light)) => set.factor(
                index,
                position,
                normal,
                light.direction_from(position),
                &self.config.shadows,
            ),
            _ => 0.0,
        }
    }

    /// Sums `ambient` and per-light `(direct, shadow)` contributions
    /// according to the configured shadow composition.
    pub fn compose(&self, ambient: Vec3, lights: impl Iterator<Item = (Vec3, f32)>) -> Vec3 {
        match self.config.shadows.composition {
            ShadowComposition::PerLight => {
                lights.fold(ambient, |acc, (direct, shadow)| acc + direct * (1.0 - shadow))
            }
            ShadowComposition::Minimum => {
                let (direct, shadow) = lights.fold((Vec3::ZERO, 1.0f32), |(sum, min), (d, s)| {
                    (sum + d, min.min(s))
                });
                let shadow = if self.shadows.is_some() { shadow } else { 0.0 };
                ambient + direct * (1.0 - shadow)
            }
        }
    }
}

/// Attributes of the surface under one fragment, interpolated
/// perspective-correctly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub color: Vec3,
}

impl Surface {
    pub fn at(triangle: &Triangle, fragment: &Fragment) -> Self {
        let v = &triangle.vertices;
        Self {
            position: fragment.interpolate(v.map(|v| v.world)),
            normal: fragment.interpolate(v.map(|v| v.normal)).normalize(),
            uv: fragment.interpolate(v.map(|v| v.uv)),
            color: fragment.interpolate(v.map(|v| v.color)),
        }
    }
}

/// Unit normal encoded as a colour, `[-1, 1]` to `[0, 1]` per channel.
pub fn normal_color(normal: Vec3) -> u32 {
    pack_color((normal + Vec3::ONE) * 0.5)
}

/// Shades filled triangles in the active render mode.
pub struct SurfaceShader<'a> {
    mode: RenderMode,
    context: ShadingContext<'a>,
}

impl<'a> SurfaceShader<'a> {
    pub fn new(mode: RenderMode, context: ShadingContext<'a>) -> Self {
        Self { mode, context }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }
}

impl PixelShader for SurfaceShader<'_> {
    fn shade(&self, triangle: &Triangle, fragment: &Fragment) -> u32 {
        let ctx = &self.context;
        match self.mode {
            RenderMode::DepthOnly => gray(fragment.depth),
            RenderMode::Wireframe => ctx.config.wireframe_color,
            RenderMode::Flat => gray(phong::flat_intensity(ctx.lights, triangle)),
            RenderMode::VertexLit => {
                let surface = Surface::at(triangle, fragment);
                if ctx.config.debug_normals {
                    normal_color(surface.normal)
                } else {
                    pack_color(surface.color)
                }
            }
            RenderMode::MaterialMapped => {
                let surface = Surface::at(triangle, fragment);
                let normal = material::shading_normal(ctx, triangle, &surface);
                if ctx.config.debug_normals {
                    normal_color(normal)
                } else {
                    pack_color(material::shade(ctx, triangle, &surface, normal))
                }
            }
            RenderMode::Pbr => {
                let surface = Surface::at(triangle, fragment);
                let normal = material::shading_normal(ctx, triangle, &surface);
                if ctx.config.debug_normals {
                    normal_color(normal)
                } else {
                    pack_color(pbr::shade(ctx, triangle, &surface, normal))
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::colors::unpack_color;
    use crate::triangle::Vertex;
    use approx::assert_relative_eq;

    pub(crate) fn context<'a>(
        lights: &'a [PointLight],
        materials: &'a [Material],
        config: &'a RenderConfig,
    ) -> ShadingContext<'a> {
        ShadingContext {
            eye: Vec3::new(0.0, 0.0, -5.0),
            lights,
            ambient: Vec3::splat(0.1),
            materials,
            environment: None,
            shadows: None,
            config,
        }
    }

    fn facing_triangle() -> Triangle {
        Triangle::new(
            [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]
                .map(|(x, y)| Vertex::new(Vec3::new(x, y, 0.5), -Vec3::FORWARD, Vec2::ZERO)),
        )
    }

    #[test]
    fn depth_only_is_gray_depth() {
        let config = RenderConfig::default();
        let shader = SurfaceShader::new(RenderMode::DepthOnly, context(&[], &[], &config));
        let t = facing_triangle();
        let f = Fragment::new(0, 0, [1.0, 0.0, 0.0], &t);
        assert_eq!(shader.shade(&t, &f), gray(0.5));
    }

    #[test]
    fn debug_normals_encode_the_normal() {
        let config = RenderConfig {
            debug_normals: true,
            ..RenderConfig::default()
        };
        let shader = SurfaceShader::new(RenderMode::MaterialMapped, context(&[], &[], &config));
        let t = facing_triangle();
        let f = Fragment::new(3, 3, [0.4, 0.3, 0.3], &t);
        let c = unpack_color(shader.shade(&t, &f));
        assert_relative_eq!(c, Vec3::new(0.5, 0.5, 0.0), epsilon = 1e-2);
    }

    #[test]
    fn flat_mode_fills_a_face_with_one_colour() {
        let config = RenderConfig::default();
        let lights = [PointLight::white(Vec3::new(5.0, 8.0, -10.0))];
        let shader = SurfaceShader::new(RenderMode::Flat, context(&lights, &[], &config));
        let t = facing_triangle();
        let colours: Vec<u32> = [[1.0, 0.0, 0.0], [0.2, 0.5, 0.3], [0.0, 0.1, 0.9]]
            .iter()
            .zip([(0, 0), (4, 2), (1, 8)])
            .map(|(&w, (x, y))| shader.shade(&t, &Fragment::new(x, y, w, &t)))
            .collect();
        assert!(colours.iter().all(|&c| c == colours[0]));
        assert_eq!(colours[0], gray(phong::flat_intensity(&lights, &t)));
        assert_ne!(colours[0], gray(phong::FLAT_BASE));
    }

    #[test]
    fn minimum_composition_ignores_shadow_without_maps() {
        let config = RenderConfig::default();
        let ctx = context(&[], &[], &config);
        let out = ctx.compose(Vec3::splat(0.1), [(Vec3::splat(0.5), 1.0)].into_iter());
        assert_relative_eq!(out, Vec3::splat(0.6));
    }

    #[test]
    fn per_light_composition_darkens_each_light() {
        let mut config = RenderConfig::default();
        config.shadows.composition = ShadowComposition::PerLight;
        let ctx = context(&[], &[], &config);
        let out = ctx.compose(
            Vec3::ZERO,
            [(Vec3::splat(0.4), 1.0), (Vec3::splat(0.2), 0.5)].into_iter(),
        );
        assert_relative_eq!(out, Vec3::splat(0.1));
    }
}
