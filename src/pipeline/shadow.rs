//! Shadow maps.
//!
//! Each light gets a depth-only render of the world-space triangles from
//! its own point of view: a look-at toward the centre of the scene bounds
//! followed by an orthographic projection that encloses the bounding sphere
//! and a square viewport of `resolution` pixels.
//!
//! A fragment is tested by reprojecting its world position into the light's
//! map and comparing against a `(2r + 1)²` neighbourhood (PCF). The bias
//! grows at grazing angles:
//!
//! ```text
//! bias   = max(bias_scale * (1 - N·L), bias_min)
//! factor = |{ samples : depth - bias > stored }| / samples
//! ```
//!
//! Samples falling outside the map count as lit.

use rayon::prelude::*;

use super::rasterize;
use crate::clipper::{clip_triangles, Plane};
use crate::colors;
use crate::config::ShadowConfig;
use crate::light::PointLight;
use crate::math::{Mat4, Vec3, Vec4};
use crate::render::framebuffer::FrameBuffer;
use crate::render::rasterizer::{FlatShader, Rasterizer};
use crate::triangle::Triangle;

/// Closest the light box's near plane may come to the light.
pub const MIN_NEAR: f32 = 1e-3;

/// Bounding sphere of a triangle list, from its world-space box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub radius: f32,
}

impl Bounds {
    pub fn of(triangles: &[Triangle]) -> Option<Self> {
        let mut corners = triangles.iter().flat_map(|t| t.vertices.iter().map(|v| v.world));
        let first = corners.next()?;
        let (min, max) = corners.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self {
            center: (min + max) * 0.5,
            radius: ((max - min).magnitude() * 0.5).max(1e-3),
        })
    }
}

/// Depth map of the scene as seen from one light.
#[derive(Debug, Clone)]
pub struct ShadowMap {
    matrix: Mat4,
    depth: FrameBuffer,
}

impl ShadowMap {
    /// View matrix, near distance and projection-viewport of the light box
    /// around `bounds`.
    ///
    /// The near distance never drops below [`MIN_NEAR`], so geometry behind
    /// a light placed inside the bounds cannot cast into the map.
    fn frame(light: &PointLight, bounds: &Bounds, resolution: u32) -> (Mat4, f32, Mat4) {
        let to_center = bounds.center - light.position;
        let up = if to_center.normalize().cross(Vec3::UP).magnitude() < 1e-3 {
            Vec3::FORWARD
        } else {
            Vec3::UP
        };
        let eye = if to_center.magnitude() > f32::EPSILON {
            light.position
        } else {
            bounds.center - Vec3::UP * bounds.radius * 2.0
        };
        let distance = (bounds.center - eye).magnitude();

        let view = Mat4::look_at_lh(eye, bounds.center, up);
        let r = bounds.radius * 1.01;
        let near = (distance - r).max(MIN_NEAR);
        let far = (distance + r).max(near + MIN_NEAR);
        let size = resolution as f32;
        let projection_viewport =
            Mat4::orthographic_lh(r, r, near, far) * Mat4::viewport(0.0, 0.0, size, size);
        (view, near, projection_viewport)
    }

    /// World to shadow-map pixels for `light`.
    pub fn light_matrix(light: &PointLight, bounds: &Bounds, resolution: u32) -> Mat4 {
        let (view, _, projection_viewport) = Self::frame(light, bounds, resolution);
        view * projection_viewport
    }

    /// Renders world-space `triangles` into a new map for `light`.
    ///
    /// Triangles are clipped at the light's near plane before projection.
    pub fn render<R: Rasterizer + Sync>(
        light: &PointLight,
        triangles: &[Triangle],
        bounds: &Bounds,
        config: &ShadowConfig,
        rasterizer: &R,
        rows: u32,
    ) -> Self {
        let resolution = config.resolution.max(1);
        let (view, near, projection_viewport) = Self::frame(light, bounds, resolution);
        let light_view: Vec<Triangle> = triangles
            .par_iter()
            .map(|t| {
                t.map_vertices(|v| {
                    let mut v = *v;
                    v.position = Vec4::from_vec3(v.world, 1.0) * view;
                    v
                })
            })
            .collect();
        let near_plane = Plane::new(Vec3::new(0.0, 0.0, near), Vec3::FORWARD);
        let light_space: Vec<Triangle> = clip_triangles(&near_plane, &light_view)
            .into_par_iter()
            .map(|t| {
                t.map_vertices(|v| {
                    let mut v = *v;
                    v.position = (v.position * projection_viewport).perspective_divide();
                    v.inv_w = 1.0;
                    v
                })
            })
            .collect();

        let mut depth = FrameBuffer::new(resolution, resolution);
        let dropped = rasterize(
            &light_space,
            &mut depth,
            rows,
            rasterizer,
            &FlatShader::new(colors::WHITE),
        );
        if dropped > 0 {
            log::warn!("shadow pass dropped {dropped} out-of-range writes");
        }
        Self {
            matrix: view * projection_viewport,
            depth,
        }
    }

    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    pub fn depth(&self) -> &FrameBuffer {
        &self.depth
    }

    /// Fraction of PCF samples around `position` that are occluded.
    pub fn factor(
        &self,
        position: Vec3,
        normal: Vec3,
        to_light: Vec3,
        config: &ShadowConfig,
    ) -> f32 {
        let p = self.matrix.transform_point(position);
        let bias = (config.bias_scale * (1.0 - normal.dot(to_light))).max(config.bias_min);
        let radius = config.pcf_radius as i32;
        let (cx, cy) = (p.x.round() as i32, p.y.round() as i32);

        let mut occluded = 0u32;
        let mut samples = 0u32;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                samples += 1;
                if let Some(stored) = self.depth.depth_at(cx + dx, cy + dy) {
                    if p.z - bias > stored {
                        occluded += 1;
                    }
                }
            }
        }
        occluded as f32 / samples as f32
    }
}

/// One shadow map per light, in light order.
#[derive(Debug, Clone)]
pub struct ShadowSet {
    maps: Vec<ShadowMap>,
}

impl ShadowSet {
    /// Builds a map for every light. Returns `None` for an empty scene.
    pub fn build<R: Rasterizer + Sync>(
        lights: &[PointLight],
        triangles: &[Triangle],
        config: &ShadowConfig,
        rasterizer: &R,
        rows: u32,
    ) -> Option<Self> {
        let bounds = Bounds::of(triangles)?;
        let maps = lights
            .par_iter()
            .map(|light| ShadowMap::render(light, triangles, &bounds, config, rasterizer, rows))
            .collect();
        log::info!(
            "built {} shadow maps at {}x{}",
            lights.len(),
            config.resolution,
            config.resolution
        );
        Some(Self { maps })
    }

    pub fn maps(&self) -> &[ShadowMap] {
        &self.maps
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Shadow factor of light `index`; 0 when it has no map.
    pub fn factor(
        &self,
        index: usize,
        position: Vec3,
        normal: Vec3,
        to_light: Vec3,
        config: &ShadowConfig,
    ) -> f32 {
        self.maps
            .get(index)
            .map_or(0.0, |map| map.factor(position, normal, to_light, config))
    }
}

/// Inputs that invalidate cached shadow maps when they change.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowKey {
    pub model: Mat4,
    pub lights: Vec<Vec3>,
    pub config: ShadowConfig,
    pub triangles: usize,
}

impl ShadowKey {
    pub fn new(model: Mat4, lights: &[PointLight], config: ShadowConfig, triangles: usize) -> Self {
        Self {
            model,
            lights: lights.iter().map(|l| l.position).collect(),
            config,
            triangles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;
    use crate::render::rasterizer::{RasterizerDispatcher, RasterizerType};
    use crate::triangle::Vertex;

    /// Horizontal square of half-size `s` at height `y`, facing up.
    fn quad(s: f32, y: f32) -> [Triangle; 2] {
        let v = |x: f32, z: f32| Vertex::new(Vec3::new(x, y, z), Vec3::UP, Vec2::ZERO);
        [
            Triangle::new([v(-s, -s), v(s, -s), v(s, s)]),
            Triangle::new([v(-s, -s), v(s, s), v(-s, s)]),
        ]
    }

    fn scene() -> (Vec<Triangle>, PointLight, ShadowConfig) {
        let mut triangles = quad(5.0, 0.0).to_vec();
        triangles.extend(quad(2.0, 5.0));
        let config = ShadowConfig {
            enabled: true,
            resolution: 256,
            ..ShadowConfig::default()
        };
        (triangles, PointLight::white(Vec3::new(0.0, 10.0, 0.0)), config)
    }

    fn factor_at(point: Vec3) -> f32 {
        let (triangles, light, config) = scene();
        let rasterizer = RasterizerDispatcher::new(RasterizerType::EdgeFunction);
        let set = ShadowSet::build(&[light], &triangles, &config, &rasterizer, 16)
            .unwrap_or_else(|| panic!("scene has triangles"));
        set.factor(0, point, Vec3::UP, light.direction_from(point), &config)
    }

    #[test]
    fn bounds_enclose_the_scene() {
        let (triangles, _, _) = scene();
        let bounds = Bounds::of(&triangles).unwrap_or_else(|| panic!("non-empty"));
        assert!((bounds.center.y - 2.5).abs() < 1e-5);
        assert!(bounds.radius >= 7.5 - 1e-3);
        assert!(Bounds::of(&[]).is_none());
    }

    #[test]
    fn ground_under_the_occluder_is_fully_shadowed() {
        assert_eq!(factor_at(Vec3::new(0.0, 0.0, 0.0)), 1.0);
    }

    #[test]
    fn open_ground_is_lit() {
        assert_eq!(factor_at(Vec3::new(4.0, 0.0, 4.0)), 0.0);
    }

    #[test]
    fn occluder_top_is_lit() {
        assert_eq!(factor_at(Vec3::new(0.5, 5.0, 0.5)), 0.0);
    }

    #[test]
    fn factor_is_always_a_fraction() {
        for i in -10..=10 {
            let f = factor_at(Vec3::new(i as f32 * 0.5, 0.0, 0.3));
            assert!((0.0..=1.0).contains(&f));
        }
    }

    #[test]
    fn geometry_behind_a_light_inside_the_scene_casts_nothing() {
        // Light between the ground and the occluder, so the occluder sits
        // behind it and the near distance would otherwise go negative.
        let (triangles, _, config) = scene();
        let light = PointLight::white(Vec3::new(0.0, 3.0, 0.0));
        let rasterizer = RasterizerDispatcher::new(RasterizerType::EdgeFunction);
        let set = ShadowSet::build(&[light], &triangles, &config, &rasterizer, 16)
            .unwrap_or_else(|| panic!("scene has triangles"));
        let ground = Vec3::ZERO;
        let factor = set.factor(0, ground, Vec3::UP, light.direction_from(ground), &config);
        assert_eq!(factor, 0.0);
    }

    #[test]
    fn outside_the_map_counts_as_lit() {
        assert_eq!(factor_at(Vec3::new(100.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn key_changes_with_light_position() {
        let (_, light, config) = scene();
        let a = ShadowKey::new(Mat4::identity(), &[light], config, 4);
        let moved = PointLight::white(Vec3::new(1.0, 10.0, 0.0));
        assert_ne!(a, ShadowKey::new(Mat4::identity(), &[moved], config, 4));
        assert_eq!(a, ShadowKey::new(Mat4::identity(), &[light], config, 4));
    }
}
