//! Phong reflection: ambient, Lambert diffuse and mirror-reflection specular.

use super::ShadingContext;
use crate::light::PointLight;
use crate::math::Vec3;
use crate::triangle::Triangle;

/// Surface reflectance for one Phong evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhongSurface {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
}

impl PhongSurface {
    /// Single albedo for every term.
    pub fn uniform(albedo: Vec3, shininess: f32) -> Self {
        Self {
            ambient: albedo,
            diffuse: albedo,
            specular: albedo,
            shininess,
        }
    }
}

/// Ambient and direct (diffuse + specular) light from one point light.
///
/// Diffuse and specular are each clamped to `[0, 1]`.
pub fn evaluate(
    light: &PointLight,
    surface: &PhongSurface,
    position: Vec3,
    normal: Vec3,
    eye: Vec3,
    background: Vec3,
) -> (Vec3, Vec3) {
    let l = light.direction_from(position);
    let e = (eye - position).normalize();
    let r = l.reflect(normal).normalize();

    let ambient = surface.ambient * background;
    let diffuse = (surface.diffuse * light.color * normal.dot(l).max(0.0)).clamp01();
    let specular = if normal.dot(l) > 0.0 {
        (surface.specular * light.color * r.dot(e).max(0.0).powf(surface.shininess)).clamp01()
    } else {
        Vec3::ZERO
    };
    (ambient, diffuse + specular)
}

/// Lit colour of one vertex: the per-light sum of ambient, diffuse and
/// specular terms. The albedo comes from the material's diffuse colour when
/// the triangle has one, otherwise from the vertex colour.
pub fn light_vertex(
    ctx: &ShadingContext,
    triangle: &Triangle,
    position: Vec3,
    normal: Vec3,
    color: Vec3,
) -> Vec3 {
    let surface = match ctx.material(triangle) {
        Some(m) => PhongSurface {
            ambient: m.diffuse,
            diffuse: m.diffuse,
            specular: m.specular,
            shininess: m.shininess,
        },
        None => PhongSurface::uniform(color, 60.0),
    };
    let normal = normal.normalize();
    ctx.lights.iter().fold(Vec3::ZERO, |acc, light| {
        let (ambient, direct) = evaluate(light, &surface, position, normal, ctx.eye, ctx.ambient);
        acc + ambient + direct
    })
}

/// Base brightness of flat-shaded faces.
pub const FLAT_BASE: f32 = 0.05;

/// Grey level of a whole face: [`FLAT_BASE`] plus one Lambert term per
/// light, taken from the averaged vertex normal at the centroid and capped
/// at 1.
pub fn flat_intensity(lights: &[PointLight], triangle: &Triangle) -> f32 {
    let v = &triangle.vertices;
    let normal = (v[0].normal + v[1].normal + v[2].normal) / 3.0;
    let center = (v[0].world + v[1].world + v[2].world) / 3.0;
    lights
        .iter()
        .fold(FLAT_BASE, |acc, light| acc + light.lambert(center, normal))
        .min(1.0)
}
