//! Per-pixel Phong shading driven by material texture maps.
//!
//! Every channel is sampled at the fragment's UV and falls back to the
//! material constant when its map is missing. Triangles without a material
//! use their interpolated vertex colour as a plain white-specular surface.
//!
//! # Normal Mapping
//!
//! A normal-map sample is in tangent space. It is lifted to world space by
//! the triangle's TBN basis:
//!
//! ```text
//! n_world = normalize(T * n.x + B * n.y + N * n.z)
//! ```
//!
//! where T and B come from [`crate::triangle::TangentBasis`] and N is the
//! interpolated vertex normal.
//!
//! # Environment Reflection
//!
//! The view ray reflected about the normal, `R`, indexes a sphere map:
//!
//! ```text
//! m  = 2 * sqrt(R.x² + R.y² + (R.z + 1)²)
//! uv = (R.x / m + 0.5, R.y / m + 0.5)
//! ```
//!
//! and the environment sample is blended in by the reflection map's
//! intensity.

use super::phong::{self, PhongSurface};
use super::{ShadingContext, Surface};
use crate::math::{Vec2, Vec3};
use crate::texture::Texture;
use crate::triangle::Triangle;

/// Interpolated normal, perturbed by the material's normal map when the
/// triangle has both a normal map and a tangent basis.
pub fn shading_normal(ctx: &ShadingContext, triangle: &Triangle, surface: &Surface) -> Vec3 {
    let mapped = ctx
        .material(triangle)
        .and_then(|m| m.normal_at(surface.uv))
        .zip(triangle.tangents);
    match mapped {
        Some((n, basis)) => {
            let lifted = basis.tangent * n.x + basis.bitangent * n.y + surface.normal * n.z;
            let lifted = lifted.normalize();
            if lifted == Vec3::ZERO {
                surface.normal
            } else {
                lifted
            }
        }
        None => surface.normal,
    }
}

/// Sphere-map coordinates of a reflection direction.
pub fn sphere_map_uv(r: Vec3) -> Vec2 {
    let m = 2.0 * (r.x * r.x + r.y * r.y + (r.z + 1.0) * (r.z + 1.0)).sqrt();
    if m <= f32::EPSILON {
        return Vec2::new(0.5, 0.5);
    }
    Vec2::new(r.x / m + 0.5, r.y / m + 0.5)
}

fn reflect_environment(environment: &Texture, eye: Vec3, surface: &Surface, normal: Vec3) -> Vec3 {
    let e = (eye - surface.position).normalize();
    environment.sample(sphere_map_uv(e.reflect(normal)))
}

/// Lit linear colour of a material-mapped fragment.
pub fn shade(ctx: &ShadingContext, triangle: &Triangle, surface: &Surface, normal: Vec3) -> Vec3 {
    let material = ctx.material(triangle);
    let uv = surface.uv;
    let reflectance = match material {
        Some(m) => PhongSurface {
            ambient: m.ambient_at(uv) * m.diffuse_at(uv),
            diffuse: m.diffuse_at(uv),
            specular: m.specular_at(uv),
            shininess: m.shininess_at(uv),
        },
        None => PhongSurface {
            specular: Vec3::ONE,
            ..PhongSurface::uniform(surface.color, 60.0)
        },
    };

    // The ambient term does not depend on the light, so its per-light sum
    // is known up front and the direct terms can stream into `compose`.
    let ambient = reflectance.ambient * ctx.ambient * ctx.lights.len() as f32;
    let direct = ctx.lights.iter().enumerate().map(|(i, light)| {
        let (_, d) = phong::evaluate(
            light,
            &reflectance,
            surface.position,
            normal,
            ctx.eye,
            ctx.ambient,
        );
        (d, ctx.shadow(i, surface.position, normal))
    });
    let color = ctx.compose(ambient, direct);

    let strength = material.and_then(|m| m.reflection_at(uv)).map(|r| r.x);
    match (ctx.environment, strength) {
        (Some(env), Some(s)) => {
            color.lerp(reflect_environment(env, ctx.eye, surface, normal), s.clamp(0.0, 1.0))
        }
        _ => color,
    }
}
