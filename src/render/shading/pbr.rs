//! Cook-Torrance microfacet shading.
//!
//! Per light, with `H` the half vector between view and light directions:
//!
//! ```text
//! F  = F0 + (1 - F0) * (1 - H·V)^5                  Schlick, F0 = lerp(0.04, albedo, metallic)
//! D  = a² / (π * ((N·H)² * (a² - 1) + 1)²)          GGX, a = roughness²
//! G  = G1(N·V) * G1(N·L),  G1(x) = x / (x(1 - k) + k),  k = (roughness + 1)² / 8
//! Lo += ((1 - F)(1 - metallic) * albedo / π + DGF / (4 (N·V)(N·L) + ε)) * radiance * N·L
//! ```
//!
//! The sum is tone mapped with Reinhard `c / (c + 1)` and gamma corrected.

use std::f32::consts::PI;

use super::{ShadingContext, Surface};
use crate::math::Vec3;
use crate::triangle::Triangle;

const DENOMINATOR_EPSILON: f32 = 0.001;
const DIELECTRIC_F0: f32 = 0.04;

/// Roughness used when a triangle has no material.
const DEFAULT_ROUGHNESS: f32 = 0.5;

pub fn fresnel_schlick(cos_theta: f32, f0: Vec3) -> Vec3 {
    f0 + (Vec3::ONE - f0) * (1.0 - cos_theta).clamp(0.0, 1.0).powi(5)
}

pub fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * denom * denom)
}

fn geometry_schlick_ggx(n_dot_x: f32, k: f32) -> f32 {
    n_dot_x / (n_dot_x * (1.0 - k) + k)
}

pub fn geometry_smith(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    let r = roughness + 1.0;
    let k = r * r / 8.0;
    geometry_schlick_ggx(n_dot_v, k) * geometry_schlick_ggx(n_dot_l, k)
}

/// Reinhard tone map followed by `pow(c, 1 / gamma)`.
pub fn tone_map(color: Vec3, gamma: f32) -> Vec3 {
    let inv_gamma = 1.0 / gamma.max(f32::EPSILON);
    color
        .map(|c| c.max(0.0))
        .map(|c| c / (c + 1.0))
        .map(|c| c.powf(inv_gamma))
}

/// Display colour of a PBR fragment, after tone mapping.
pub fn shade(ctx: &ShadingContext, triangle: &Triangle, surface: &Surface, normal: Vec3) -> Vec3 {
    let uv = surface.uv;
    let (albedo, roughness, metallic) = match ctx.material(triangle) {
        Some(m) => (m.diffuse_at(uv), m.roughness_at(uv), m.metallic_at(uv)),
        None => (surface.color, DEFAULT_ROUGHNESS, 0.0),
    };
    let pbr = &ctx.config.pbr;

    let v = (ctx.eye - surface.position).normalize();
    let n_dot_v = normal.dot(v).max(0.0);
    let f0 = Vec3::splat(DIELECTRIC_F0).lerp(albedo, metallic);

    let lights = ctx.lights.iter().enumerate().map(|(i, light)| {
        let l = light.direction_from(surface.position);
        let h = (l + v).normalize();
        let n_dot_l = normal.dot(l).max(0.0);
        let radiance = light.color * light.attenuation(surface.position, pbr.attenuation_scale);

        let f = fresnel_schlick(h.dot(v).max(0.0), f0);
        let d = distribution_ggx(normal.dot(h).max(0.0), roughness);
        let g = geometry_smith(n_dot_v, n_dot_l, roughness);
        let specular = f * (d * g) / (4.0 * n_dot_v * n_dot_l + DENOMINATOR_EPSILON);
        let k_d = (Vec3::ONE - f) * (1.0 - metallic);

        let direct = (k_d * albedo / PI + specular) * radiance * n_dot_l;
        (direct, ctx.shadow(i, surface.position, normal))
    });

    let ambient = albedo * pbr.ambient;
    tone_map(ctx.compose(ambient, lights), pbr.gamma)
}
