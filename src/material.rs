//! Surface materials.
//!
//! Every channel has a scalar value and an optional texture map. Lookups
//! sample the map when present and fall back to the scalar otherwise.

use crate::math::{Vec2, Vec3};
use crate::texture::Texture;

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    /// Specular exponent (`Ns`), typically 0 to 1000.
    pub shininess: f32,
    /// Opacity (`d`); 1.0 is fully opaque.
    pub dissolve: f32,
    /// Index of refraction (`Ni`).
    pub optical_density: f32,
    pub illumination_model: u8,
    /// Metalness used when no reflection map is present.
    pub metallic: f32,
    pub ambient_map: Option<Texture>,
    pub diffuse_map: Option<Texture>,
    pub specular_map: Option<Texture>,
    pub shininess_map: Option<Texture>,
    pub dissolve_map: Option<Texture>,
    pub normal_map: Option<Texture>,
    pub reflection_map: Option<Texture>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::from("default"),
            ambient: Vec3::ONE,
            diffuse: Vec3::ONE,
            specular: Vec3::ONE,
            shininess: 60.0,
            dissolve: 1.0,
            optical_density: 1.0,
            illumination_model: 2,
            metallic: 0.0,
            ambient_map: None,
            diffuse_map: None,
            specular_map: None,
            shininess_map: None,
            dissolve_map: None,
            normal_map: None,
            reflection_map: None,
        }
    }
}

fn sample_or(map: &Option<Texture>, uv: Vec2, fallback: Vec3) -> Vec3 {
    map.as_ref().map_or(fallback, |t| t.sample(uv))
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn ambient_at(&self, uv: Vec2) -> Vec3 {
        sample_or(&self.ambient_map, uv, self.ambient)
    }

    pub fn diffuse_at(&self, uv: Vec2) -> Vec3 {
        sample_or(&self.diffuse_map, uv, self.diffuse)
    }

    pub fn specular_at(&self, uv: Vec2) -> Vec3 {
        sample_or(&self.specular_map, uv, self.specular)
    }

    /// Specular exponent, scaled by the red channel of the shininess map.
    pub fn shininess_at(&self, uv: Vec2) -> f32 {
        self.shininess_map
            .as_ref()
            .map_or(self.shininess, |t| t.sample(uv).x * self.shininess)
    }

    pub fn dissolve_at(&self, uv: Vec2) -> f32 {
        self.dissolve_map
            .as_ref()
            .map_or(self.dissolve, |t| t.sample(uv).x * self.dissolve)
    }

    /// Tangent-space normal decoded from `[0, 1]` to `[-1, 1]`.
    pub fn normal_at(&self, uv: Vec2) -> Option<Vec3> {
        self.normal_map
            .as_ref()
            .map(|t| t.sample(uv).map(|c| c * 2.0 - 1.0))
    }

    pub fn reflection_at(&self, uv: Vec2) -> Option<Vec3> {
        self.reflection_map.as_ref().map(|t| t.sample(uv))
    }

    /// Microfacet roughness in `[0.05, 1]`.
    ///
    /// Taken from the shininess map directly when present, otherwise derived
    /// from the specular exponent as `sqrt(2 / (Ns + 2))`.
    pub fn roughness_at(&self, uv: Vec2) -> f32 {
        let roughness = match &self.shininess_map {
            Some(map) => map.sample(uv).x,
            None => (2.0 / (self.shininess.max(0.0) + 2.0)).sqrt(),
        };
        roughness.clamp(0.05, 1.0)
    }

    pub fn metallic_at(&self, uv: Vec2) -> f32 {
        self.reflection_at(uv)
            .map_or(self.metallic, |r| r.x)
            .clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn missing_maps_fall_back_to_scalars() {
        let mut m = Material::new("plain");
        m.diffuse = Vec3::new(0.2, 0.4, 0.6);
        assert_eq!(m.diffuse_at(Vec2::new(0.3, 0.9)), m.diffuse);
        assert_eq!(m.shininess_at(Vec2::ZERO), 60.0);
        assert!(m.normal_at(Vec2::ZERO).is_none());
    }

    #[test]
    fn maps_override_scalars() {
        let mut m = Material::new("mapped");
        m.diffuse_map = Some(Texture::solid(Vec3::new(1.0, 0.0, 0.0)));
        m.normal_map = Some(Texture::solid(Vec3::new(0.5, 0.5, 1.0)));
        assert_eq!(m.diffuse_at(Vec2::ZERO), Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(
            m.normal_at(Vec2::ZERO).unwrap_or(Vec3::ZERO),
            Vec3::new(0.0, 0.0, 1.0)
        );
    }

    #[test]
    fn dissolve_map_scales_opacity() {
        let mut m = Material::new("glass");
        m.dissolve = 0.8;
        assert_eq!(m.dissolve_at(Vec2::ZERO), 0.8);
        m.dissolve_map = Some(Texture::solid(Vec3::splat(0.5)));
        assert_relative_eq!(m.dissolve_at(Vec2::ZERO), 0.4);
    }

    #[test]
    fn roughness_decreases_with_shininess() {
        let mut dull = Material::default();
        dull.shininess = 2.0;
        let mut glossy = Material::default();
        glossy.shininess = 500.0;
        assert!(dull.roughness_at(Vec2::ZERO) > glossy.roughness_at(Vec2::ZERO));
        assert_relative_eq!(dull.roughness_at(Vec2::ZERO), 1.0);
    }
}
