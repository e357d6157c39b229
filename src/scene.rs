//! Camera and lighting shared by every frame.

use crate::camera::Camera;
use crate::light::PointLight;
use crate::math::Vec3;
use crate::texture::Texture;

#[derive(Debug, Clone)]
pub struct Scene {
    pub camera: Camera,
    pub lights: Vec<PointLight>,
    /// Background light intensity, used as the ambient term.
    pub background: Vec3,
    /// Sphere map sampled by reflective materials.
    pub environment: Option<Texture>,
}

impl Default for Scene {
    /// Camera at z = -5 looking at the origin, one white light above and
    /// behind it.
    fn default() -> Self {
        Self {
            camera: Camera::looking_at(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO),
            lights: vec![PointLight::white(Vec3::new(5.0, 8.0, -10.0))],
            background: Vec3::splat(0.1),
            environment: None,
        }
    }
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            ..Self::default()
        }
    }

    pub fn with_light(mut self, light: PointLight) -> Self {
        self.lights.push(light);
        self
    }

    pub fn with_lights(mut self, lights: Vec<PointLight>) -> Self {
        self.lights = lights;
        self
    }

    pub fn with_background(mut self, background: Vec3) -> Self {
        self.background = background;
        self
    }

    pub fn with_environment(mut self, environment: Texture) -> Self {
        self.environment = Some(environment);
        self
    }
}
