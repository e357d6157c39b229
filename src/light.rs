//! Lighting types for the renderer.

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// A point light with a linear RGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
}

impl PointLight {
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self { position, color }
    }

    pub fn white(position: Vec3) -> Self {
        Self::new(position, Vec3::ONE)
    }

    /// Unit vector from `point` toward the light.
    pub fn direction_from(&self, point: Vec3) -> Vec3 {
        (self.position - point).normalize()
    }

    /// Lambert factor `max(N·L, 0)` for a surface at `point`.
    pub fn lambert(&self, point: Vec3, normal: Vec3) -> f32 {
        normal.normalize().dot(self.direction_from(point)).max(0.0)
    }

    /// Inverse-square falloff with distances measured in units of `scale`.
    pub fn attenuation(&self, point: Vec3, scale: f32) -> f32 {
        let d = (self.position - point).magnitude() / scale.max(f32::EPSILON);
        1.0 / (d * d).max(1e-4)
    }
}
