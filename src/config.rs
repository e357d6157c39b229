//! Renderer configuration.
//!
//! [`RenderConfig`] gathers every tunable of a frame. It deserializes from
//! JSON with per-field defaults, so a config file only needs the values it
//! changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::colors;
use crate::render::{RasterizerType, RenderMode};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io problem while reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("format problem while parsing config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How per-light shadow factors combine into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShadowComposition {
    /// The least shadowed light decides.
    #[default]
    Minimum,
    /// Each light's contribution is darkened by its own factor.
    PerLight,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub enabled: bool,
    /// Width and height of each light's shadow map.
    pub resolution: u32,
    /// Bias at grazing angles, scaled by `1 - N·L`.
    pub bias_scale: f32,
    /// Lower bound of the bias.
    pub bias_min: f32,
    /// Half-width of the PCF kernel; 1 samples a 3x3 block.
    pub pcf_radius: u32,
    pub composition: ShadowComposition,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            resolution: 2048,
            bias_scale: 0.05,
            bias_min: 0.005,
            pcf_radius: 1,
            composition: ShadowComposition::Minimum,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PbrConfig {
    /// Ambient term as a fraction of albedo.
    pub ambient: f32,
    /// Distance unit for inverse-square falloff.
    pub attenuation_scale: f32,
    /// Display gamma applied after tone mapping.
    pub gamma: f32,
}

impl Default for PbrConfig {
    fn default() -> Self {
        Self {
            ambient: 0.03,
            attenuation_scale: 50.0,
            gamma: 2.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub render_mode: RenderMode,
    pub rasterizer: RasterizerType,
    /// Framebuffer rows owned by one raster worker.
    pub band_height: u32,
    /// Integer supersampling factor; 1 disables it.
    pub supersample: u32,
    pub background_color: u32,
    pub wireframe_color: u32,
    pub backface_culling: bool,
    /// Output shading normals as colours instead of lighting.
    pub debug_normals: bool,
    pub shadows: ShadowConfig,
    pub pbr: PbrConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::default(),
            rasterizer: RasterizerType::default(),
            band_height: 16,
            supersample: 1,
            background_color: colors::BLACK,
            wireframe_color: colors::WHITE,
            backface_culling: true,
            debug_normals: false,
            shadows: ShadowConfig::default(),
            pbr: PbrConfig::default(),
        }
    }
}

impl RenderConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// `band_height` clamped to at least one row.
    pub fn band_rows(&self) -> u32 {
        self.band_height.max(1)
    }

    pub fn supersample_factor(&self) -> u32 {
        self.supersample.clamp(1, 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = RenderConfig::from_json_str("{}").expect("empty object parses");
        assert_eq!(config, RenderConfig::default());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config = RenderConfig::from_json_str(
            r#"{ "render_mode": "Pbr", "shadows": { "enabled": true, "pcf_radius": 2 } }"#,
        )
        .expect("valid config");
        assert_eq!(config.render_mode, RenderMode::Pbr);
        assert!(config.shadows.enabled);
        assert_eq!(config.shadows.pcf_radius, 2);
        assert_eq!(config.shadows.resolution, 2048);
        assert_eq!(config.band_height, 16);
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        assert!(matches!(
            RenderConfig::from_json_str("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            RenderConfig::from_json_file("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
