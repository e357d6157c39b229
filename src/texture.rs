use std::path::Path;

use crate::colors;
use crate::render::framebuffer::pixel_count;
use crate::math::{Vec2, Vec3};

/// A 2D map of normalized RGB texels.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    data: Vec<Vec3>, // Row-major, top row first.
    width: u32,
    height: u32,
}

impl Texture {
    /// Load a texture from an image file (PNG, JPG, etc.)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, image::ImageError> {
        let img = image::open(path)?.to_rgb32f();
        let (width, height) = img.dimensions();
        let data = img
            .pixels()
            .map(|p| {
                let [r, g, b] = p.0;
                Vec3::new(r, g, b)
            })
            .collect();

        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Builds a texture from packed ARGB pixels. Returns `None` if the
    /// slice length does not match the dimensions.
    pub fn from_argb(width: u32, height: u32, pixels: &[u32]) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != pixel_count(width, height) {
            return None;
        }
        Some(Self {
            data: pixels.iter().map(|&p| colors::unpack_color(p)).collect(),
            width,
            height,
        })
    }

    /// One-texel texture of a constant colour.
    pub fn solid(color: Vec3) -> Self {
        Self {
            data: vec![color],
            width: 1,
            height: 1,
        }
    }

    /// Sample the texture at UV coordinates using nearest-neighbour lookup.
    ///
    /// UVs are clamped to `[0, 1]`. V is flipped because OBJ coordinates
    /// have a bottom-left origin while texels are stored top row first.
    #[inline]
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        let u = uv.x.clamp(0.0, 1.0);
        let v = 1.0 - uv.y.clamp(0.0, 1.0);

        let x = ((u * (self.width - 1) as f32) as u32).min(self.width - 1);
        let y = ((v * (self.height - 1) as f32) as u32).min(self.height - 1);

        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Texture {
        // Top row: red, green. Bottom row: blue, white.
        Texture::from_argb(2, 2, &[0xFFFF0000, 0xFF00FF00, 0xFF0000FF, 0xFFFFFFFF])
            .expect("dimensions match")
    }

    #[test]
    fn sample_flips_v() {
        let t = checker();
        assert_eq!(t.sample(Vec2::new(0.0, 1.0)), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(t.sample(Vec2::new(0.0, 0.0)), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn sample_clamps_outside_unit_square() {
        let t = checker();
        assert_eq!(t.sample(Vec2::new(5.0, -3.0)), Vec3::ONE);
        assert_eq!(t.sample(Vec2::new(-1.0, 2.0)), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn from_argb_rejects_wrong_length() {
        assert!(Texture::from_argb(2, 2, &[0; 3]).is_none());
    }
}
