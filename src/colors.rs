//! Packed ARGB colour helpers.
//!
//! Pixels are stored as `0xAARRGGBB`. Shading works in linear `[0, 1]` RGB
//! held in a [`Vec3`] and is packed only when written to a framebuffer.

use crate::math::Vec3;

pub const BLACK: u32 = 0xFF000000;
pub const WHITE: u32 = 0xFFFFFFFF;

/// Packs clamped RGB into an opaque ARGB pixel.
#[inline]
pub fn pack_color(c: Vec3) -> u32 {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
    0xFF000000 | (channel(c.x) << 16) | (channel(c.y) << 8) | channel(c.z)
}

/// Unpacks an ARGB pixel into RGB, ignoring alpha.
#[inline]
pub fn unpack_color(pixel: u32) -> Vec3 {
    let channel = |shift: u32| ((pixel >> shift) & 0xFF) as f32 / 255.0;
    Vec3::new(channel(16), channel(8), channel(0))
}

/// Opaque grey of the given intensity.
#[inline]
pub fn gray(intensity: f32) -> u32 {
    pack_color(Vec3::splat(intensity))
}

/// Average of a block of pixels, used when resolving supersampled frames.
pub fn average(pixels: impl Iterator<Item = u32>) -> u32 {
    let (sum, count) = pixels.fold((Vec3::ZERO, 0u32), |(sum, n), p| {
        (sum + unpack_color(p), n + 1)
    });
    if count == 0 {
        return BLACK;
    }
    pack_color(sum / count as f32)
}
