//! Colour and depth buffers.
//!
//! [`FrameBuffer`] owns both arrays, indexed row-major as `y * width + x`.
//! Rasterization never touches it directly: it is split into disjoint row
//! bands ([`FrameSlice`]) so that each worker owns its pixels outright and
//! the depth test and write need no synchronization.
//!
//! # Depth Buffer
//!
//! Depth is post-projection Z in `[0, 1]`. The buffer is cleared to
//! `+inf` and a fragment passes when it is strictly nearer (smaller).

use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    color: Vec<u32>,
    depth: Vec<f32>,
}

/// Number of pixels in a `width` x `height` buffer, computed without `u32`
/// overflow.
pub fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = pixel_count(width, height);
        Self {
            width,
            height,
            color: vec![0; len],
            depth: vec![f32::INFINITY; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reallocates both buffers. Contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    /// Start-of-frame reset: colour to `background`, depth to `+inf`.
    pub fn clear(&mut self, background: u32) {
        self.color.par_iter_mut().for_each(|c| *c = background);
        self.depth.par_iter_mut().for_each(|d| *d = f32::INFINITY);
    }

    pub fn color(&self) -> &[u32] {
        &self.color
    }

    pub fn depth(&self) -> &[f32] {
        &self.depth
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Get the colour at (x, y), or None if out of bounds.
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.color[i])
    }

    #[inline]
    pub fn depth_at(&self, x: i32, y: i32) -> Option<f32> {
        self.index(x, y).map(|i| self.depth[i])
    }

    /// The whole buffer as a single band.
    pub fn as_slice(&mut self) -> FrameSlice<'_> {
        FrameSlice {
            width: self.width as usize,
            full_height: self.height as usize,
            y0: 0,
            height: self.height as usize,
            color: &mut self.color,
            depth: &mut self.depth,
            dropped: 0,
        }
    }

    /// Splits the buffer into bands of `rows` rows (the last may be shorter),
    /// each handed to `f` on the rayon pool. Returns the total number of
    /// dropped out-of-range writes.
    pub fn for_each_band<F>(&mut self, rows: u32, f: F) -> usize
    where
        F: Fn(&mut FrameSlice<'_>) + Sync + Send,
    {
        let width = self.width as usize;
        let full_height = self.height as usize;
        let rows = rows.max(1) as usize;
        let chunk = (width * rows).max(1);

        self.color
            .par_chunks_mut(chunk)
            .zip(self.depth.par_chunks_mut(chunk))
            .enumerate()
            .map(|(band, (color, depth))| {
                let mut slice = FrameSlice {
                    width,
                    full_height,
                    y0: band * rows,
                    height: color.len() / width.max(1),
                    color,
                    depth,
                    dropped: 0,
                };
                f(&mut slice);
                slice.dropped
            })
            .sum()
    }

    /// Box-filter downsample by an integer `factor` into `target`.
    pub fn resolve_into(&self, factor: u32, target: &mut FrameBuffer) {
        let factor = factor.max(1);
        let (w, h) = (self.width / factor, self.height / factor);
        target.resize(w, h);
        let src_width = self.width as usize;
        let f = factor as usize;

        target
            .color
            .par_chunks_mut(w.max(1) as usize)
            .zip(target.depth.par_chunks_mut(w.max(1) as usize))
            .enumerate()
            .for_each(|(y, (color_row, depth_row))| {
                for (x, (c, d)) in color_row.iter_mut().zip(depth_row.iter_mut()).enumerate() {
                    let block = (0..f).flat_map(|dy| {
                        let row = (y * f + dy) * src_width;
                        (0..f).map(move |dx| row + x * f + dx)
                    });
                    *c = crate::colors::average(block.clone().map(|i| self.color[i]));
                    *d = block.map(|i| self.depth[i]).fold(f32::INFINITY, f32::min);
                }
            });
    }
}

/// View into a contiguous set of rows in the framebuffer.
/// Each raster worker owns exactly one slice.
pub struct FrameSlice<'a> {
    width: usize,
    full_height: usize,
    y0: usize,
    height: usize,
    color: &'a mut [u32],
    depth: &'a mut [f32],
    dropped: usize,
}

impl FrameSlice<'_> {
    pub fn width(&self) -> usize {
        self.width
    }

    /// First global row of the band.
    pub fn y0(&self) -> usize {
        self.y0
    }

    /// One past the last global row of the band.
    pub fn y1(&self) -> usize {
        self.y0 + self.height
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Local index of global pixel (x, y). Pixels outside the frame are
    /// counted as dropped; pixels of other bands are ignored.
    #[inline]
    fn index(&mut self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.full_height {
            self.dropped += 1;
            return None;
        }
        let y = y as usize;
        if y < self.y0 || y >= self.y1() {
            return None;
        }
        Some((y - self.y0) * self.width + x as usize)
    }

    /// Depth test at global (x, y). On success the depth is stored and the
    /// local index returned so the caller can shade and then write colour.
    #[inline]
    pub fn test_depth(&mut self, x: i32, y: i32, depth: f32) -> Option<usize> {
        let index = self.index(x, y)?;
        if depth < self.depth[index] {
            self.depth[index] = depth;
            Some(index)
        } else {
            None
        }
    }

    #[inline]
    pub fn write_color(&mut self, index: usize, color: u32) {
        self.color[index] = color;
    }

    /// Depth-tested write in one step.
    #[inline]
    pub fn set_pixel_with_depth(&mut self, x: i32, y: i32, depth: f32, color: u32) -> bool {
        match self.test_depth(x, y, depth) {
            Some(index) => {
                self.write_color(index, color);
                true
            }
            None => false,
        }
    }

    /// Set a pixel without depth testing (wireframe overlays).
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if let Some(index) = self.index(x, y) {
            self.color[index] = color;
        }
    }

    /// Draws the line (x0, y0)-(x1, y1) with Bresenham's algorithm, clipped
    /// to this band.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}
