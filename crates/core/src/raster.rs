//! CPU raster draw target.
//!
//! Pixels are premultiplied RGBA in [0, 1], starting fully transparent like a
//! fresh canvas, and painted with source-over compositing. Discs cover the
//! pixels whose centers fall inside the radius; there is no anti-aliasing.

use glam::DVec2;

use crate::color::Srgb;
use crate::error::FieldError;
use crate::render::DrawTarget;

/// A `width * height` premultiplied RGBA buffer in row-major order.
#[derive(Debug, Clone)]
pub struct Raster {
    width: usize,
    height: usize,
    data: Vec<[f64; 4]>,
}

impl Raster {
    /// Largest accepted width or height in pixels.
    pub const MAX_SIDE: usize = 16_384;

    /// Creates a transparent raster.
    ///
    /// Returns `FieldError::InvalidDimensions` if either dimension is zero,
    /// exceeds [`MAX_SIDE`](Self::MAX_SIDE), or if `width * height` overflows
    /// `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, FieldError> {
        if width == 0 || height == 0 || width > Self::MAX_SIDE || height > Self::MAX_SIDE {
            return Err(FieldError::InvalidDimensions);
        }
        let len = width
            .checked_mul(height)
            .ok_or(FieldError::InvalidDimensions)?;
        Ok(Self {
            width,
            height,
            data: vec![[0.0; 4]; len],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Premultiplied RGBA pixels, row-major.
    pub fn data(&self) -> &[[f64; 4]] {
        &self.data
    }

    /// Premultiplied RGBA at `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[f64; 4]> {
        (x < self.width && y < self.height).then(|| self.data[y * self.width + x])
    }

    fn blend(&mut self, idx: usize, color: Srgb, alpha: f64) {
        let dst = &mut self.data[idx];
        let keep = 1.0 - alpha;
        dst[0] = color.r * alpha + dst[0] * keep;
        dst[1] = color.g * alpha + dst[1] * keep;
        dst[2] = color.b * alpha + dst[2] * keep;
        dst[3] = alpha + dst[3] * keep;
    }
}

impl DrawTarget for Raster {
    fn fade(&mut self, color: Srgb, alpha: f64) {
        let alpha = alpha.clamp(0.0, 1.0);
        for idx in 0..self.data.len() {
            self.blend(idx, color, alpha);
        }
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Srgb, alpha: f64) {
        if !(center.is_finite() && radius.is_finite()) || radius <= 0.0 {
            return;
        }
        let alpha = alpha.clamp(0.0, 1.0);
        let r2 = radius * radius;
        let x0 = (center.x - radius).floor().max(0.0) as usize;
        let y0 = (center.y - radius).floor().max(0.0) as usize;
        let x1 = ((center.x + radius).ceil().max(0.0) as usize).min(self.width);
        let y1 = ((center.y + radius).ceil().max(0.0) as usize).min(self.height);
        for y in y0..y1 {
            let dy = y as f64 + 0.5 - center.y;
            for x in x0..x1 {
                let dx = x as f64 + 0.5 - center.x;
                if dx * dx + dy * dy <= r2 {
                    self.blend(y * self.width + x, color, alpha);
                }
            }
        }
    }
}
