//! Conversion of a premultiplied [`Raster`] into straight RGBA8 bytes.
//!
//! Always available (no feature gate) so callers without the `png` feature can
//! still hand the bytes to their own encoder.

use driftfield_core::Raster;

/// Un-premultiplies and quantizes the raster to `width * height * 4` bytes.
///
/// Fully transparent pixels become `[0, 0, 0, 0]`.
pub fn raster_to_rgba8(raster: &Raster) -> Vec<u8> {
    let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    raster
        .data()
        .iter()
        .flat_map(|&[r, g, b, a]| {
            if a <= 0.0 {
                [0, 0, 0, 0]
            } else {
                [q(r / a), q(g / a), q(b / a), q(a)]
            }
        })
        .collect()
}
