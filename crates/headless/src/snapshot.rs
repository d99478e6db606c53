//! PNG snapshots of a [`Raster`].
//!
//! Feature-gated behind `png` (default on) so builds that only need the
//! headless host don't pull in the `image` crate.

use std::path::Path;

use driftfield_core::{FieldError, Raster};

use crate::pixel::raster_to_rgba8;

/// Writes the raster as a PNG with straight alpha.
///
/// Returns `FieldError::InvalidDimensions` if the raster dimensions overflow
/// `u32`, or `FieldError::Io` on write failure.
pub fn write_png(raster: &Raster, path: &Path) -> Result<(), FieldError> {
    let rgba = raster_to_rgba8(raster);
    let w = u32::try_from(raster.width()).map_err(|_| FieldError::InvalidDimensions)?;
    let h = u32::try_from(raster.height()).map_err(|_| FieldError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, rgba)
        .ok_or_else(|| FieldError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| FieldError::Io(e.to_string()))?;
    log::info!("wrote {w}x{h} snapshot to {}", path.display());
    Ok(())
}
