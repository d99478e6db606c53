//! Surface manager: reconciles logical (CSS) size with device pixel density.
//!
//! The simulation runs entirely in device pixels. The manager is the only
//! writer of [`SurfaceDimensions`]; hosts apply the resulting backing size to
//! their drawing surface.

use glam::DVec2;

/// Logical size of the surface and the clamped device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDimensions {
    logical_width: f64,
    logical_height: f64,
    ratio: f64,
}

impl SurfaceDimensions {
    /// Logical (CSS) width.
    pub fn logical_width(&self) -> f64 {
        self.logical_width
    }

    /// Logical (CSS) height.
    pub fn logical_height(&self) -> f64 {
        self.logical_height
    }

    /// Device pixel ratio after clamping.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Backing buffer width in device pixels.
    pub fn backing_width(&self) -> u32 {
        backing(self.logical_width, self.ratio)
    }

    /// Backing buffer height in device pixels.
    pub fn backing_height(&self) -> u32 {
        backing(self.logical_height, self.ratio)
    }

    /// Simulation bounds in device pixels.
    pub fn bounds(&self) -> DVec2 {
        DVec2::new(self.backing_width() as f64, self.backing_height() as f64)
    }
}

fn backing(logical: f64, ratio: f64) -> u32 {
    (logical * ratio).floor().min(u32::MAX as f64) as u32
}

/// Result of a [`SurfaceManager::resize`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeOutcome {
    /// New dimensions were stored; the host must resize its backing buffer.
    Applied(SurfaceDimensions),
    /// Same dimensions as before; the host must leave its buffer alone.
    Unchanged,
    /// The container is detached or degenerate; nothing changed.
    Skipped,
}

/// Owns the current [`SurfaceDimensions`].
#[derive(Debug, Clone)]
pub struct SurfaceManager {
    max_ratio: f64,
    dims: Option<SurfaceDimensions>,
}

impl SurfaceManager {
    /// Creates a manager with no dimensions yet.
    pub fn new(max_ratio: f64) -> Self {
        Self {
            max_ratio,
            dims: None,
        }
    }

    /// Current dimensions, or `None` until a valid size has been observed.
    pub fn dimensions(&self) -> Option<SurfaceDimensions> {
        self.dims
    }

    /// Simulation bounds, or `None` while the surface has no usable size.
    pub fn bounds(&self) -> Option<DVec2> {
        self.dims.map(|d| d.bounds())
    }

    /// Clamps a raw device pixel ratio to `(0, max_ratio]`; unusable values count as 1.
    pub fn clamp_ratio(&self, device_ratio: f64) -> f64 {
        let ratio = if device_ratio.is_finite() && device_ratio > 0.0 {
            device_ratio
        } else {
            1.0
        };
        ratio.min(self.max_ratio)
    }

    /// Applies a container size. Idempotent, and a no-op for zero, negative,
    /// or non-finite sizes (including sizes whose backing buffer floors to zero).
    ///
    /// Particle positions are deliberately untouched: they wrap against the
    /// new bounds on the next step.
    pub fn resize(&mut self, logical_width: f64, logical_height: f64, device_ratio: f64) -> ResizeOutcome {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(logical_width) || !usable(logical_height) {
            log::trace!("resize skipped: {logical_width}x{logical_height}");
            return ResizeOutcome::Skipped;
        }
        let dims = SurfaceDimensions {
            logical_width,
            logical_height,
            ratio: self.clamp_ratio(device_ratio),
        };
        if dims.backing_width() == 0 || dims.backing_height() == 0 {
            return ResizeOutcome::Skipped;
        }
        if self.dims == Some(dims) {
            return ResizeOutcome::Unchanged;
        }
        log::debug!(
            "surface resized to {}x{} css px at ratio {} ({}x{} device px)",
            logical_width,
            logical_height,
            dims.ratio,
            dims.backing_width(),
            dims.backing_height()
        );
        self.dims = Some(dims);
        ResizeOutcome::Applied(dims)
    }

    /// Converts client (CSS pixel) coordinates to device pixels with the current ratio.
    pub fn to_device(&self, client: DVec2) -> DVec2 {
        client * self.dims.map_or(1.0, |d| d.ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_computes_backing_size_from_ratio() {
        let mut s = SurfaceManager::new(2.0);
        let outcome = s.resize(800.0, 600.0, 1.5);
        let ResizeOutcome::Applied(d) = outcome else {
            panic!("expected Applied, got {outcome:?}");
        };
        assert_eq!(d.backing_width(), 1200);
        assert_eq!(d.backing_height(), 900);
        assert_eq!(s.bounds(), Some(DVec2::new(1200.0, 900.0)));
    }

    #[test]
    fn ratio_is_clamped_to_max() {
        let mut s = SurfaceManager::new(2.0);
        s.resize(100.0, 50.0, 3.0);
        let d = s.dimensions().unwrap();
        assert!((d.ratio() - 2.0).abs() < f64::EPSILON);
        assert_eq!(d.backing_width(), 200);
    }

    #[test]
    fn unusable_ratio_counts_as_one() {
        let s = SurfaceManager::new(2.0);
        assert!((s.clamp_ratio(0.0) - 1.0).abs() < f64::EPSILON);
        assert!((s.clamp_ratio(f64::NAN) - 1.0).abs() < f64::EPSILON);
        assert!((s.clamp_ratio(-2.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_size_is_skipped_without_clearing_previous() {
        let mut s = SurfaceManager::new(2.0);
        assert_eq!(s.resize(0.0, 0.0, 1.0), ResizeOutcome::Skipped);
        assert!(s.dimensions().is_none());
        s.resize(640.0, 480.0, 1.0);
        assert_eq!(s.resize(640.0, 0.0, 1.0), ResizeOutcome::Skipped);
        assert_eq!(s.bounds(), Some(DVec2::new(640.0, 480.0)));
    }

    #[test]
    fn sub_pixel_backing_is_skipped() {
        let mut s = SurfaceManager::new(2.0);
        assert_eq!(s.resize(0.4, 100.0, 1.0), ResizeOutcome::Skipped);
    }

    #[test]
    fn repeated_resize_is_unchanged() {
        let mut s = SurfaceManager::new(2.0);
        assert!(matches!(s.resize(320.0, 240.0, 1.0), ResizeOutcome::Applied(_)));
        assert_eq!(s.resize(320.0, 240.0, 1.0), ResizeOutcome::Unchanged);
    }

    #[test]
    fn to_device_scales_by_current_ratio() {
        let mut s = SurfaceManager::new(2.0);
        assert_eq!(s.to_device(DVec2::new(10.0, 20.0)), DVec2::new(10.0, 20.0));
        s.resize(100.0, 100.0, 2.0);
        assert_eq!(s.to_device(DVec2::new(10.0, 20.0)), DVec2::new(20.0, 40.0));
    }
}
