//! Renderer: trail fade followed by particle discs.
//!
//! The frame is never cleared. Each frame washes the previous contents with a
//! translucent background fill, so moving particles leave fading trails.

use glam::DVec2;

use crate::color::Srgb;
use crate::config::FieldConfig;
use crate::field::FieldState;

/// Something the renderer can paint on: a browser canvas, a CPU raster.
pub trait DrawTarget {
    /// Paints a full-surface rectangle of `color` at `alpha` over the current contents.
    fn fade(&mut self, color: Srgb, alpha: f64);

    /// Paints a filled disc in device pixels.
    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Srgb, alpha: f64);
}

/// Fixed visual policy for a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderer {
    background: Srgb,
    foreground: Srgb,
    fade_alpha: f64,
    particle_alpha: f64,
}

impl Renderer {
    pub fn new(config: &FieldConfig) -> Self {
        Self {
            background: config.background,
            foreground: config.foreground,
            fade_alpha: config.fade_alpha,
            particle_alpha: config.particle_alpha,
        }
    }

    /// Paints one frame and returns the number of particles drawn.
    ///
    /// Attractors are not drawn.
    pub fn render(&self, target: &mut dyn DrawTarget, state: &FieldState) -> usize {
        target.fade(self.background, self.fade_alpha);
        for p in state.particles() {
            target.fill_circle(p.position, p.radius, self.foreground, self.particle_alpha);
        }
        state.particles().len()
    }
}
