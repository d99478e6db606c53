//! Field state: the particle population and the attractor set.

use glam::DVec2;

use crate::config::{AttractorConfig, FieldConfig};
use crate::prng::RandomSource;

/// A drifting particle. Position in device pixels, velocity in pixels per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: DVec2,
    pub velocity: DVec2,
    pub radius: f64,
}

/// A kinematic well. Its position is recomputed from elapsed time every step
/// and never depends on particles or the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attractor {
    pub config: AttractorConfig,
    pub position: DVec2,
}

/// Particles and attractors, owned exclusively by the field.
#[derive(Debug, Clone, Default)]
pub struct FieldState {
    particles: Vec<Particle>,
    attractors: Vec<Attractor>,
}

impl FieldState {
    /// Builds the attractor set from `config`. No particles until [`spawn`](Self::spawn).
    pub fn new(config: &FieldConfig) -> Self {
        Self {
            particles: Vec::new(),
            attractors: config
                .attractors
                .iter()
                .map(|&config| Attractor {
                    config,
                    position: DVec2::ZERO,
                })
                .collect(),
        }
    }

    /// Builds a state from literal parts, for driving the stepper directly.
    pub fn from_parts(particles: Vec<Particle>, attractors: Vec<Attractor>) -> Self {
        Self {
            particles,
            attractors,
        }
    }

    /// Replaces the population with `count` fresh particles inside `bounds`.
    ///
    /// Positions are uniform over `[0, w) x [0, h)`, velocity components are
    /// `(rand - 0.5) * speed`, radii uniform over `[radius_min, radius_max)`.
    pub fn spawn(
        &mut self,
        count: usize,
        bounds: DVec2,
        config: &FieldConfig,
        rng: &mut impl RandomSource,
    ) {
        self.particles.clear();
        self.particles.reserve(count);
        for _ in 0..count {
            let position = DVec2::new(rng.next_f64() * bounds.x, rng.next_f64() * bounds.y);
            let velocity = DVec2::new(
                (rng.next_f64() - 0.5) * config.speed,
                (rng.next_f64() - 0.5) * config.speed,
            );
            let radius = rng.next_range(config.radius_min, config.radius_max);
            self.particles.push(Particle {
                position,
                velocity,
                radius,
            });
        }
        log::debug!("spawned {count} particles in {}x{}", bounds.x, bounds.y);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn attractors(&self) -> &[Attractor] {
        &self.attractors
    }

    /// Mutable access to both sets at once, as the stepper needs.
    pub fn split_mut(&mut self) -> (&mut [Particle], &mut [Attractor]) {
        (&mut self.particles, &mut self.attractors)
    }
}
