//! The stepper: orbit attractors, accumulate forces, integrate, wrap.
//!
//! Integration is semi-implicit Euler. Forces come from the particle's
//! position at the start of the step, update velocity, and the new velocity
//! moves the particle. Every force is inverse-square down to a squared-distance
//! floor and constant below it, so a particle passing through a well or
//! under the pointer gets a bounded kick instead of a singular one.

use std::f64::consts::TAU;

use glam::DVec2;

use crate::config::{AttractorConfig, FieldConfig};
use crate::field::FieldState;

/// Timing for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Integration step in seconds, already clamped.
    pub dt: f64,
    /// Wall-clock seconds since the first frame; drives the attractor orbits.
    pub elapsed: f64,
}

/// Converts a frame delta in milliseconds to a step in seconds within `[0, max_dt]`.
///
/// A long gap (backgrounded tab, slow frame) is treated as `max_dt` so the
/// next impulse stays bounded. Non-finite or negative deltas give 0.
pub fn clamp_dt(delta_ms: f64, max_dt: f64) -> f64 {
    let dt = delta_ms / 1000.0;
    if dt.is_finite() {
        dt.clamp(0.0, max_dt)
    } else {
        0.0
    }
}

/// Shared orbit center in device pixels.
pub fn orbit_center(config: &FieldConfig, bounds: DVec2) -> DVec2 {
    DVec2::new(bounds.x * config.orbit_center_x, bounds.y * config.orbit_center_y)
}

/// Position of an attractor `elapsed` seconds after the first frame.
///
/// A pure function of time and surface size: the x radius scales with width
/// and the y radius with height, so orbits are ellipses on non-square surfaces.
pub fn orbit_position(attractor: &AttractorConfig, center: DVec2, elapsed: f64, bounds: DVec2) -> DVec2 {
    let angle = TAU * attractor.angular_speed * elapsed + attractor.phase;
    center
        + DVec2::new(
            angle.cos() * bounds.x * attractor.orbit_radius,
            angle.sin() * bounds.y * attractor.orbit_radius,
        )
}

/// Magnitude of an inverse-square force: `constant / max(floor, d2)`.
pub fn inverse_square(constant: f64, d2: f64, floor: f64) -> f64 {
    constant / d2.max(floor)
}

/// Acceleration on a particle at `from` toward `to` (away when `constant` is negative).
///
/// Coincident points have no direction and contribute nothing.
fn pull(from: DVec2, to: DVec2, constant: f64, floor: f64) -> DVec2 {
    let d = to - from;
    let d2 = d.length_squared();
    if d2 == 0.0 {
        return DVec2::ZERO;
    }
    d / d2.sqrt() * inverse_square(constant, d2, floor)
}

/// Wraps one coordinate into `[0, dim)`.
///
/// One add/subtract covers ordinary motion. A displacement larger than the
/// surface (or a surface that just shrank under the particle) falls back to a
/// Euclidean remainder so the bound holds regardless.
pub fn wrap_axis(value: f64, dim: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let mut v = if value < 0.0 {
        value + dim
    } else if value >= dim {
        value - dim
    } else {
        value
    };
    if !(0.0..dim).contains(&v) {
        v = v.rem_euclid(dim);
    }
    // rem_euclid of a tiny negative rounds up to `dim` itself
    if v >= dim {
        v = 0.0;
    }
    v
}

/// Advances `state` by one tick.
///
/// `pointer` is the pointer position when active. `bounds` must be positive.
pub fn step_field(
    state: &mut FieldState,
    pointer: Option<DVec2>,
    bounds: DVec2,
    config: &FieldConfig,
    tick: Tick,
) {
    let center = orbit_center(config, bounds);
    let (particles, attractors) = state.split_mut();

    for attractor in attractors.iter_mut() {
        attractor.position = orbit_position(&attractor.config, center, tick.elapsed, bounds);
    }

    let reach2 = config.pointer_radius.map(|r| r * r);
    for particle in particles.iter_mut() {
        let mut accel = DVec2::ZERO;
        for attractor in attractors.iter() {
            accel += pull(
                particle.position,
                attractor.position,
                attractor.config.strength * config.attractor_force,
                config.attractor_floor,
            );
        }
        if let Some(ptr) = pointer {
            let in_reach = reach2.map_or(true, |r2| (ptr - particle.position).length_squared() <= r2);
            if in_reach {
                accel += pull(particle.position, ptr, -config.pointer_force, config.pointer_floor);
            }
        }

        particle.velocity += accel * tick.dt;
        particle.position += particle.velocity * tick.dt;
        particle.position = DVec2::new(
            wrap_axis(particle.position.x, bounds.x),
            wrap_axis(particle.position.y, bounds.y),
        );
    }
}

/// Owns frame timing: the first-frame origin and the previous timestamp.
#[derive(Debug, Clone)]
pub struct Stepper {
    max_dt: f64,
    origin_ms: Option<f64>,
    last_ms: Option<f64>,
}

impl Stepper {
    pub fn new(max_dt: f64) -> Self {
        Self {
            max_dt,
            origin_ms: None,
            last_ms: None,
        }
    }

    /// Forgets timing; the next frame becomes the new origin.
    pub fn reset(&mut self) {
        self.origin_ms = None;
        self.last_ms = None;
    }

    /// Records frame timestamp `ts` (ms) and returns the timing for its step.
    ///
    /// The first frame after construction or [`reset`](Self::reset) has `dt = 0`.
    pub fn advance(&mut self, ts: f64) -> Tick {
        let origin = *self.origin_ms.get_or_insert(ts);
        let last = self.last_ms.unwrap_or(ts);
        self.last_ms = Some(ts);
        Tick {
            dt: clamp_dt(ts - last, self.max_dt),
            elapsed: ((ts - origin) / 1000.0).max(0.0),
        }
    }

    /// Advances the clock and steps `state` when `bounds` is usable.
    ///
    /// Time still advances when the surface is degenerate, so the first real
    /// step afterwards does not see a stale timestamp.
    pub fn step(
        &mut self,
        state: &mut FieldState,
        pointer: Option<DVec2>,
        bounds: Option<DVec2>,
        config: &FieldConfig,
        ts: f64,
    ) -> Option<Tick> {
        let tick = self.advance(ts);
        let bounds = bounds.filter(|b| b.x > 0.0 && b.y > 0.0)?;
        step_field(state, pointer, bounds, config, tick);
        Some(tick)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::field::{Attractor, Particle};
    use crate::prng::Xorshift64;

    const EPS: f64 = 1e-9;

    fn still(x: f64, y: f64) -> Particle {
        Particle {
            position: DVec2::new(x, y),
            velocity: DVec2::ZERO,
            radius: 1.0,
        }
    }

    /// Config with one stationary well of strength 1 at the orbit center.
    fn pinned_well() -> FieldConfig {
        FieldConfig {
            attractors: vec![AttractorConfig {
                orbit_radius: 0.0,
                strength: 1.0,
                ..AttractorConfig::defaults()[0]
            }],
            ..FieldConfig::default()
        }
    }

    fn state_with(config: &FieldConfig, particles: Vec<Particle>) -> FieldState {
        let attractors = config
            .attractors
            .iter()
            .map(|&config| Attractor {
                config,
                position: DVec2::ZERO,
            })
            .collect();
        FieldState::from_parts(particles, attractors)
    }

    fn tick(dt: f64) -> Tick {
        Tick { dt, elapsed: 0.0 }
    }

    // ---- dt ----

    #[test]
    fn dt_is_clamped_after_tab_resume() {
        assert!((clamp_dt(5000.0, 0.033) - 0.033).abs() < EPS);
        assert!((clamp_dt(16.0, 0.033) - 0.016).abs() < EPS);
    }

    #[test]
    fn dt_is_zero_for_backwards_or_nan_deltas() {
        assert_eq!(clamp_dt(-20.0, 0.033), 0.0);
        assert_eq!(clamp_dt(f64::NAN, 0.033), 0.0);
    }

    #[test]
    fn stepper_first_frame_has_zero_dt_and_elapsed() {
        let mut s = Stepper::new(0.033);
        let t = s.advance(12_345.0);
        assert_eq!(t, Tick { dt: 0.0, elapsed: 0.0 });
        let t = s.advance(12_361.0);
        assert!((t.dt - 0.016).abs() < EPS);
        assert!((t.elapsed - 0.016).abs() < EPS);
    }

    #[test]
    fn stepper_elapsed_is_wall_clock_not_clamped_sum() {
        let mut s = Stepper::new(0.033);
        s.advance(0.0);
        let t = s.advance(5000.0);
        assert!((t.dt - 0.033).abs() < EPS);
        assert!((t.elapsed - 5.0).abs() < EPS);
    }

    #[test]
    fn stepper_reset_restarts_origin() {
        let mut s = Stepper::new(0.033);
        s.advance(0.0);
        s.advance(1000.0);
        s.reset();
        assert_eq!(s.advance(9000.0), Tick { dt: 0.0, elapsed: 0.0 });
    }

    #[test]
    fn stepper_skips_degenerate_bounds_but_keeps_time() {
        let config = FieldConfig::default();
        let mut state = state_with(&config, vec![still(1.0, 1.0)]);
        let mut s = Stepper::new(config.max_dt);
        assert!(s.step(&mut state, None, None, &config, 0.0).is_none());
        assert!(s
            .step(&mut state, None, Some(DVec2::new(0.0, 10.0)), &config, 10.0)
            .is_none());
        let t = s
            .step(&mut state, None, Some(DVec2::new(100.0, 100.0)), &config, 26.0)
            .unwrap();
        assert!((t.dt - 0.016).abs() < EPS);
    }

    // ---- attractor orbits ----

    #[test]
    fn attractor_positions_at_time_zero_match_closed_form() {
        let config = FieldConfig::default();
        let bounds = DVec2::new(800.0, 600.0);
        let mut state = state_with(&config, Vec::new());
        step_field(&mut state, None, bounds, &config, tick(0.0));

        let center = DVec2::new(800.0 * 0.5, 600.0 * 0.32);
        let first = state.attractors()[0].position;
        assert_eq!(
            first,
            center + DVec2::new(0.0_f64.cos() * 800.0 * 0.22, 0.0_f64.sin() * 600.0 * 0.22)
        );
        let second = state.attractors()[1].position;
        assert_eq!(
            second,
            center + DVec2::new(PI.cos() * 800.0 * 0.30, PI.sin() * 600.0 * 0.30)
        );
        assert!((first.x - 576.0).abs() < EPS && (first.y - 192.0).abs() < EPS);
        assert!((second.x - 160.0).abs() < EPS && (second.y - 192.0).abs() < EPS);
    }

    #[test]
    fn orbit_is_periodic_and_signed() {
        let a = AttractorConfig::defaults()[1];
        let bounds = DVec2::new(1000.0, 1000.0);
        let c = DVec2::new(500.0, 320.0);
        let period = 1.0 / a.angular_speed.abs();
        let p0 = orbit_position(&a, c, 0.0, bounds);
        let p1 = orbit_position(&a, c, period, bounds);
        assert!((p0 - p1).length() < 1e-6);
        // Negative speed: a quarter period later the angle has decreased by pi/2.
        let q = orbit_position(&a, c, period / 4.0, bounds);
        let expected = orbit_position(
            &AttractorConfig {
                angular_speed: 0.0,
                phase: a.phase - PI / 2.0,
                ..a
            },
            c,
            0.0,
            bounds,
        );
        assert!((q - expected).length() < 1e-6);
    }

    #[test]
    fn attractors_ignore_particles_and_pointer() {
        let config = FieldConfig::default();
        let bounds = DVec2::new(640.0, 480.0);
        let mut empty = state_with(&config, Vec::new());
        let mut busy = state_with(&config, vec![still(10.0, 10.0), still(300.0, 100.0)]);
        let t = Tick { dt: 0.016, elapsed: 3.7 };
        step_field(&mut empty, None, bounds, &config, t);
        step_field(&mut busy, Some(DVec2::new(320.0, 200.0)), bounds, &config, t);
        assert_eq!(empty.attractors(), busy.attractors());
    }

    // ---- forces ----

    #[test]
    fn inverse_square_above_floor() {
        assert!((inverse_square(9000.0, 10_000.0, 120.0) - 0.9).abs() < EPS);
        assert!((inverse_square(9000.0, 120.0, 120.0) - 75.0).abs() < EPS);
    }

    #[test]
    fn inverse_square_below_floor_is_capped() {
        // 5 px apart: d2 = 25 < 120
        assert!((inverse_square(9000.0, 25.0, 120.0) - 75.0).abs() < EPS);
        assert!((inverse_square(-14000.0, 9.0, 100.0) + 140.0).abs() < EPS);
    }

    #[test]
    fn close_particle_uses_floor_value() {
        let config = pinned_well();
        let bounds = DVec2::new(1000.0, 1000.0);
        // Well sits at the orbit center (500, 320); particle 5 px to its left.
        let mut state = state_with(&config, vec![still(495.0, 320.0)]);
        step_field(&mut state, None, bounds, &config, tick(0.01));
        let v = state.particles()[0].velocity;
        assert!((v.x - 9000.0 / 120.0 * 0.01).abs() < EPS, "vx = {}", v.x);
        assert!(v.y.abs() < EPS);
    }

    #[test]
    fn distant_particle_uses_inverse_square() {
        let config = pinned_well();
        let bounds = DVec2::new(1000.0, 1000.0);
        let mut state = state_with(&config, vec![still(500.0, 420.0)]);
        step_field(&mut state, None, bounds, &config, tick(0.01));
        let v = state.particles()[0].velocity;
        assert!(v.x.abs() < EPS);
        assert!((v.y + 9000.0 / 10_000.0 * 0.01).abs() < EPS, "vy = {}", v.y);
    }

    #[test]
    fn strength_scales_pull() {
        let mut config = pinned_well();
        config.attractors[0].strength = 2.5;
        let mut state = state_with(&config, vec![still(400.0, 320.0)]);
        step_field(&mut state, None, DVec2::new(1000.0, 1000.0), &config, tick(0.01));
        let vx = state.particles()[0].velocity.x;
        assert!((vx - 2.5 * 9000.0 / 10_000.0 * 0.01).abs() < EPS);
    }

    #[test]
    fn pointer_repels_with_floor() {
        let config = FieldConfig {
            attractors: Vec::new(),
            ..FieldConfig::default()
        };
        let mut state = state_with(&config, vec![still(100.0, 100.0)]);
        step_field(
            &mut state,
            Some(DVec2::new(103.0, 100.0)),
            DVec2::new(500.0, 500.0),
            &config,
            tick(0.01),
        );
        let v = state.particles()[0].velocity;
        assert!((v.x + 14000.0 / 100.0 * 0.01).abs() < EPS, "vx = {}", v.x);
        assert!(v.y.abs() < EPS);
    }

    #[test]
    fn pointer_radius_limits_reach() {
        let config = FieldConfig {
            attractors: Vec::new(),
            pointer_radius: Some(50.0),
            ..FieldConfig::default()
        };
        let mut state = state_with(&config, vec![still(100.0, 100.0), still(300.0, 100.0)]);
        step_field(
            &mut state,
            Some(DVec2::new(130.0, 100.0)),
            DVec2::new(500.0, 500.0),
            &config,
            tick(0.01),
        );
        assert!(state.particles()[0].velocity.x < 0.0);
        assert_eq!(state.particles()[1].velocity, DVec2::ZERO);
    }

    #[test]
    fn coincident_particle_gets_no_nan() {
        let config = pinned_well();
        let mut state = state_with(&config, vec![still(500.0, 320.0)]);
        step_field(&mut state, None, DVec2::new(1000.0, 1000.0), &config, tick(0.016));
        let p = state.particles()[0];
        assert!(p.position.is_finite() && p.velocity.is_finite());
    }

    #[test]
    fn integration_is_semi_implicit() {
        let config = pinned_well();
        let mut state = state_with(&config, vec![still(400.0, 320.0)]);
        let dt = 0.02;
        step_field(&mut state, None, DVec2::new(1000.0, 1000.0), &config, tick(dt));
        let accel = 9000.0 / 10_000.0;
        let p = state.particles()[0];
        // New velocity moves the particle in the same step: x += a*dt*dt.
        assert!((p.position.x - (400.0 + accel * dt * dt)).abs() < EPS);
    }

    #[test]
    fn zero_dt_leaves_particles_in_place() {
        let config = FieldConfig::default();
        let mut state = state_with(
            &config,
            vec![Particle {
                position: DVec2::new(50.0, 60.0),
                velocity: DVec2::new(30.0, -30.0),
                radius: 2.0,
            }],
        );
        step_field(&mut state, None, DVec2::new(200.0, 200.0), &config, tick(0.0));
        assert_eq!(state.particles()[0].position, DVec2::new(50.0, 60.0));
    }

    // ---- wrap ----

    #[test]
    fn wrap_axis_single_crossing() {
        assert!((wrap_axis(-3.0, 100.0) - 97.0).abs() < EPS);
        assert!((wrap_axis(100.0, 100.0) - 0.0).abs() < EPS);
        assert!((wrap_axis(104.5, 100.0) - 4.5).abs() < EPS);
        assert!((wrap_axis(42.0, 100.0) - 42.0).abs() < EPS);
    }

    #[test]
    fn wrap_axis_handles_multiple_widths_and_rounding() {
        assert!((wrap_axis(350.0, 100.0) - 50.0).abs() < EPS);
        assert!((wrap_axis(-250.0, 100.0) - 50.0).abs() < EPS);
        let v = wrap_axis(-1e-18, 100.0);
        assert!((0.0..100.0).contains(&v), "got {v}");
        assert_eq!(wrap_axis(f64::NAN, 100.0), 0.0);
    }

    #[test]
    fn extreme_velocity_stays_in_bounds() {
        let config = FieldConfig {
            attractors: Vec::new(),
            ..FieldConfig::default()
        };
        let bounds = DVec2::new(320.0, 200.0);
        let mut state = state_with(
            &config,
            vec![Particle {
                position: DVec2::new(10.0, 10.0),
                velocity: DVec2::new(1e6, -7e5),
                radius: 1.0,
            }],
        );
        for _ in 0..20 {
            step_field(&mut state, None, bounds, &config, tick(0.033));
            let p = state.particles()[0].position;
            assert!((0.0..320.0).contains(&p.x), "x = {}", p.x);
            assert!((0.0..200.0).contains(&p.y), "y = {}", p.y);
        }
    }

    #[test]
    fn shrunk_surface_wraps_existing_particles() {
        let config = FieldConfig::default();
        let mut state = state_with(&config, vec![still(900.0, 700.0)]);
        step_field(&mut state, None, DVec2::new(400.0, 300.0), &config, tick(0.0));
        let p = state.particles()[0].position;
        assert!((0.0..400.0).contains(&p.x) && (0.0..300.0).contains(&p.y));
    }

    mod proptests {
        use super::*;
        use crate::prng::RandomSource;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn particles_always_within_bounds(
                seed: u64,
                w in 1.0_f64..2000.0,
                h in 1.0_f64..2000.0,
                frames in proptest::collection::vec(0.0_f64..5000.0, 1..40),
                ptr in proptest::option::of((0.0_f64..2000.0, 0.0_f64..2000.0)),
            ) {
                let config = FieldConfig::default();
                let bounds = DVec2::new(w.floor().max(1.0), h.floor().max(1.0));
                let mut state = FieldState::new(&config);
                let mut rng = Xorshift64::new(seed);
                state.spawn(64, bounds, &config, &mut rng);
                let pointer = ptr.map(|(x, y)| DVec2::new(x, y));
                let mut stepper = Stepper::new(config.max_dt);
                let mut ts = rng.next_range(0.0, 1e6);
                for gap in frames {
                    ts += gap;
                    let tick = stepper.step(&mut state, pointer, Some(bounds), &config, ts);
                    prop_assert!(tick.map_or(true, |t| t.dt <= config.max_dt && t.dt >= 0.0));
                    for p in state.particles() {
                        prop_assert!(p.position.x >= 0.0 && p.position.x < bounds.x, "x = {}", p.position.x);
                        prop_assert!(p.position.y >= 0.0 && p.position.y < bounds.y, "y = {}", p.position.y);
                    }
                }
            }

            #[test]
            fn clamp_dt_never_exceeds_max(delta in -1e9_f64..1e9, max_dt in 1e-4_f64..1.0) {
                let dt = clamp_dt(delta, max_dt);
                prop_assert!((0.0..=max_dt).contains(&dt));
            }

            #[test]
            fn force_is_capped_by_floor(d2 in 0.0_f64..1e6, floor in 1.0_f64..1000.0, k in 0.0_f64..1e5) {
                let f = inverse_square(k, d2, floor);
                prop_assert!(f <= k / floor + 1e-9);
                if d2 >= floor {
                    prop_assert!((f - k / d2).abs() <= 1e-9 * (1.0 + f));
                }
            }
        }
    }
}
