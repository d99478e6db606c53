//! Field configuration: population, force constants, attractor orbits and colors.
//!
//! Everything here is fixed at construction. The force constants and
//! distance floors were tuned by eye; treat them as defaults to preserve, not
//! as physically meaningful values.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::color::Srgb;
use crate::error::FieldError;
use crate::params::{param_color, param_f64, param_opt_f64, param_usize};

/// Number of particles spawned on start.
pub const DEFAULT_PARTICLE_COUNT: usize = 260;
/// Full width of the initial velocity range; components are `(rand - 0.5) * speed`.
pub const DEFAULT_SPEED: f64 = 60.0;
pub const DEFAULT_RADIUS_MIN: f64 = 1.2;
pub const DEFAULT_RADIUS_MAX: f64 = 3.4;
/// Orbit center as a fraction of the surface size.
pub const DEFAULT_ORBIT_CENTER_X: f64 = 0.5;
pub const DEFAULT_ORBIT_CENTER_Y: f64 = 0.32;
pub const DEFAULT_ATTRACTOR_FORCE: f64 = 9000.0;
/// Squared-distance floor for attractor pull.
pub const DEFAULT_ATTRACTOR_FLOOR: f64 = 120.0;
pub const DEFAULT_POINTER_FORCE: f64 = 14000.0;
/// Squared-distance floor for pointer repulsion.
pub const DEFAULT_POINTER_FLOOR: f64 = 100.0;
/// Quiet period after the last pointer move before the pointer deactivates.
pub const DEFAULT_POINTER_IDLE_MS: f64 = 400.0;
pub const DEFAULT_FADE_ALPHA: f64 = 0.2;
pub const DEFAULT_PARTICLE_ALPHA: f64 = 0.75;
pub const DEFAULT_MAX_RATIO: f64 = 2.0;
/// Upper bound on a single step's `dt`, in seconds.
pub const DEFAULT_MAX_DT: f64 = 0.033;

fn default_background() -> Srgb {
    Srgb::from_rgb8(0x07, 0x08, 0x0d)
}

fn default_foreground() -> Srgb {
    Srgb::from_rgb8(0xdd, 0xe4, 0xff)
}

/// One attractor ("well") and its orbit.
///
/// `angular_speed` is signed and measured in cycles per second; `orbit_radius`
/// is a fraction of the surface width (x) and height (y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttractorConfig {
    pub strength: f64,
    /// Tag color. Kept with the attractor but never drawn.
    pub color: Srgb,
    pub orbit_radius: f64,
    pub angular_speed: f64,
    pub phase: f64,
}

impl AttractorConfig {
    /// The two default wells: a tight clockwise orbit and a wider,
    /// counter-rotating one half a turn out of phase.
    pub fn defaults() -> Vec<AttractorConfig> {
        vec![
            AttractorConfig {
                strength: 1.0,
                color: Srgb::from_rgb8(0x7a, 0xa2, 0xff),
                orbit_radius: 0.22,
                angular_speed: 0.05,
                phase: 0.0,
            },
            AttractorConfig {
                strength: 0.8,
                color: Srgb::from_rgb8(0xff, 0x7a, 0xc6),
                orbit_radius: 0.30,
                angular_speed: -0.035,
                phase: PI,
            },
        ]
    }

    fn from_json(params: &Value, fallback: AttractorConfig) -> Result<Self, FieldError> {
        Ok(Self {
            strength: param_f64(params, "strength", fallback.strength),
            color: param_color(params, "color", fallback.color)?,
            orbit_radius: param_f64(params, "orbit_radius", fallback.orbit_radius),
            angular_speed: param_f64(params, "angular_speed", fallback.angular_speed),
            phase: param_f64(params, "phase", fallback.phase),
        })
    }
}

/// Complete configuration of a particle field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub particle_count: usize,
    pub speed: f64,
    pub radius_min: f64,
    pub radius_max: f64,
    pub attractors: Vec<AttractorConfig>,
    pub orbit_center_x: f64,
    pub orbit_center_y: f64,
    pub attractor_force: f64,
    pub attractor_floor: f64,
    pub pointer_force: f64,
    pub pointer_floor: f64,
    /// Repulsion only reaches particles within this many device pixels; `None` is unbounded.
    pub pointer_radius: Option<f64>,
    pub pointer_idle_ms: f64,
    pub fade_alpha: f64,
    pub particle_alpha: f64,
    pub background: Srgb,
    pub foreground: Srgb,
    pub max_ratio: f64,
    pub max_dt: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            speed: DEFAULT_SPEED,
            radius_min: DEFAULT_RADIUS_MIN,
            radius_max: DEFAULT_RADIUS_MAX,
            attractors: AttractorConfig::defaults(),
            orbit_center_x: DEFAULT_ORBIT_CENTER_X,
            orbit_center_y: DEFAULT_ORBIT_CENTER_Y,
            attractor_force: DEFAULT_ATTRACTOR_FORCE,
            attractor_floor: DEFAULT_ATTRACTOR_FLOOR,
            pointer_force: DEFAULT_POINTER_FORCE,
            pointer_floor: DEFAULT_POINTER_FLOOR,
            pointer_radius: None,
            pointer_idle_ms: DEFAULT_POINTER_IDLE_MS,
            fade_alpha: DEFAULT_FADE_ALPHA,
            particle_alpha: DEFAULT_PARTICLE_ALPHA,
            background: default_background(),
            foreground: default_foreground(),
            max_ratio: DEFAULT_MAX_RATIO,
            max_dt: DEFAULT_MAX_DT,
        }
    }
}

impl FieldConfig {
    /// Reads a configuration from a JSON object, falling back to defaults per key.
    ///
    /// `attractors`, when present, is an array of objects; entries missing a key
    /// inherit it from the default attractor at the same index (or the last
    /// default for extra entries). The result is validated.
    pub fn from_json(params: &Value) -> Result<Self, FieldError> {
        let d = FieldConfig::default();
        let attractors = match params.get("attractors").and_then(Value::as_array) {
            Some(entries) => entries
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    let fallback = d.attractors[i.min(d.attractors.len() - 1)];
                    AttractorConfig::from_json(entry, fallback)
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => d.attractors.clone(),
        };
        let config = Self {
            particle_count: param_usize(params, "particle_count", d.particle_count),
            speed: param_f64(params, "speed", d.speed),
            radius_min: param_f64(params, "radius_min", d.radius_min),
            radius_max: param_f64(params, "radius_max", d.radius_max),
            attractors,
            orbit_center_x: param_f64(params, "orbit_center_x", d.orbit_center_x),
            orbit_center_y: param_f64(params, "orbit_center_y", d.orbit_center_y),
            attractor_force: param_f64(params, "attractor_force", d.attractor_force),
            attractor_floor: param_f64(params, "attractor_floor", d.attractor_floor),
            pointer_force: param_f64(params, "pointer_force", d.pointer_force),
            pointer_floor: param_f64(params, "pointer_floor", d.pointer_floor),
            pointer_radius: param_opt_f64(params, "pointer_radius", d.pointer_radius),
            pointer_idle_ms: param_f64(params, "pointer_idle_ms", d.pointer_idle_ms),
            fade_alpha: param_f64(params, "fade_alpha", d.fade_alpha),
            particle_alpha: param_f64(params, "particle_alpha", d.particle_alpha),
            background: param_color(params, "background", d.background)?,
            foreground: param_color(params, "foreground", d.foreground)?,
            max_ratio: param_f64(params, "max_ratio", d.max_ratio),
            max_dt: param_f64(params, "max_dt", d.max_dt),
        };
        config.validate()?;
        Ok(config)
    }

    /// Current values as a JSON object (same shape `from_json` reads).
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Checks every value is finite and within its accepted range.
    pub fn validate(&self) -> Result<(), FieldError> {
        fn non_negative(name: &str, v: f64) -> Result<(), FieldError> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(FieldError::config(name, format!("must be finite and >= 0, got {v}")))
            }
        }
        fn positive(name: &str, v: f64) -> Result<(), FieldError> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(FieldError::config(name, format!("must be finite and > 0, got {v}")))
            }
        }
        fn unit(name: &str, v: f64) -> Result<(), FieldError> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(FieldError::config(name, format!("must be within [0, 1], got {v}")))
            }
        }

        non_negative("speed", self.speed)?;
        positive("radius_min", self.radius_min)?;
        positive("radius_max", self.radius_max)?;
        if self.radius_min > self.radius_max {
            return Err(FieldError::config(
                "radius_min",
                format!("{} exceeds radius_max {}", self.radius_min, self.radius_max),
            ));
        }
        for (i, a) in self.attractors.iter().enumerate() {
            let label = format!("attractors[{i}]");
            if !(a.strength.is_finite() && a.angular_speed.is_finite() && a.phase.is_finite()) {
                return Err(FieldError::config(&label, "strength, speed and phase must be finite"));
            }
            non_negative(&label, a.orbit_radius)?;
        }
        unit("orbit_center_x", self.orbit_center_x)?;
        unit("orbit_center_y", self.orbit_center_y)?;
        non_negative("attractor_force", self.attractor_force)?;
        positive("attractor_floor", self.attractor_floor)?;
        non_negative("pointer_force", self.pointer_force)?;
        positive("pointer_floor", self.pointer_floor)?;
        if let Some(r) = self.pointer_radius {
            positive("pointer_radius", r)?;
        }
        non_negative("pointer_idle_ms", self.pointer_idle_ms)?;
        unit("fade_alpha", self.fade_alpha)?;
        unit("particle_alpha", self.particle_alpha)?;
        positive("max_ratio", self.max_ratio)?;
        positive("max_dt", self.max_dt)?;
        Ok(())
    }

    /// Schema describing every key: type, default, range and meaning.
    pub fn param_schema() -> Value {
        let d = FieldConfig::default();
        json!({
            "particle_count": {
                "type": "integer",
                "default": d.particle_count,
                "min": 0,
                "description": "Particles spawned on start"
            },
            "speed": {
                "type": "number",
                "default": d.speed,
                "min": 0.0,
                "description": "Full width of the initial velocity range per axis (px/s)"
            },
            "radius_min": {
                "type": "number",
                "default": d.radius_min,
                "description": "Smallest particle radius (device px)"
            },
            "radius_max": {
                "type": "number",
                "default": d.radius_max,
                "description": "Largest particle radius (device px)"
            },
            "attractors": {
                "type": "array",
                "default": d.attractors,
                "description": "Wells: strength, color, orbit_radius (fraction), angular_speed (cycles/s, signed), phase (rad)"
            },
            "orbit_center_x": {
                "type": "number",
                "default": d.orbit_center_x,
                "min": 0.0,
                "max": 1.0,
                "description": "Orbit center as a fraction of width"
            },
            "orbit_center_y": {
                "type": "number",
                "default": d.orbit_center_y,
                "min": 0.0,
                "max": 1.0,
                "description": "Orbit center as a fraction of height"
            },
            "attractor_force": {
                "type": "number",
                "default": d.attractor_force,
                "description": "Pull constant, scaled by each attractor's strength"
            },
            "attractor_floor": {
                "type": "number",
                "default": d.attractor_floor,
                "description": "Minimum squared distance used for attractor pull"
            },
            "pointer_force": {
                "type": "number",
                "default": d.pointer_force,
                "description": "Pointer repulsion constant"
            },
            "pointer_floor": {
                "type": "number",
                "default": d.pointer_floor,
                "description": "Minimum squared distance used for pointer repulsion"
            },
            "pointer_radius": {
                "type": "number",
                "default": null,
                "description": "Repulsion reach in device px; null for unbounded"
            },
            "pointer_idle_ms": {
                "type": "number",
                "default": d.pointer_idle_ms,
                "description": "Quiet period after the last move before the pointer deactivates"
            },
            "fade_alpha": {
                "type": "number",
                "default": d.fade_alpha,
                "min": 0.0,
                "max": 1.0,
                "description": "Opacity of the background wash painted each frame (trail length)"
            },
            "particle_alpha": {
                "type": "number",
                "default": d.particle_alpha,
                "min": 0.0,
                "max": 1.0,
                "description": "Particle fill opacity"
            },
            "background": {
                "type": "color",
                "default": d.background,
                "description": "Trail wash color"
            },
            "foreground": {
                "type": "color",
                "default": d.foreground,
                "description": "Particle color"
            },
            "max_ratio": {
                "type": "number",
                "default": d.max_ratio,
                "description": "Upper clamp on the device pixel ratio"
            },
            "max_dt": {
                "type": "number",
                "default": d.max_dt,
                "description": "Upper clamp on a single step's dt (s)"
            }
        })
    }
}
