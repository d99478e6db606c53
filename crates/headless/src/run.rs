//! Reproducible description of a headless run.
//!
//! A [`RunSpec`] captures everything needed to replay a field exactly:
//! container size, device ratio, PRNG seed, frame count and rate, config
//! overrides, and a script of pointer/resize events. Two identical specs
//! produce bit-identical rasters.

use driftfield_core::{FieldConfig, FieldError, Raster, Scheduler, SurfaceManager, Xorshift64};
use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{FrameClock, HeadlessField, HeadlessHost};

fn default_device_ratio() -> f64 {
    1.0
}

fn default_fps() -> f64 {
    60.0
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// A host event delivered once the frame clock reaches `at_ms`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptedEvent {
    /// Pointer moved to `(x, y)` in CSS pixels.
    Move { at_ms: f64, x: f64, y: f64 },
    /// Pointer left the viewport.
    Leave { at_ms: f64 },
    /// Container changed size.
    Resize {
        at_ms: f64,
        width: f64,
        height: f64,
        #[serde(default = "default_device_ratio")]
        device_ratio: f64,
    },
}

impl ScriptedEvent {
    pub fn at_ms(&self) -> f64 {
        match *self {
            ScriptedEvent::Move { at_ms, .. }
            | ScriptedEvent::Leave { at_ms }
            | ScriptedEvent::Resize { at_ms, .. } => at_ms,
        }
    }

    fn deliver(&self, host: &mut HeadlessHost) {
        match *self {
            ScriptedEvent::Move { at_ms, x, y } => {
                host.pointer_move(DVec2::new(x, y), at_ms);
            }
            ScriptedEvent::Leave { .. } => {
                host.pointer_leave();
            }
            ScriptedEvent::Resize {
                width,
                height,
                device_ratio,
                ..
            } => {
                host.set_container(width, height, device_ratio);
            }
        }
    }
}

/// Reproducible specification for a headless run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSpec {
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_device_ratio")]
    pub device_ratio: f64,
    pub seed: u64,
    pub frames: usize,
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default = "empty_object")]
    pub config: serde_json::Value,
    #[serde(default)]
    pub events: Vec<ScriptedEvent>,
}

/// Result of [`RunSpec::execute`]: the stopped field plus frame counts.
pub struct RunOutcome {
    /// The field after the last frame, already stopped. Its host holds the raster.
    pub field: HeadlessField,
    /// Frames that actually painted.
    pub frames_rendered: usize,
    /// Timestamp of the last frame.
    pub end_ms: f64,
}

impl RunSpec {
    /// A spec with ratio 1, 60 fps, default config, and no events.
    pub fn new(width: f64, height: f64, seed: u64, frames: usize) -> Self {
        Self {
            width,
            height,
            device_ratio: default_device_ratio(),
            seed,
            frames,
            fps: default_fps(),
            config: empty_object(),
            events: Vec::new(),
        }
    }

    /// Checks the container is usable and the config overrides parse.
    ///
    /// Unlike a live field, a run rejects a container smaller than one pixel,
    /// and one whose backing buffer would exceed [`Raster::MAX_SIDE`].
    pub fn validate(&self) -> Result<FieldConfig, FieldError> {
        let usable = |v: f64| v.is_finite() && v >= 1.0;
        if !usable(self.width) || !usable(self.height) {
            return Err(FieldError::InvalidDimensions);
        }
        if let Some(bad) = self.events.iter().find(|e| !e.at_ms().is_finite()) {
            return Err(FieldError::config("events", format!("non-finite time in {bad:?}")));
        }
        FrameClock::new(self.fps)?;
        let config = FieldConfig::from_json(&self.config)?;
        let ratio = SurfaceManager::new(config.max_ratio).clamp_ratio(self.device_ratio);
        let largest = Raster::MAX_SIDE as f64;
        if (self.width * ratio).floor() > largest || (self.height * ratio).floor() > largest {
            return Err(FieldError::InvalidDimensions);
        }
        Ok(config)
    }

    /// Mounts a field on a fresh [`HeadlessHost`] and drives it for `frames` refreshes.
    ///
    /// Events are delivered in time order, each just before the first refresh
    /// at or after its `at_ms`.
    pub fn execute(&self) -> Result<RunOutcome, FieldError> {
        let config = self.validate()?;
        let host = HeadlessHost::with_container(self.width, self.height, self.device_ratio);
        let mut field = Scheduler::new(config, host, Xorshift64::new(self.seed))?;
        let mut clock = FrameClock::new(self.fps)?;

        let mut events = self.events.clone();
        events.sort_by(|a, b| a.at_ms().total_cmp(&b.at_ms()));
        let mut pending = events.iter().peekable();

        field.start()?;
        let mut frames_rendered = 0;
        for _ in 0..self.frames {
            let next = clock.next_ms();
            while let Some(event) = pending.next_if(|e| e.at_ms() <= next) {
                event.deliver(field.host_mut());
            }
            if let Some(report) = clock.refresh(&mut field)? {
                if report.drawn.is_some() {
                    frames_rendered += 1;
                }
            }
        }
        field.stop();
        log::debug!(
            "run finished: {frames_rendered}/{} frames painted, seed {}",
            self.frames,
            self.seed
        );

        Ok(RunOutcome {
            field,
            frames_rendered,
            end_ms: clock.now_ms(),
        })
    }
}
