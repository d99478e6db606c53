#![deny(unsafe_code)]
//! Headless host for the driftfield core.
//!
//! [`HeadlessHost`] stands in for a browser: it owns a CPU [`Raster`], keeps
//! the listeners the scheduler attaches, and only lets a frame through when
//! one was requested. [`FrameClock`] plays the display refresh. Together they
//! drive the real [`Scheduler`] for the CLI, scripted runs, and tests.

pub mod pixel;
pub mod run;

#[cfg(feature = "png")]
pub mod snapshot;

use driftfield_core::{
    Command, CommandSender, DrawTarget, FieldError, Host, Measurement, Raster, RandomSource,
    Scheduler, SurfaceDimensions, TickReport, Xorshift64,
};
use glam::DVec2;

/// A scheduler running on a [`HeadlessHost`] with the seeded PRNG.
pub type HeadlessField = Scheduler<HeadlessHost, Xorshift64>;

/// In-memory host: a container size, a raster, and the attached listeners.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    container: Option<Measurement>,
    raster: Option<Raster>,
    listeners: Vec<CommandSender>,
    frame_pending: bool,
    frames_requested: u64,
    context_lost: bool,
}

impl HeadlessHost {
    /// A host whose surface is not attached to any container yet.
    pub fn detached() -> Self {
        Self::default()
    }

    /// A host inside a container of the given logical size.
    pub fn with_container(width: f64, height: f64, device_ratio: f64) -> Self {
        Self {
            container: Some(Measurement {
                width,
                height,
                device_ratio,
            }),
            ..Self::default()
        }
    }

    /// Changes the container size and notifies listeners, as a resize observer would.
    ///
    /// Returns the number of listeners notified.
    pub fn set_container(&mut self, width: f64, height: f64, device_ratio: f64) -> usize {
        self.container = Some(Measurement {
            width,
            height,
            device_ratio,
        });
        self.dispatch(Command::Resize {
            width,
            height,
            device_ratio,
        })
    }

    /// Sends a global pointer move to every attached listener.
    pub fn pointer_move(&self, client: DVec2, at_ms: f64) -> usize {
        self.dispatch(Command::PointerMove { client, at_ms })
    }

    /// Sends a viewport-leave to every attached listener.
    pub fn pointer_leave(&self) -> usize {
        self.dispatch(Command::PointerLeave)
    }

    /// Delivers `command` to every attached listener; returns how many received it.
    pub fn dispatch(&self, command: Command) -> usize {
        self.listeners.iter().filter(|l| l.send(command)).count()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Total frame requests since construction.
    pub fn frames_requested(&self) -> u64 {
        self.frames_requested
    }

    /// Consumes the pending frame request, if there is one.
    pub fn take_frame(&mut self) -> bool {
        std::mem::take(&mut self.frame_pending)
    }

    /// The backing raster, once the surface has been sized.
    pub fn raster(&self) -> Option<&Raster> {
        self.raster.as_ref()
    }

    /// Simulates losing (or regaining) the drawing context.
    pub fn set_context_lost(&mut self, lost: bool) {
        self.context_lost = lost;
    }
}

impl Host for HeadlessHost {
    fn measure(&self) -> Option<Measurement> {
        self.container
    }

    fn apply_surface(&mut self, dims: &SurfaceDimensions) {
        let (w, h) = (dims.backing_width() as usize, dims.backing_height() as usize);
        match Raster::new(w, h) {
            Ok(raster) => self.raster = Some(raster),
            Err(e) => log::warn!("cannot allocate {w}x{h} raster: {e}"),
        }
    }

    fn attach_listeners(&mut self, sender: CommandSender) -> Result<(), FieldError> {
        self.listeners.push(sender);
        Ok(())
    }

    fn detach_listeners(&mut self) {
        self.listeners.clear();
    }

    fn request_frame(&mut self) -> Result<(), FieldError> {
        self.frame_pending = true;
        self.frames_requested += 1;
        Ok(())
    }

    fn cancel_frame(&mut self) {
        self.frame_pending = false;
    }

    fn draw_target(&mut self) -> Option<&mut dyn DrawTarget> {
        if self.context_lost {
            return None;
        }
        self.raster.as_mut().map(|r| r as &mut dyn DrawTarget)
    }
}

/// A fixed-rate stand-in for the display refresh.
#[derive(Debug, Clone)]
pub struct FrameClock {
    now_ms: f64,
    interval_ms: f64,
}

impl FrameClock {
    /// A clock at time 0 refreshing `fps` times per second.
    pub fn new(fps: f64) -> Result<Self, FieldError> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(FieldError::config("fps", format!("must be finite and > 0, got {fps}")));
        }
        Ok(Self {
            now_ms: 0.0,
            interval_ms: 1000.0 / fps,
        })
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Timestamp of the next refresh.
    pub fn next_ms(&self) -> f64 {
        self.now_ms + self.interval_ms
    }

    /// Moves the clock forward without a refresh, e.g. a backgrounded tab.
    pub fn skip(&mut self, ms: f64) {
        self.now_ms += ms.max(0.0);
    }

    /// Advances to the next refresh and ticks `field` if it asked for a frame.
    ///
    /// Returns `None` when no frame was pending (the field is stopped).
    pub fn refresh<R: RandomSource>(
        &mut self,
        field: &mut Scheduler<HeadlessHost, R>,
    ) -> Result<Option<TickReport>, FieldError> {
        self.now_ms = self.next_ms();
        if !field.host_mut().take_frame() {
            return Ok(None);
        }
        field.tick(self.now_ms).map(Some)
    }
}
