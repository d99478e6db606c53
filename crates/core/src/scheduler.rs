//! The frame loop: mount/unmount lifecycle and one tick per display refresh.
//!
//! A [`Host`] supplies the platform pieces (surface measurement, listeners,
//! frame requests, a drawing target). The [`Scheduler`] owns the simulation
//! and is driven by the host calling [`Scheduler::tick`] from its frame
//! callback, or by a test calling it directly.

use glam::DVec2;

use crate::command::{Command, CommandSender, Inbox};
use crate::config::FieldConfig;
use crate::error::FieldError;
use crate::field::FieldState;
use crate::pointer::PointerState;
use crate::prng::RandomSource;
use crate::render::{DrawTarget, Renderer};
use crate::stepper::Stepper;
use crate::surface::{ResizeOutcome, SurfaceDimensions, SurfaceManager};

/// Container size as the host sees it right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub width: f64,
    pub height: f64,
    pub device_ratio: f64,
}

/// Platform services the loop needs.
///
/// Every method is called from the loop's own execution context. Teardown
/// methods must be idempotent.
pub trait Host {
    /// Logical container size and raw device pixel ratio, or `None` if the
    /// surface is not attached yet.
    fn measure(&self) -> Option<Measurement>;

    /// Resizes the backing buffer to `dims` and the displayed size to the logical size.
    fn apply_surface(&mut self, dims: &SurfaceDimensions);

    /// Installs global pointer and resize listeners that forward into `sender`.
    fn attach_listeners(&mut self, sender: CommandSender) -> Result<(), FieldError>;

    /// Removes every listener installed by `attach_listeners`.
    fn detach_listeners(&mut self);

    /// Asks for one more frame callback.
    fn request_frame(&mut self) -> Result<(), FieldError>;

    /// Cancels the pending frame callback, if any.
    fn cancel_frame(&mut self);

    /// The drawing context, or `None` if it is not available this frame.
    fn draw_target(&mut self) -> Option<&mut dyn DrawTarget>;
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// The loop was running when the tick arrived.
    pub mounted: bool,
    /// Commands drained from the inbox.
    pub commands: usize,
    /// The pointer deadline expired during this tick.
    pub pointer_released: bool,
    /// The field was stepped (the surface had a usable size).
    pub stepped: bool,
    /// Particles drawn, or `None` if nothing was painted.
    pub drawn: Option<usize>,
}

/// Owns the field and runs it on a [`Host`].
pub struct Scheduler<H, R> {
    config: FieldConfig,
    host: H,
    rng: R,
    surface: SurfaceManager,
    state: FieldState,
    pointer: PointerState,
    stepper: Stepper,
    renderer: Renderer,
    inbox: Inbox,
    running: bool,
    spawn_pending: bool,
}

impl<H: Host, R: RandomSource> Scheduler<H, R> {
    /// Builds a stopped scheduler. Fails only if `config` is invalid.
    pub fn new(config: FieldConfig, host: H, rng: R) -> Result<Self, FieldError> {
        config.validate()?;
        Ok(Self {
            surface: SurfaceManager::new(config.max_ratio),
            state: FieldState::new(&config),
            pointer: PointerState::new(config.pointer_idle_ms),
            stepper: Stepper::new(config.max_dt),
            renderer: Renderer::new(&config),
            inbox: Inbox::new(),
            running: false,
            spawn_pending: false,
            config,
            host,
            rng,
        })
    }

    /// Mounts the field: listeners, initial sizing, spawn, first frame request.
    ///
    /// Does nothing if already running. On failure everything attached so far
    /// is detached again and the scheduler stays stopped.
    pub fn start(&mut self) -> Result<(), FieldError> {
        if self.running {
            return Ok(());
        }
        self.inbox.drain();
        self.surface = SurfaceManager::new(self.config.max_ratio);
        self.state = FieldState::new(&self.config);
        self.pointer.reset();
        self.stepper.reset();
        self.spawn_pending = true;

        self.host.attach_listeners(self.inbox.sender())?;
        if let Some(m) = self.host.measure() {
            self.resize(m.width, m.height, m.device_ratio);
        }
        self.spawn_if_ready();
        if let Err(e) = self.host.request_frame() {
            self.host.detach_listeners();
            return Err(e);
        }
        self.running = true;
        log::info!(
            "particle field started ({} particles{})",
            self.config.particle_count,
            if self.spawn_pending { ", waiting for a sized surface" } else { "" }
        );
        Ok(())
    }

    /// Unmounts: cancels the pending frame, detaches listeners, drops the
    /// pointer deadline and any queued commands. Safe to call at any time.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.host.cancel_frame();
        self.host.detach_listeners();
        self.pointer.reset();
        self.inbox.drain();
        log::info!("particle field stopped");
    }

    /// Runs one frame at timestamp `ts` (milliseconds, monotonic).
    ///
    /// Drains queued commands first, so a resize that arrived between frames
    /// is visible to this step. A degenerate surface or a missing drawing
    /// context skips that part of the frame and the next frame is requested
    /// regardless. If that request fails the field is stopped before the
    /// error is returned.
    pub fn tick(&mut self, ts: f64) -> Result<TickReport, FieldError> {
        let mut report = TickReport::default();
        if !self.running {
            return Ok(report);
        }
        report.mounted = true;

        for command in self.inbox.drain() {
            self.apply(command);
            report.commands += 1;
        }
        report.pointer_released = self.pointer.poll(ts);
        self.spawn_if_ready();

        let tick = self.stepper.step(
            &mut self.state,
            self.pointer.active_position(),
            self.surface.bounds(),
            &self.config,
            ts,
        );
        report.stepped = tick.is_some();
        if report.stepped {
            if let Some(target) = self.host.draw_target() {
                report.drawn = Some(self.renderer.render(target, &self.state));
            } else {
                log::trace!("no drawing context at {ts}, retrying next frame");
            }
        }

        if let Err(e) = self.host.request_frame() {
            log::error!("frame request failed at {ts}, unmounting: {e}");
            self.stop();
            return Err(e);
        }
        Ok(report)
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Resize {
                width,
                height,
                device_ratio,
            } => self.resize(width, height, device_ratio),
            Command::PointerMove { client, at_ms } => {
                let position = self.surface.to_device(client);
                self.pointer.record_move(position, at_ms);
            }
            Command::PointerLeave => self.pointer.leave(),
        }
    }

    fn resize(&mut self, width: f64, height: f64, device_ratio: f64) {
        if let ResizeOutcome::Applied(dims) = self.surface.resize(width, height, device_ratio) {
            self.host.apply_surface(&dims);
        }
    }

    fn spawn_if_ready(&mut self) {
        if !self.spawn_pending {
            return;
        }
        if let Some(bounds) = self.surface.bounds() {
            self.state
                .spawn(self.config.particle_count, bounds, &self.config, &mut self.rng);
            self.spawn_pending = false;
        }
    }

    /// Whether the loop is currently mounted.
    pub fn is_mounted(&self) -> bool {
        self.running
    }

    /// A sender into this scheduler's inbox, for hosts that forward events themselves.
    pub fn sender(&self) -> CommandSender {
        self.inbox.sender()
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn state(&self) -> &FieldState {
        &self.state
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn surface(&self) -> Option<SurfaceDimensions> {
        self.surface.dimensions()
    }

    /// Simulation bounds in device pixels, once the surface has a size.
    pub fn bounds(&self) -> Option<DVec2> {
        self.surface.bounds()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}
