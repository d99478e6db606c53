#![deny(unsafe_code)]
//! Core of the driftfield particle background.
//!
//! Particles drift under the pull of orbiting attractors, are pushed away by
//! the pointer, and wrap around the surface edges. This crate holds the whole
//! simulation: [`SurfaceManager`] (logical vs device pixels), [`FieldState`],
//! the [`stepper`], the [`Renderer`] and its [`DrawTarget`] seam, and the
//! [`Scheduler`] that runs them on a platform [`Host`].

pub mod color;
pub mod command;
pub mod config;
pub mod error;
pub mod field;
pub mod params;
pub mod pointer;
pub mod prng;
pub mod raster;
pub mod render;
pub mod scheduler;
pub mod stepper;
pub mod surface;

pub use color::Srgb;
pub use command::{Command, CommandSender, Inbox};
pub use config::{AttractorConfig, FieldConfig};
pub use error::FieldError;
pub use field::{Attractor, FieldState, Particle};
pub use pointer::PointerState;
pub use prng::{RandomSource, Xorshift64};
pub use raster::Raster;
pub use render::{DrawTarget, Renderer};
pub use scheduler::{Host, Measurement, Scheduler, TickReport};
pub use stepper::{Stepper, Tick};
pub use surface::{ResizeOutcome, SurfaceDimensions, SurfaceManager};
