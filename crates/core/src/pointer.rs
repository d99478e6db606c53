//! Pointer state with an inactivity deadline.
//!
//! The deactivation "timer" is a deadline on the frame clock rather than a
//! platform timeout: it is re-armed by every move, cleared by a leave, and
//! checked at the top of each tick. Nothing is left pending after teardown.

use glam::DVec2;

/// Last known pointer position (device pixels) and whether it currently repels.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerState {
    position: DVec2,
    active: bool,
    deadline_ms: Option<f64>,
    idle_ms: f64,
}

impl PointerState {
    /// Creates an inactive pointer that deactivates `idle_ms` after its last move.
    pub fn new(idle_ms: f64) -> Self {
        Self {
            position: DVec2::ZERO,
            active: false,
            deadline_ms: None,
            idle_ms,
        }
    }

    /// Records a move at `at_ms`, activating the pointer and replacing any armed deadline.
    pub fn record_move(&mut self, position: DVec2, at_ms: f64) {
        self.position = position;
        self.active = true;
        self.deadline_ms = Some(at_ms + self.idle_ms);
    }

    /// The pointer left the tracked area: deactivate now.
    pub fn leave(&mut self) {
        self.active = false;
        self.deadline_ms = None;
    }

    /// Deactivates the pointer if its deadline has passed.
    ///
    /// Returns `true` only on the call that performs the deactivation.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.leave();
                true
            }
            _ => false,
        }
    }

    /// Back to the initial inactive state, dropping any armed deadline.
    pub fn reset(&mut self) {
        self.leave();
        self.position = DVec2::ZERO;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Position when active, for the stepper.
    pub fn active_position(&self) -> Option<DVec2> {
        self.active.then_some(self.position)
    }

    /// Armed deactivation deadline, if any.
    pub fn deadline_ms(&self) -> Option<f64> {
        self.deadline_ms
    }
}
