//! Commands from event listeners to the frame loop.
//!
//! Listeners never touch simulation state. They send a [`Command`] through a
//! [`CommandSender`], and the scheduler drains the [`Inbox`] at the top of each
//! tick, so every step works from one consistent snapshot even when events
//! are dispatched from elsewhere.

use std::sync::mpsc::{self, Receiver, Sender};

use glam::DVec2;

/// A state change requested by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// The container now measures `width x height` CSS pixels at `device_ratio`.
    Resize {
        width: f64,
        height: f64,
        device_ratio: f64,
    },
    /// The pointer moved to `client` (CSS pixels, viewport space) at `at_ms` on the frame clock.
    PointerMove { client: DVec2, at_ms: f64 },
    /// The pointer left the viewport.
    PointerLeave,
}

/// Cloneable handle listeners use to enqueue commands.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Enqueues `command`. Returns `false` if the loop is gone.
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }
}

/// Receiving side, owned by the scheduler.
#[derive(Debug)]
pub struct Inbox {
    tx: Sender<Command>,
    rx: Receiver<Command>,
}

impl Default for Inbox {
    fn default() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new sender feeding this inbox.
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            tx: self.tx.clone(),
        }
    }

    /// Takes every queued command in arrival order.
    pub fn drain(&self) -> Vec<Command> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_order_and_empties() {
        let inbox = Inbox::new();
        let a = inbox.sender();
        let b = inbox.sender();
        assert!(a.send(Command::PointerLeave));
        assert!(b.send(Command::PointerMove {
            client: DVec2::new(1.0, 2.0),
            at_ms: 5.0,
        }));
        let drained = inbox.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], Command::PointerLeave);
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn send_after_inbox_dropped_reports_false() {
        let inbox = Inbox::new();
        let sender = inbox.sender();
        drop(inbox);
        assert!(!sender.send(Command::PointerLeave));
    }

    #[test]
    fn sender_works_across_threads() {
        let inbox = Inbox::new();
        let sender = inbox.sender();
        std::thread::spawn(move || {
            sender.send(Command::Resize {
                width: 800.0,
                height: 600.0,
                device_ratio: 1.0,
            });
        })
        .join()
        .unwrap();
        assert_eq!(inbox.drain().len(), 1);
    }
}
