//! Notification fan-out.
//!
//! Every subscriber gets its own `mpsc` receiver. Events are sent from the
//! engine thread, both for commands and for end-of-stream handling;
//! consumers should not rely on that and must not block the sender.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use log::{debug, warn};

use crate::error::{ErrorKind, PlayerError};

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// A new track is attached to the output.
    TrackChanged(usize),
    PlaybackStateChanged(bool),
    ErrorOccurred { message: String, kind: ErrorKind },
}

#[derive(Clone, Default)]
pub struct EventHub {
    subscribers: Arc<Mutex<Vec<Sender<PlayerEvent>>>>,
}

impl EventHub {
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        rx
    }

    pub fn emit(&self, event: PlayerEvent) {
        debug!("event: {event:?}");
        if let Ok(mut subs) = self.subscribers.lock() {
            // Dropped receivers unsubscribe implicitly.
            subs.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    pub fn report(&self, err: &PlayerError) {
        warn!("{err}");
        self.emit(PlayerEvent::ErrorOccurred {
            message: err.to_string(),
            kind: err.kind(),
        });
    }
}
