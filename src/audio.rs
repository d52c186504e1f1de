//! Playback engine: the controller state machine, its thread, and the
//! adapters it drives.

mod controller;
mod events;
mod loader;
mod player;
mod sink;
mod thread;
mod types;

pub use controller::{Controller, sequential_step};
pub use events::{EventHub, PlayerEvent};
pub use loader::{RodioLoader, TrackLoader};
pub use player::Player;
pub use sink::{OutputSink, RodioSink};
pub use types::{
    Command, Direction, EndNotifier, PlaybackHandle, PlaybackInfo, PlaybackState, StreamEnd,
};
