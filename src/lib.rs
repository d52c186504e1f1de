//! A playlist player with a live ten-band equalizer.
//!
//! [`audio::Player`] is the entry point: it runs the playback controller on
//! its own thread, decodes with `rodio` and filters every track through a
//! [`dsp::EqualizerChain`] whose gains can change while it plays.

pub mod audio;
pub mod config;
pub mod dsp;
pub mod error;
pub mod library;
pub mod playlist;

#[cfg(test)]
mod testing;

pub use audio::{Player, PlayerEvent};
pub use config::Settings;
pub use error::{ErrorKind, LoadErrorKind, PlayerError, Result};
