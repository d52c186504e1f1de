//! Signal path: peaking biquads and the ten-band equalizer chain.
//!
//! `stream` defines the decoded-audio abstraction the chain wraps,
//! `biquad` the per-band math and `equalizer` the chain plus its
//! lock-free control handle.

mod biquad;
mod equalizer;
mod stream;

pub use biquad::{BiquadCoefficients, BiquadState};
pub use equalizer::*;
pub use stream::SampleStream;
