//! Audio-related small types and handles.
//!
//! Playback state, the commands the engine thread accepts, and the shared
//! snapshot the front-end reads without a round trip.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::dsp::ChainControl;
use crate::error::Result;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    /// A track is being decoded; only visible while a command is in flight.
    Loading,
    Playing,
    Paused,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone)]
pub enum Command {
    /// Merge paths into the playlist.
    LoadPlaylist(Vec<PathBuf>),
    /// Start or resume playback.
    Play,
    /// Play a specific playlist entry.
    PlayTrack(PathBuf),
    Pause,
    Stop,
    Next,
    Previous,
    /// Move the play position by this many seconds (positive or negative).
    Seek(f64),
    SetRandom(bool),
    /// Replace all ten equalizer gains (dB).
    SetEqualizer(Vec<f32>),
}

/// The chain of generation `generation` ran dry; `error` is set when the
/// stream failed instead of finishing.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEnd {
    pub generation: u64,
    pub error: Option<String>,
}

/// Delivered from the streaming thread when a chain runs dry.
pub type EndNotifier = Arc<dyn Fn(StreamEnd) + Send + Sync>;

pub(crate) enum AudioCmd {
    Request {
        command: Command,
        reply: Sender<Result<()>>,
    },
    StreamEnded(StreamEnd),
    Quit,
}

/// Runtime playback information shared with the front-end.
#[derive(Clone, Default)]
pub struct PlaybackInfo {
    pub state: PlaybackState,
    /// Playlist index of the current track, if any.
    pub index: Option<usize>,
    pub random: bool,
    pub playlist: Vec<PathBuf>,
    /// Control handle of the chain currently attached to the output.
    pub chain: Option<ChainControl>,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
