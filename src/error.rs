//! Error types shared by the playback engine.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a track could not be turned into a sample stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// The file could not be opened or read.
    Io,
    /// No decoder understands the container or codec.
    UnsupportedFormat,
    /// The stream decoded partially and then broke.
    CorruptData,
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Io => "i/o failure",
            Self::UnsupportedFormat => "unsupported format",
            Self::CorruptData => "corrupt data",
        };
        f.write_str(s)
    }
}

/// Coarse error class carried by error notifications.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Load,
    Device,
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("index {index} out of range for playlist of {len}")]
    Index { index: usize, len: usize },

    #[error("cannot load {path:?} ({kind}): {message}")]
    Load {
        path: PathBuf,
        kind: LoadErrorKind,
        message: String,
    },

    #[error("output device error: {0}")]
    Device(String),

    /// The engine thread is gone; only seen through a `Player` whose
    /// thread panicked.
    #[error("playback engine is not running")]
    EngineGone,
}

impl PlayerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Index { .. } => ErrorKind::Validation,
            Self::Load { .. } => ErrorKind::Load,
            Self::Device(_) | Self::EngineGone => ErrorKind::Device,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;
