use serde::{Deserialize, Serialize};

use crate::dsp::BAND_COUNT;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/tenband/config.toml` or `~/.config/tenband/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `TENBAND__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub playback: PlaybackSettings,
    pub equalizer: EqualizerSettings,
    pub controls: ControlsSettings,
    pub library: LibrarySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Frames decoded and filtered per refill of the output buffer.
    /// Smaller blocks pick up gain changes and seeks sooner.
    pub block_frames: usize,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self { block_frames: 512 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether random order starts enabled.
    pub random: bool,
    /// Start the first track as soon as a playlist is loaded into an idle player.
    pub autoplay_on_load: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualizerSettings {
    /// Gains in dB for the ten bands, 32 Hz to 16 kHz.
    pub gains: Vec<f32>,
    /// Keep the last gains when the track changes instead of going flat.
    pub carry_over: bool,
}

impl Default for EqualizerSettings {
    fn default() -> Self {
        Self {
            gains: vec![0.0; BAND_COUNT],
            carry_over: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Seconds moved by the `forward` / `back` commands.
    pub seek_seconds: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self { seek_seconds: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
        }
    }
}
