//! Turning a playlist path into a decoded sample stream.
//!
//! Decoding itself is `rodio`'s job; this module only opens the file,
//! maps failures onto [`LoadErrorKind`] and adapts the decoder to
//! [`SampleStream`].

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::prelude::AudioFile;
use log::debug;
use rodio::decoder::DecoderError;
use rodio::{Decoder, Source};

use crate::dsp::SampleStream;
use crate::error::{LoadErrorKind, PlayerError, Result};

pub trait TrackLoader {
    fn load(&mut self, path: &Path) -> Result<Box<dyn SampleStream>>;
}

/// Loads files from disk with `rodio`'s decoders.
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioLoader;

impl RodioLoader {
    pub fn new() -> Self {
        Self
    }
}

impl TrackLoader for RodioLoader {
    fn load(&mut self, path: &Path) -> Result<Box<dyn SampleStream>> {
        let file = File::open(path).map_err(|e| load_error(path, LoadErrorKind::Io, e))?;

        let decoder = Decoder::new(BufReader::new(file)).map_err(|e| {
            let kind = match e {
                DecoderError::UnrecognizedFormat => LoadErrorKind::UnsupportedFormat,
                _ => LoadErrorKind::CorruptData,
            };
            load_error(path, kind, e)
        })?;

        let total = decoder.total_duration().or_else(|| container_duration(path));
        debug!(
            "decoded {}: {} Hz, {} ch, {:?}",
            path.display(),
            decoder.sample_rate(),
            decoder.channels(),
            total
        );

        Ok(Box::new(DecodedStream {
            path: path.to_path_buf(),
            sample_rate: decoder.sample_rate(),
            channels: decoder.channels(),
            total,
            decoder,
        }))
    }
}

fn load_error(path: &Path, kind: LoadErrorKind, e: impl std::fmt::Display) -> PlayerError {
    PlayerError::Load {
        path: path.to_path_buf(),
        kind,
        message: e.to_string(),
    }
}

/// Duration from the container headers, for decoders that cannot tell.
fn container_duration(path: &Path) -> Option<Duration> {
    lofty::read_from_path(path)
        .ok()
        .map(|tagged| tagged.properties().duration())
        .filter(|d| !d.is_zero())
}

struct DecodedStream {
    path: PathBuf,
    decoder: Decoder<BufReader<File>>,
    sample_rate: u32,
    channels: u16,
    total: Option<Duration>,
}

impl SampleStream for DecodedStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn total_duration(&self) -> Option<Duration> {
        self.total
    }

    fn read(&mut self, buf: &mut [f32]) -> Result<usize> {
        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.decoder.next() {
                Some(sample) => {
                    *slot = sample;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    fn seek(&mut self, pos: Duration) -> Result<()> {
        self.decoder
            .try_seek(pos)
            .map_err(|e| load_error(&self.path, LoadErrorKind::CorruptData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = RodioLoader::new()
            .load(&dir.path().join("missing.mp3"))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            PlayerError::Load {
                kind: LoadErrorKind::Io,
                ..
            }
        ));
    }

    #[test]
    fn garbage_file_is_rejected_as_undecodable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        fs::write(&path, b"definitely not an mp3 frame").unwrap();

        let err = RodioLoader::new().load(&path).err().unwrap();
        match err {
            PlayerError::Load { kind, path: p, .. } => {
                assert_ne!(kind, LoadErrorKind::Io);
                assert_eq!(p, path);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
