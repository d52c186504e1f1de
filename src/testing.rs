//! In-memory stand-ins for the decoder and the output device.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::audio::{OutputSink, TrackLoader};
use crate::dsp::{ChainControl, EqualizerChain, SampleStream};
use crate::error::{LoadErrorKind, PlayerError, Result};

/// Deterministic test signal: one sine per channel, optionally finite.
pub struct ToneStream {
    sample_rate: u32,
    channels: u16,
    /// Length in interleaved samples; `None` never ends.
    len: Option<usize>,
    /// Fail with a decode error once this many samples were produced.
    fail_at: Option<usize>,
    seekable: bool,
    pos: usize,
}

impl ToneStream {
    pub fn endless(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            len: None,
            fail_at: None,
            seekable: true,
            pos: 0,
        }
    }

    pub fn with_duration(sample_rate: u32, channels: u16, duration: Duration) -> Self {
        let frames = (duration.as_secs_f64() * f64::from(sample_rate)).round() as usize;
        Self {
            len: Some(frames * usize::from(channels)),
            ..Self::endless(sample_rate, channels)
        }
    }

    pub fn failing_after(mut self, samples: usize) -> Self {
        self.fail_at = Some(samples);
        self
    }

    /// Every seek fails and leaves the read position alone.
    pub fn unseekable(mut self) -> Self {
        self.seekable = false;
        self
    }

    /// Value of interleaved sample `i`.
    pub fn sample_at(channels: u16, i: usize) -> f32 {
        let ch = i % usize::from(channels);
        let frame = i / usize::from(channels);
        (0.5 * ((frame as f64) * 0.05 + ch as f64 * 0.3).sin()) as f32
    }
}

impl SampleStream for ToneStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn total_duration(&self) -> Option<Duration> {
        self.len.map(|len| {
            let frames = len / usize::from(self.channels);
            Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
        })
    }

    fn read(&mut self, buf: &mut [f32]) -> Result<usize> {
        if self.fail_at.is_some_and(|at| self.pos >= at) {
            return Err(PlayerError::Load {
                path: PathBuf::from("tone"),
                kind: LoadErrorKind::CorruptData,
                message: "synthetic decode failure".into(),
            });
        }
        let remaining = self.len.map_or(usize::MAX, |len| len.saturating_sub(self.pos));
        let n = buf.len().min(remaining);
        for (k, slot) in buf[..n].iter_mut().enumerate() {
            *slot = Self::sample_at(self.channels, self.pos + k);
        }
        self.pos += n;
        Ok(n)
    }

    fn seek(&mut self, pos: Duration) -> Result<()> {
        if !self.seekable {
            return Err(PlayerError::Load {
                path: PathBuf::from("tone"),
                kind: LoadErrorKind::CorruptData,
                message: "stream cannot seek".into(),
            });
        }
        let frames = (pos.as_secs_f64() * f64::from(self.sample_rate)).round() as usize;
        let target = frames * usize::from(self.channels);
        self.pos = self.len.map_or(target, |len| target.min(len));
        Ok(())
    }
}

/// Loader serving `ToneStream`s for known paths; anything in `broken`
/// fails to load.
#[derive(Clone, Default)]
pub struct FakeLoader {
    pub durations: Arc<Mutex<HashMap<PathBuf, Duration>>>,
    pub broken: Arc<Mutex<HashSet<PathBuf>>>,
    /// Streams that fail with a decode error after this many samples.
    pub failing: Arc<Mutex<HashMap<PathBuf, usize>>>,
    pub loads: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeLoader {
    pub fn with_tracks(paths: &[&str], duration: Duration) -> Self {
        let loader = Self::default();
        {
            let mut d = loader.durations.lock().unwrap();
            for p in paths {
                d.insert(PathBuf::from(p), duration);
            }
        }
        loader
    }

    pub fn break_track(&self, path: &str) {
        self.broken.lock().unwrap().insert(PathBuf::from(path));
    }

    pub fn fail_midway(&self, path: &str, samples: usize) {
        self.failing
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), samples);
    }

    pub fn load_count(&self) -> usize {
        self.loads.lock().unwrap().len()
    }
}

impl TrackLoader for FakeLoader {
    fn load(&mut self, path: &Path) -> Result<Box<dyn SampleStream>> {
        self.loads.lock().unwrap().push(path.to_path_buf());
        if self.broken.lock().unwrap().contains(path) {
            return Err(PlayerError::Load {
                path: path.to_path_buf(),
                kind: LoadErrorKind::UnsupportedFormat,
                message: "no decoder for this file".into(),
            });
        }
        let duration = self
            .durations
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .ok_or_else(|| PlayerError::Load {
                path: path.to_path_buf(),
                kind: LoadErrorKind::Io,
                message: "no such file".into(),
            })?;
        let mut stream = ToneStream::with_duration(100, 1, duration);
        if let Some(&at) = self.failing.lock().unwrap().get(path) {
            stream = stream.failing_after(at);
        }
        Ok(Box::new(stream))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Attach,
    Start,
    Pause,
    Stop,
}

/// Output sink that keeps the attached chain so tests can pull it by hand.
#[derive(Clone, Default)]
pub struct FakeSink {
    pub calls: Arc<Mutex<Vec<SinkCall>>>,
    pub chain: Arc<Mutex<Option<EqualizerChain<Box<dyn SampleStream>>>>>,
    pub fail_start: Arc<Mutex<bool>>,
}

impl FakeSink {
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn has_chain(&self) -> bool {
        self.chain.lock().unwrap().is_some()
    }

    /// Pull up to `samples` samples from the attached chain the way the
    /// mixer does, so running dry fires the end hook.
    pub fn pull(&self, samples: usize) -> usize {
        let mut guard = self.chain.lock().unwrap();
        let chain = guard.as_mut().expect("no chain attached");
        chain.by_ref().take(samples).count()
    }

    pub fn control(&self) -> Option<ChainControl> {
        self.chain.lock().unwrap().as_ref().map(|c| c.control())
    }
}

impl OutputSink for FakeSink {
    fn attach(&mut self, chain: EqualizerChain<Box<dyn SampleStream>>) -> Result<()> {
        self.calls.lock().unwrap().push(SinkCall::Attach);
        *self.chain.lock().unwrap() = Some(chain);
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.calls.lock().unwrap().push(SinkCall::Start);
        if *self.fail_start.lock().unwrap() {
            return Err(PlayerError::Device("device unplugged".into()));
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.calls.lock().unwrap().push(SinkCall::Pause);
    }

    fn stop(&mut self) {
        self.calls.lock().unwrap().push(SinkCall::Stop);
        *self.chain.lock().unwrap() = None;
    }
}
