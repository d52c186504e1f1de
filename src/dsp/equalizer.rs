//! Ten-band graphic equalizer wrapped around a [`SampleStream`].
//!
//! The chain itself lives on the streaming side (it is what the output
//! device pulls). Everything the command side needs goes through a
//! [`ChainControl`]: gain updates are published as whole immutable
//! [`CoefficientSet`]s through an `ArcSwap`, so a pull only ever sees a
//! complete set; position and pending seeks travel through atomics.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use log::{debug, warn};
use rodio::Source;

use crate::error::{PlayerError, Result};

use super::biquad::{BiquadCoefficients, BiquadState};
use super::stream::SampleStream;

pub const BAND_COUNT: usize = 10;

/// Fixed center frequencies, low to high.
pub const BAND_CENTERS_HZ: [f32; BAND_COUNT] = [
    32.0, 64.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

pub const BAND_Q: f32 = 1.0;

pub const FLAT_GAINS: [f32; BAND_COUNT] = [0.0; BAND_COUNT];

const NO_SEEK: u64 = u64::MAX;

/// Called once when the chain runs dry, with the error text if the stream failed.
pub type EndHook = Box<dyn FnOnce(Option<String>) + Send>;

/// One consistent snapshot of all ten bands.
#[derive(Debug, Clone)]
pub struct CoefficientSet {
    version: u64,
    gains: [f32; BAND_COUNT],
    bands: [BiquadCoefficients; BAND_COUNT],
}

impl CoefficientSet {
    pub fn design(sample_rate: u32, gains: [f32; BAND_COUNT], version: u64) -> Self {
        let mut bands = [BiquadCoefficients::IDENTITY; BAND_COUNT];
        for (band, (&center, &gain)) in bands
            .iter_mut()
            .zip(BAND_CENTERS_HZ.iter().zip(gains.iter()))
        {
            *band = BiquadCoefficients::peaking(sample_rate, center, BAND_Q, gain);
        }
        Self {
            version,
            gains,
            bands,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn gains(&self) -> [f32; BAND_COUNT] {
        self.gains
    }

    pub fn bands(&self) -> &[BiquadCoefficients; BAND_COUNT] {
        &self.bands
    }
}

/// Check a gain vector and turn it into a fixed-size array.
pub fn validate_gains(gains: &[f32]) -> Result<[f32; BAND_COUNT]> {
    let arr: [f32; BAND_COUNT] = gains.try_into().map_err(|_| {
        PlayerError::validation(format!(
            "expected {BAND_COUNT} equalizer gains, got {}",
            gains.len()
        ))
    })?;
    if let Some(bad) = arr.iter().find(|g| !g.is_finite()) {
        return Err(PlayerError::validation(format!(
            "equalizer gain {bad} is not a finite number"
        )));
    }
    Ok(arr)
}

struct ChainShared {
    sample_rate: u32,
    channels: u16,
    total: Option<Duration>,
    coefficients: ArcSwap<CoefficientSet>,
    /// Interleaved samples delivered since the start of the track.
    samples: AtomicU64,
    /// Sample offset requested by a seek, or `NO_SEEK`.
    pending_seek: AtomicU64,
    /// Sample count from before the oldest unapplied seek.
    pre_seek: AtomicU64,
    finished: AtomicBool,
}

impl ChainShared {
    fn samples_for(&self, pos: Duration) -> u64 {
        let frames = (pos.as_secs_f64() * f64::from(self.sample_rate)).round() as u64;
        frames * u64::from(self.channels)
    }
}

/// Command-side handle to a live chain. Cheap to clone.
#[derive(Clone)]
pub struct ChainControl {
    shared: Arc<ChainShared>,
}

impl ChainControl {
    /// Replace all ten gains at once. On error the previous gains stay active.
    pub fn set_gains(&self, gains: &[f32]) -> Result<()> {
        let gains = validate_gains(gains)?;
        let sample_rate = self.shared.sample_rate;
        let previous = self
            .shared
            .coefficients
            .rcu(|current| CoefficientSet::design(sample_rate, gains, current.version + 1));
        debug!(
            "equalizer gains {:?} published as version {}",
            gains,
            previous.version + 1
        );
        Ok(())
    }

    pub fn gains(&self) -> [f32; BAND_COUNT] {
        self.shared.coefficients.load().gains
    }

    /// The set the next pull will use.
    pub fn coefficients(&self) -> Arc<CoefficientSet> {
        self.shared.coefficients.load_full()
    }

    pub fn position(&self) -> Duration {
        let frames = self.shared.samples.load(Ordering::Acquire) / u64::from(self.shared.channels);
        Duration::from_secs_f64(frames as f64 / f64::from(self.shared.sample_rate))
    }

    pub fn total_duration(&self) -> Option<Duration> {
        self.shared.total
    }

    /// Ask the streaming side to continue from `pos` on its next pull.
    pub fn seek_to(&self, pos: Duration) {
        let target = self.shared.samples_for(pos);
        // Reflect the target right away so position queries agree with the
        // request even while output is paused.
        let before = self.shared.samples.swap(target, Ordering::AcqRel);
        if self.shared.pending_seek.load(Ordering::Acquire) == NO_SEEK {
            self.shared.pre_seek.store(before, Ordering::Release);
        }
        self.shared.pending_seek.store(target, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }

    pub fn sample_rate(&self) -> u32 {
        self.shared.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.shared.channels
    }
}

/// Ten peaking filters in series over a sample stream.
pub struct EqualizerChain<S> {
    stream: S,
    shared: Arc<ChainShared>,
    /// Filter history per channel, per band.
    history: Vec<[BiquadState; BAND_COUNT]>,
    next_channel: usize,
    applied: Arc<CoefficientSet>,
    block: Vec<f32>,
    block_pos: usize,
    block_len: usize,
    on_end: Option<EndHook>,
    ended: bool,
}

impl<S: SampleStream> EqualizerChain<S> {
    /// Wrap `stream` with all bands flat. `block_frames` sets how many
    /// frames the `rodio::Source` side pulls per refill.
    pub fn new(stream: S, block_frames: usize) -> Self {
        let sample_rate = stream.sample_rate().max(1);
        let channels = stream.channels().max(1);
        let flat = Arc::new(CoefficientSet::design(sample_rate, FLAT_GAINS, 0));

        let shared = Arc::new(ChainShared {
            sample_rate,
            channels,
            total: stream.total_duration(),
            coefficients: ArcSwap::new(flat.clone()),
            samples: AtomicU64::new(0),
            pending_seek: AtomicU64::new(NO_SEEK),
            pre_seek: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        });

        let block_len = block_frames.max(1) * usize::from(channels);
        Self {
            stream,
            shared,
            history: vec![[BiquadState::default(); BAND_COUNT]; usize::from(channels)],
            next_channel: 0,
            applied: flat,
            block: vec![0.0; block_len],
            block_pos: 0,
            block_len: 0,
            on_end: None,
            ended: false,
        }
    }

    pub fn with_end_hook(mut self, hook: EndHook) -> Self {
        self.on_end = Some(hook);
        self
    }

    pub fn control(&self) -> ChainControl {
        ChainControl {
            shared: self.shared.clone(),
        }
    }

    /// The coefficient set used by the most recent `read`.
    pub fn applied(&self) -> &CoefficientSet {
        &self.applied
    }

    /// Pull up to `out.len()` samples through all ten bands.
    ///
    /// The coefficient snapshot is loaded once per call, so every sample of
    /// one read is filtered with the same set.
    pub fn read(&mut self, out: &mut [f32]) -> Result<usize> {
        self.apply_pending_seek();

        self.applied = self.shared.coefficients.load_full();
        let n = self.stream.read(out)?;

        let channels = self.history.len();
        let bands = &self.applied.bands;
        for sample in &mut out[..n] {
            let history = &mut self.history[self.next_channel];
            let mut x = f64::from(*sample);
            for (state, coeffs) in history.iter_mut().zip(bands.iter()) {
                x = state.process(coeffs, x);
            }
            *sample = x as f32;
            self.next_channel = (self.next_channel + 1) % channels;
        }

        self.shared.samples.fetch_add(n as u64, Ordering::AcqRel);
        Ok(n)
    }

    fn apply_pending_seek(&mut self) {
        let target = self.shared.pending_seek.swap(NO_SEEK, Ordering::AcqRel);
        if target == NO_SEEK {
            return;
        }

        let channels = u64::from(self.shared.channels);
        let frames = target / channels;
        let pos = Duration::from_secs_f64(frames as f64 / f64::from(self.shared.sample_rate));
        if let Err(e) = self.stream.seek(pos) {
            warn!("seek to {pos:?} failed: {e}");
            // The stream stayed where it was.
            let before = self.shared.pre_seek.load(Ordering::Acquire);
            self.shared.samples.store(before, Ordering::Release);
            return;
        }

        for h in &mut self.history {
            for state in h.iter_mut() {
                state.reset();
            }
        }
        self.next_channel = 0;
        self.shared.samples.store(frames * channels, Ordering::Release);
    }

    fn refill(&mut self) {
        let mut block = std::mem::take(&mut self.block);
        let result = self.read(&mut block);
        self.block = block;
        self.block_pos = 0;

        match result {
            Ok(0) => {
                self.block_len = 0;
                self.finish(None);
            }
            Ok(n) => self.block_len = n,
            Err(e) => {
                self.block_len = 0;
                self.finish(Some(e.to_string()));
            }
        }
    }

    fn finish(&mut self, error: Option<String>) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.shared.finished.store(true, Ordering::Release);
        if let Some(hook) = self.on_end.take() {
            hook(error);
        }
    }
}

impl<S: SampleStream> Iterator for EqualizerChain<S> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let at_frame_boundary = self.block_pos % self.history.len() == 0;
        if at_frame_boundary && self.shared.pending_seek.load(Ordering::Acquire) != NO_SEEK {
            // Drop what is buffered so the seek lands on this very pull.
            self.block_pos = self.block_len;
        }
        if self.block_pos >= self.block_len {
            if self.ended {
                return None;
            }
            self.refill();
            if self.block_len == 0 {
                return None;
            }
        }
        let sample = self.block[self.block_pos];
        self.block_pos += 1;
        Some(sample)
    }
}

impl<S: SampleStream> Source for EqualizerChain<S> {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> rodio::ChannelCount {
        self.shared.channels
    }

    fn sample_rate(&self) -> rodio::SampleRate {
        self.shared.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        self.shared.total
    }

    fn try_seek(&mut self, pos: Duration) -> std::result::Result<(), rodio::source::SeekError> {
        self.control().seek_to(pos);
        Ok(())
    }
}
