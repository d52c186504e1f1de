//! The playback state machine.
//!
//! A `Controller` owns the playlist, the current index, the play state and
//! the control handle of the chain attached to the output. It runs on the
//! command thread only; the streaming side reaches it solely through
//! [`StreamEnd`] messages.

use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Settings;
use crate::dsp::{BAND_COUNT, ChainControl, EqualizerChain, FLAT_GAINS, validate_gains};
use crate::error::{LoadErrorKind, PlayerError, Result};
use crate::playlist::Playlist;

use super::events::{EventHub, PlayerEvent};
use super::loader::TrackLoader;
use super::sink::OutputSink;
use super::types::{
    Command, Direction, EndNotifier, PlaybackHandle, PlaybackInfo, PlaybackState, StreamEnd,
};

/// The chain currently attached to the output.
struct ActiveTrack {
    index: usize,
    generation: u64,
    control: ChainControl,
}

pub struct Controller<L, O> {
    loader: L,
    sink: O,
    playlist: Playlist,
    current: Option<usize>,
    state: PlaybackState,
    random: bool,
    active: Option<ActiveTrack>,
    generation: u64,
    /// Last accepted gains, re-applied to new chains when `carry_over` is set.
    gains: [f32; BAND_COUNT],
    /// Configured starting gains; what new chains get without `carry_over`.
    preset: [f32; BAND_COUNT],
    carry_over: bool,
    autoplay_on_load: bool,
    block_frames: usize,
    rng: StdRng,
    events: EventHub,
    info: PlaybackHandle,
    on_stream_end: EndNotifier,
    disposed: bool,
}

/// Index reached from `from` by one sequential step.
///
/// With no current index, stepping forward starts at the first track and
/// stepping back at the last.
pub fn sequential_step(from: Option<usize>, direction: Direction, len: usize) -> usize {
    debug_assert!(len > 0);
    match (direction, from) {
        (Direction::Forward, Some(i)) => (i + 1) % len,
        (Direction::Forward, None) => 0,
        (Direction::Backward, Some(i)) => (i + len - 1) % len,
        (Direction::Backward, None) => len - 1,
    }
}

impl<L: TrackLoader, O: OutputSink> Controller<L, O> {
    pub fn new(
        loader: L,
        sink: O,
        settings: &Settings,
        events: EventHub,
        info: PlaybackHandle,
        on_stream_end: EndNotifier,
    ) -> Self {
        let preset = validate_gains(&settings.equalizer.gains).unwrap_or_else(|e| {
            warn!("ignoring equalizer preset: {e}");
            FLAT_GAINS
        });

        let controller = Self {
            loader,
            sink,
            playlist: Playlist::new(),
            current: None,
            state: PlaybackState::Stopped,
            random: settings.playback.random,
            active: None,
            generation: 0,
            gains: preset,
            preset,
            carry_over: settings.equalizer.carry_over,
            autoplay_on_load: settings.playback.autoplay_on_load,
            block_frames: settings.audio.block_frames,
            rng: StdRng::from_entropy(),
            events,
            info,
            on_stream_end,
            disposed: false,
        };
        controller.publish();
        controller
    }

    /// Make random picks reproducible.
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::LoadPlaylist(paths) => self.load_playlist(paths),
            Command::Play => self.play(),
            Command::PlayTrack(path) => self.play_track(&path),
            Command::Pause => self.pause(),
            Command::Stop => self.stop(),
            Command::Next => self.next(),
            Command::Previous => self.previous(),
            Command::Seek(delta) => self.seek(delta),
            Command::SetRandom(enabled) => self.set_random(enabled),
            Command::SetEqualizer(gains) => self.set_equalizer(&gains),
        }
    }

    pub fn load_playlist<I, P>(&mut self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<std::path::PathBuf>,
    {
        self.ensure_live();
        let added = match self.playlist.merge(paths) {
            Ok(n) => n,
            Err(e) => return self.fail(e),
        };
        debug!("playlist: {added} added, {} total", self.playlist.len());
        if let Ok(mut info) = self.info.lock() {
            info.playlist = self.playlist.paths().to_vec();
        }

        if self.autoplay_on_load && self.active.is_none() {
            return self.play();
        }
        Ok(())
    }

    pub fn play(&mut self) -> Result<()> {
        self.ensure_live();
        if self.state == PlaybackState::Playing {
            return Ok(());
        }
        if self.active.is_some() {
            return self.resume();
        }
        if self.playlist.is_empty() {
            return self.fail(PlayerError::validation("playlist is empty"));
        }
        let index = self.current.unwrap_or(0);
        self.switch_to(index)
    }

    pub fn play_track(&mut self, path: &Path) -> Result<()> {
        self.ensure_live();
        if path.as_os_str().is_empty() {
            return self.fail(PlayerError::validation("empty track path"));
        }
        let Some(index) = self.playlist.index_of(path) else {
            return self.fail(PlayerError::validation(format!(
                "{} is not in the playlist",
                path.display()
            )));
        };

        let already_current = self.active.as_ref().is_some_and(|a| a.index == index);
        if already_current {
            if self.state == PlaybackState::Playing {
                return Ok(());
            }
            return self.resume();
        }
        self.switch_to(index)
    }

    pub fn pause(&mut self) -> Result<()> {
        self.ensure_live();
        if self.state == PlaybackState::Playing {
            self.sink.pause();
            self.set_state(PlaybackState::Paused);
        }
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        self.ensure_live();
        self.teardown();
        self.set_state(PlaybackState::Stopped);
        Ok(())
    }

    pub fn next(&mut self) -> Result<()> {
        self.ensure_live();
        self.advance(Direction::Forward)
    }

    pub fn previous(&mut self) -> Result<()> {
        self.ensure_live();
        self.advance(Direction::Backward)
    }

    /// Move the position by `delta_seconds`, clamped to the track bounds.
    pub fn seek(&mut self, delta_seconds: f64) -> Result<()> {
        self.ensure_live();
        if !delta_seconds.is_finite() {
            return self.fail(PlayerError::validation(format!(
                "cannot seek by {delta_seconds} seconds"
            )));
        }
        let Some(active) = self.active.as_ref() else {
            return Ok(());
        };

        let control = &active.control;
        let mut target = (control.position().as_secs_f64() + delta_seconds).max(0.0);
        if let Some(total) = control.total_duration() {
            target = target.min(total.as_secs_f64());
        }
        debug!("seek by {delta_seconds}s to {target:.3}s");
        control.seek_to(Duration::from_secs_f64(target));
        Ok(())
    }

    pub fn set_random(&mut self, enabled: bool) -> Result<()> {
        self.ensure_live();
        self.random = enabled;
        self.publish();
        Ok(())
    }

    pub fn set_equalizer(&mut self, gains: &[f32]) -> Result<()> {
        self.ensure_live();
        let Some(active) = self.active.as_ref() else {
            return self.fail(PlayerError::validation("no track loaded"));
        };
        if let Err(e) = active.control.set_gains(gains) {
            return self.fail(e);
        }
        self.gains = active.control.gains();
        Ok(())
    }

    /// React to the attached chain running dry.
    ///
    /// Notifications for chains that were already replaced are ignored.
    pub fn handle_stream_end(&mut self, end: StreamEnd) {
        if self.disposed {
            return;
        }
        let Some(active) = self.active.as_ref() else {
            return;
        };
        if active.generation != end.generation {
            debug!(
                "ignoring end of stale stream {} (current {})",
                end.generation, active.generation
            );
            return;
        }

        if let Some(message) = end.error {
            let path = self
                .playlist
                .get(active.index)
                .map(Path::to_path_buf)
                .unwrap_or_default();
            self.events.report(&PlayerError::Load {
                path,
                kind: LoadErrorKind::CorruptData,
                message,
            });
        }

        if self.advance(Direction::Forward).is_err() {
            // Nothing else would load; the finished chain is of no use.
            self.teardown();
            self.set_state(PlaybackState::Stopped);
        }
    }

    /// Terminal: release the output and refuse further commands.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.teardown();
        self.set_state(PlaybackState::Stopped);
        self.disposed = true;
        info!("playback engine disposed");
    }

    pub fn current_position(&self) -> Duration {
        self.active
            .as_ref()
            .map_or(Duration::ZERO, |a| a.control.position())
    }

    pub fn total_duration(&self) -> Duration {
        self.active
            .as_ref()
            .and_then(|a| a.control.total_duration())
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn is_random(&self) -> bool {
        self.random
    }

    pub fn gains(&self) -> [f32; BAND_COUNT] {
        self.gains
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn ensure_live(&self) {
        assert!(!self.disposed, "playback controller used after dispose()");
    }

    fn fail<T>(&self, err: PlayerError) -> Result<T> {
        self.events.report(&err);
        Err(err)
    }

    fn resume(&mut self) -> Result<()> {
        if let Err(e) = self.sink.start() {
            return self.fail(e);
        }
        self.set_state(PlaybackState::Playing);
        Ok(())
    }

    /// Try candidates in policy order until one loads, at most one pass
    /// over the playlist. Every failure has been reported by the time this
    /// returns; on total failure the state is as it was.
    fn advance(&mut self, direction: Direction) -> Result<()> {
        let len = self.playlist.len();
        if len == 0 {
            return Ok(());
        }

        let mut from = self.current;
        let mut last_err = None;
        for _ in 0..len {
            // Random order only picks forward; going back always steps.
            let candidate = if self.random && direction == Direction::Forward {
                self.rng.gen_range(0..len)
            } else {
                sequential_step(from, direction, len)
            };
            match self.switch_to(candidate) {
                Ok(()) => return Ok(()),
                Err(e @ PlayerError::Load { .. }) => {
                    last_err = Some(e);
                    from = Some(candidate);
                }
                Err(e) => return Err(e),
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Load `index` and make it the attached, playing track.
    ///
    /// The new stream is fully loaded before anything about the current
    /// track changes, so a load failure leaves playback untouched.
    fn switch_to(&mut self, index: usize) -> Result<()> {
        let path = match self.playlist.get(index) {
            Ok(p) => p.to_path_buf(),
            Err(e) => return self.fail(e),
        };

        let settled = self.state;
        self.state = PlaybackState::Loading;
        self.publish();

        let stream = match self.loader.load(&path) {
            Ok(s) => s,
            Err(e) => {
                self.state = settled;
                self.publish();
                return self.fail(e);
            }
        };

        self.generation += 1;
        let generation = self.generation;
        let notify = self.on_stream_end.clone();
        let chain = EqualizerChain::new(stream, self.block_frames)
            .with_end_hook(Box::new(move |error| notify(StreamEnd { generation, error })));
        let control = chain.control();
        let initial = if self.carry_over {
            self.gains
        } else {
            self.preset
        };
        if initial != FLAT_GAINS {
            if let Err(e) = control.set_gains(&initial) {
                warn!("could not apply equalizer gains to new track: {e}");
            }
        }

        if let Err(e) = self.sink.attach(chain) {
            self.teardown();
            self.set_state(PlaybackState::Stopped);
            return self.fail(e);
        }
        self.active = Some(ActiveTrack {
            index,
            generation,
            control,
        });
        self.current = Some(index);
        info!("track #{index}: {}", path.display());
        self.events.emit(PlayerEvent::TrackChanged(index));

        if let Err(e) = self.sink.start() {
            self.set_state(PlaybackState::Paused);
            return self.fail(e);
        }
        self.state = PlaybackState::Playing;
        self.publish();
        self.events.emit(PlayerEvent::PlaybackStateChanged(true));
        Ok(())
    }

    fn teardown(&mut self) {
        if self.active.take().is_some() {
            self.sink.stop();
        }
    }

    /// Commit a settled state, notifying when "is playing" flips.
    fn set_state(&mut self, state: PlaybackState) {
        let was_playing = self.state == PlaybackState::Playing;
        self.state = state;
        self.publish();
        let playing = state == PlaybackState::Playing;
        if was_playing != playing {
            self.events.emit(PlayerEvent::PlaybackStateChanged(playing));
        }
    }

    fn publish(&self) {
        if let Ok(mut info) = self.info.lock() {
            let PlaybackInfo {
                state,
                index,
                random,
                chain,
                ..
            } = &mut *info;
            *state = self.state;
            *index = self.current;
            *random = self.random;
            *chain = self.active.as_ref().map(|a| a.control.clone());
        }
    }
}
