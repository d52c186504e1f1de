use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use log::debug;

use crate::config::Settings;
use crate::error::{PlayerError, Result};

use super::events::{EventHub, PlayerEvent};
use super::loader::{RodioLoader, TrackLoader};
use super::sink::{OutputSink, RodioSink};
use super::thread::spawn_engine_thread;
use super::types::{AudioCmd, Command, PlaybackHandle, PlaybackInfo, PlaybackState};

/// Handle to a playback engine running on its own thread.
///
/// Commands block until the engine has applied them. Queries read a
/// snapshot the engine publishes after every change and never wait on it.
pub struct Player {
    tx: Sender<AudioCmd>,
    playback: PlaybackHandle,
    events: EventHub,
    join: Option<JoinHandle<()>>,
}

impl Player {
    /// Play through the default output device, decoding files from disk.
    pub fn open_default(settings: &Settings) -> Result<Self> {
        Self::spawn(RodioLoader::new(), RodioSink::open_default, settings)
    }

    pub fn spawn<L, O, F>(loader: L, open_sink: F, settings: &Settings) -> Result<Self>
    where
        L: TrackLoader + Send + 'static,
        O: OutputSink,
        F: FnOnce() -> Result<O> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let playback: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo::default()));
        let events = EventHub::default();

        let join = spawn_engine_thread(
            loader,
            open_sink,
            settings.clone(),
            tx.clone(),
            rx,
            events.clone(),
            playback.clone(),
        )?;

        Ok(Self {
            tx,
            playback,
            events,
            join: Some(join),
        })
    }

    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.playback.clone()
    }

    fn request(&self, command: Command) -> Result<()> {
        let (reply, response) = mpsc::channel();
        self.tx
            .send(AudioCmd::Request { command, reply })
            .map_err(|_| PlayerError::EngineGone)?;
        response.recv().map_err(|_| PlayerError::EngineGone)?
    }

    fn snapshot<T>(&self, f: impl FnOnce(&PlaybackInfo) -> T) -> T
    where
        T: Default,
    {
        self.playback.lock().map(|info| f(&*info)).unwrap_or_default()
    }

    pub fn load_playlist<I, P>(&self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let paths = paths.into_iter().map(Into::into).collect();
        self.request(Command::LoadPlaylist(paths))
    }

    pub fn play(&self) -> Result<()> {
        self.request(Command::Play)
    }

    pub fn play_track(&self, path: impl AsRef<Path>) -> Result<()> {
        self.request(Command::PlayTrack(path.as_ref().to_path_buf()))
    }

    pub fn pause(&self) -> Result<()> {
        self.request(Command::Pause)
    }

    pub fn stop(&self) -> Result<()> {
        self.request(Command::Stop)
    }

    pub fn next(&self) -> Result<()> {
        self.request(Command::Next)
    }

    pub fn previous(&self) -> Result<()> {
        self.request(Command::Previous)
    }

    pub fn seek(&self, delta_seconds: f64) -> Result<()> {
        self.request(Command::Seek(delta_seconds))
    }

    pub fn set_random(&self, enabled: bool) -> Result<()> {
        self.request(Command::SetRandom(enabled))
    }

    pub fn set_equalizer(&self, gains: &[f32]) -> Result<()> {
        self.request(Command::SetEqualizer(gains.to_vec()))
    }

    pub fn playlist(&self) -> Vec<PathBuf> {
        self.snapshot(|info| info.playlist.clone())
    }

    pub fn current_position(&self) -> Duration {
        self.snapshot(|info| info.chain.as_ref().map(|c| c.position()).unwrap_or_default())
    }

    pub fn total_duration(&self) -> Duration {
        self.snapshot(|info| {
            info.chain
                .as_ref()
                .and_then(|c| c.total_duration())
                .unwrap_or_default()
        })
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    pub fn state(&self) -> PlaybackState {
        self.snapshot(|info| info.state)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.snapshot(|info| info.index)
    }

    pub fn is_random(&self) -> bool {
        self.snapshot(|info| info.random)
    }

    /// Gains currently applied to the attached track, if there is one.
    pub fn equalizer(&self) -> Option<[f32; crate::dsp::BAND_COUNT]> {
        self.snapshot(|info| info.chain.as_ref().map(|c| c.gains()))
    }

    /// Stop playback, release the output and wait for the engine to exit.
    pub fn dispose(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.tx.send(AudioCmd::Quit);
        if let Some(h) = self.join.take() {
            let _ = h.join();
            debug!("engine thread joined");
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.shutdown();
    }
}
