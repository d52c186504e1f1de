//! The output side: something that pulls an equalizer chain in real time.
//!
//! [`RodioSink`] keeps one paused `rodio::Sink` per attached chain on the
//! default output stream. The chain is moved into the mixer, so it is
//! dropped by whoever pulls it last and can never be released mid-read.

use log::debug;
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::dsp::{EqualizerChain, SampleStream};
use crate::error::{PlayerError, Result};

pub trait OutputSink {
    /// Replace whatever is attached with `chain`, paused.
    fn attach(&mut self, chain: EqualizerChain<Box<dyn SampleStream>>) -> Result<()>;

    fn start(&mut self) -> Result<()>;

    fn pause(&mut self);

    /// Halt output and detach the current chain.
    fn stop(&mut self);
}

pub struct RodioSink {
    stream: OutputStream,
    sink: Option<Sink>,
}

impl RodioSink {
    /// Open the system's default output device.
    ///
    /// `OutputStream` is not `Send` on every platform; call this on the
    /// thread that will own the sink.
    pub fn open_default() -> Result<Self> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlayerError::Device(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped.
        stream.log_on_drop(false);
        Ok(Self { stream, sink: None })
    }
}

impl OutputSink for RodioSink {
    fn attach(&mut self, chain: EqualizerChain<Box<dyn SampleStream>>) -> Result<()> {
        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        sink.append(chain);

        // The new sink is in place before the old one goes quiet.
        if let Some(old) = self.sink.replace(sink) {
            old.stop();
        }
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        match self.sink.as_ref() {
            Some(s) => {
                s.play();
                Ok(())
            }
            None => Err(PlayerError::Device("nothing attached to the output".into())),
        }
    }

    fn pause(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.pause();
        }
    }

    fn stop(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
            debug!("output stopped");
        }
    }
}
