use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, error};

use crate::config::Settings;
use crate::error::{PlayerError, Result};

use super::controller::Controller;
use super::events::EventHub;
use super::loader::TrackLoader;
use super::sink::OutputSink;
use super::types::{AudioCmd, EndNotifier, PlaybackHandle, StreamEnd};

/// Start the engine thread and wait until its output is open.
///
/// The sink is opened on the engine thread itself because output streams
/// are not `Send` everywhere. Its failure is returned here and the thread
/// has exited by then.
pub(super) fn spawn_engine_thread<L, O, F>(
    loader: L,
    open_sink: F,
    settings: Settings,
    tx: Sender<AudioCmd>,
    rx: Receiver<AudioCmd>,
    events: EventHub,
    info: PlaybackHandle,
) -> Result<JoinHandle<()>>
where
    L: TrackLoader + Send + 'static,
    O: OutputSink,
    F: FnOnce() -> Result<O> + Send + 'static,
{
    let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<()>>(1);

    let handle = thread::Builder::new()
        .name("tenband-engine".into())
        .spawn(move || {
            let sink = match open_sink() {
                Ok(s) => s,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            // Ends are queued behind whatever commands are already waiting.
            let notify: EndNotifier = Arc::new(move |end: StreamEnd| {
                let _ = tx.send(AudioCmd::StreamEnded(end));
            });
            let mut controller = Controller::new(loader, sink, &settings, events, info, notify);
            let _ = ready_tx.send(Ok(()));

            loop {
                match rx.recv() {
                    Ok(AudioCmd::Request { command, reply }) => {
                        debug!("command: {command:?}");
                        let _ = reply.send(controller.execute(command));
                    }
                    Ok(AudioCmd::StreamEnded(end)) => controller.handle_stream_end(end),
                    Ok(AudioCmd::Quit) | Err(_) => {
                        controller.dispose();
                        break;
                    }
                }
            }
        })
        .map_err(|e| PlayerError::Device(e.to_string()))?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(e)) => {
            let _ = handle.join();
            Err(e)
        }
        Err(_) => {
            error!("engine thread exited during startup");
            let _ = handle.join();
            Err(PlayerError::EngineGone)
        }
    }
}
