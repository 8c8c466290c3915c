//! Session launcher
//!
//! `launch` starts asynchronous playback of an in-memory PCM sample and
//! returns as soon as the device is running with the first two chunks queued.
//! Every launch failure is synchronous and fully unwound: no buffer, registry
//! entry, thread or device outlives a failed launch.
//!
//! The notification-loop thread is spawned before the device exists; the
//! thread opens the device (binding completion delivery to this session's
//! event channel), primes both chunk slots, and reports the outcome over a
//! one-shot startup handshake. This keeps the loop in place before the first
//! completion can fire, keeps launch failures synchronous for the caller, and
//! keeps the device on the thread that owns it for its whole life.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info};

use crate::audio::device::{AudioOutput, DeviceEvent};
use crate::audio::output::CpalOutput;
use crate::audio::types::AudioSpec;
use crate::config::PlaybackConfig;
use crate::error::{Error, Result};
use crate::playback::notify;
use crate::playback::registry::{PlayId, SessionRegistry, StopSignal};
use crate::playback::session::{PlaybackSession, CHUNK_SLOTS};

/// Handle to one in-flight playback session.
///
/// Dropping the handle neither blocks nor cancels playback; the session runs
/// to completion on its own thread. The handle is the explicit channel for
/// post-launch device errors, which the caller collects via [`wait`].
///
/// [`wait`]: PlaybackHandle::wait
pub struct PlaybackHandle {
    play_id: PlayId,
    stop: StopSignal,
    done: Receiver<Result<()>>,
}

impl PlaybackHandle {
    /// Registry id of this session.
    pub fn play_id(&self) -> PlayId {
        self.play_id
    }

    /// Request an early stop. Advisory: chunks already submitted to the
    /// device drain before the session terminates.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Block until the session terminates. `Ok` on natural completion or
    /// after a stop; `Err` carries a device failure that occurred after
    /// launch returned.
    pub fn wait(self) -> Result<()> {
        match self.done.recv() {
            Ok(result) => result,
            Err(_) => Err(Error::Playback(
                "playback thread exited without reporting a result".into(),
            )),
        }
    }
}

/// Start playback of `samples` on the device described by `config`.
///
/// Returns immediately after the device is open and the first two chunks are
/// queued; playback then proceeds asynchronously, driven by the session's
/// notification loop.
pub fn launch(
    samples: &[u8],
    spec: AudioSpec,
    config: &PlaybackConfig,
    registry: &Arc<SessionRegistry>,
) -> Result<PlaybackHandle> {
    config.validate()?;
    let device_name = config.device.clone();
    let chunk_bytes = config.chunk_bytes;
    launch_with_output(samples, spec, chunk_bytes, registry, move |events| {
        CpalOutput::open(&spec, device_name.as_deref(), chunk_bytes, events)
    })
}

/// Start playback on a caller-supplied device, opened by `open` on the
/// session's own thread with the session's event sender.
pub fn launch_with_output<D, F>(
    samples: &[u8],
    spec: AudioSpec,
    chunk_bytes: usize,
    registry: &Arc<SessionRegistry>,
    open: F,
) -> Result<PlaybackHandle>
where
    D: AudioOutput + 'static,
    F: FnOnce(Sender<DeviceEvent>) -> Result<D> + Send + 'static,
{
    spec.validate()?;
    if samples.is_empty() {
        return Err(Error::InvalidData("no audio data to play".into()));
    }
    let frame = spec.frame_size();
    if samples.len() % frame != 0 {
        return Err(Error::InvalidData(format!(
            "sample length {} is not a multiple of the {}-byte frame size",
            samples.len(),
            frame
        )));
    }
    // Chunks must hold whole frames so every take stays frame-aligned
    let chunk_bytes = chunk_bytes - chunk_bytes % frame;
    if chunk_bytes == 0 {
        return Err(Error::Config(format!(
            "chunk size smaller than one {}-byte frame",
            frame
        )));
    }

    let buffer = samples.to_vec();
    let stop = StopSignal::new();
    let play_id = registry.register(&stop);

    let (events_tx, events_rx) = mpsc::channel::<DeviceEvent>();
    let (startup_tx, startup_rx) = mpsc::sync_channel::<Result<()>>(1);
    let (done_tx, done_rx) = mpsc::channel::<Result<()>>();

    let thread_registry = Arc::clone(registry);
    let thread_stop = stop.clone();
    let spawned = thread::Builder::new()
        .name(format!("waveplay-session-{}", play_id))
        .spawn(move || {
            let device = match open(events_tx) {
                Ok(device) => device,
                Err(e) => {
                    thread_registry.unregister(play_id);
                    let _ = startup_tx.send(Err(e));
                    return;
                }
            };

            let mut session =
                PlaybackSession::new(buffer, chunk_bytes, device, thread_stop, play_id);
            for slot in 0..CHUNK_SLOTS {
                if let Err(e) = session.prime(slot) {
                    // Dropping the session closes the device and frees the
                    // buffer before the caller sees the error
                    drop(session);
                    thread_registry.unregister(play_id);
                    let _ = startup_tx.send(Err(e));
                    return;
                }
            }

            let _ = startup_tx.send(Ok(()));
            notify::run(session, events_rx, done_tx, thread_registry);
        });

    let joiner = match spawned {
        Ok(joiner) => joiner,
        Err(e) => {
            registry.unregister(play_id);
            return Err(Error::ThreadSpawn(e));
        }
    };

    match startup_rx.recv() {
        Ok(Ok(())) => {
            info!(
                play_id,
                bytes = samples.len(),
                channels = spec.channels,
                bits = spec.bits_per_sample,
                rate = spec.sample_rate,
                chunk_bytes,
                "Playback launched"
            );
            Ok(PlaybackHandle {
                play_id,
                stop,
                done: done_rx,
            })
        }
        Ok(Err(e)) => {
            debug!(play_id, error = %e, "Launch failed; session unwound");
            let _ = joiner.join();
            Err(e)
        }
        Err(_) => {
            // Thread died before reporting: registry entry may remain, clean it
            let _ = joiner.join();
            registry.unregister(play_id);
            Err(Error::Playback(
                "playback thread exited during startup".into(),
            ))
        }
    }
}
