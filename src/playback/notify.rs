//! Per-session notification loop
//!
//! One dedicated thread per session blocks on the session's device-event
//! channel and runs the refill protocol for every completion, exactly as the
//! device delivered them (FIFO). The loop is the sole owner of the
//! [`PlaybackSession`], so cursor and outstanding-count need no locking.
//!
//! The loop exits exactly once: when the protocol reports termination, when
//! the device reports an asynchronous failure, or when every event sender is
//! gone (out-of-band shutdown). On exit it drops the session (closing the
//! device and freeing the buffer), removes the registry entry, and reports
//! the terminal result on the completion channel.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::audio::device::{AudioOutput, DeviceEvent};
use crate::error::{Error, Result};
use crate::playback::registry::SessionRegistry;
use crate::playback::session::{PlaybackSession, RefillAction};

/// Run the notification loop to completion. Called on the session's thread
/// after the device has been opened and the initial chunks primed.
pub(crate) fn run<D: AudioOutput>(
    mut session: PlaybackSession<D>,
    events: Receiver<DeviceEvent>,
    done: Sender<Result<()>>,
    registry: Arc<SessionRegistry>,
) {
    let play_id = session.play_id();

    let result = loop {
        match events.recv() {
            Ok(DeviceEvent::ChunkDone(slot)) => match session.handle_chunk_done(slot) {
                Ok(RefillAction::Refilled(_)) | Ok(RefillAction::Retired) => continue,
                Ok(RefillAction::Terminated) => break Ok(()),
                Err(e) => {
                    warn!(play_id, error = %e, "Device failure during refill");
                    break Err(e);
                }
            },
            Ok(DeviceEvent::Failed(msg)) => {
                warn!(play_id, error = %msg, "Device reported asynchronous failure");
                break Err(Error::AudioOutput(msg));
            }
            // All senders dropped: treated as a shutdown request
            Err(_) => break Ok(()),
        }
    };

    // Teardown order: device closed and buffer freed by dropping the
    // session, then the registry entry disappears, then the caller (if it
    // still holds the handle) learns the outcome.
    drop(session);
    registry.unregister(play_id);
    debug!(play_id, ok = result.is_ok(), "Notification loop exited");
    let _ = done.send(result);
}
