//! Output device seam
//!
//! The playback core only needs three capabilities from a device: submit a
//! filled chunk slot for asynchronous playback, deliver a completion event
//! when a submitted slot has finished playing, and close on drop. Everything
//! device-specific lives behind [`AudioOutput`]; the cpal implementation is
//! in [`crate::audio::output`], tests inject their own.

use crate::error::Result;

/// Events a device delivers to its session's notification loop.
///
/// Events are sent on the per-session channel handed to the device when it is
/// opened. `ChunkDone` events must arrive in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The chunk in the given slot (0 or 1) finished playing.
    ChunkDone(usize),
    /// The device failed asynchronously; the session cannot continue.
    Failed(String),
}

/// An open audio output device bound to one playback session.
///
/// Closing the device is `Drop`; every exit path of the session owns the
/// device and releases it by dropping it.
pub trait AudioOutput {
    /// Queue `data` for asynchronous playback from the given chunk slot.
    ///
    /// `data.len()` is the true filled length and may be shorter than the
    /// slot's capacity; the device must play exactly `data.len()` bytes. A
    /// `ChunkDone(slot)` event follows once those bytes have been consumed.
    fn submit(&mut self, slot: usize, data: &[u8]) -> Result<()>;
}
