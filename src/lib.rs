//! # waveplay
//!
//! Double-buffered playback of fixed in-memory PCM samples to an OS audio
//! output device, with advisory early stop and deterministic teardown.
//!
//! **Architecture:** each [`launch`] copies the sample, registers a stop
//! signal in a [`SessionRegistry`], and hands a [`PlaybackSession`] to a
//! dedicated notification-loop thread. The device reports each finished
//! chunk on a per-session channel; the loop refills the finished slot with
//! the next stretch of the sample, retires it when the sample (or a stop
//! request) leaves nothing to refill, and terminates the session once no
//! chunk is left in flight. Launch failures unwind completely and return
//! synchronously; post-launch device failures surface through
//! [`PlaybackHandle::wait`].
//!
//! The output device sits behind the [`audio::AudioOutput`] seam; production
//! playback uses the cpal-backed [`audio::CpalOutput`], tests inject mocks
//! via [`playback::launch_with_output`].

pub mod audio;
pub mod config;
pub mod error;
pub mod playback;
pub mod wav;

pub use audio::{AudioOutput, AudioSpec, CpalOutput, DeviceEvent};
pub use config::PlaybackConfig;
pub use error::{Error, Result};
pub use playback::{
    launch, launch_with_output, PlayId, PlaybackHandle, PlaybackSession, RefillAction,
    SessionRegistry, StopSignal,
};
