//! Playback core: stop signaling and the session registry, per-session
//! state with the chunk refill protocol, the notification loop, and the
//! launcher that wires them together.

pub mod launcher;
pub mod notify;
pub mod registry;
pub mod session;

pub use launcher::{launch, launch_with_output, PlaybackHandle};
pub use registry::{PlayId, SessionRegistry, StopSignal};
pub use session::{PlaybackSession, RefillAction, CHUNK_SLOTS};
