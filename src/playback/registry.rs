//! Stop signaling and the in-flight session registry
//!
//! A [`StopSignal`] is the one piece of state shared across threads for a
//! session: an advisory flag the issuing side sets and the notification loop
//! reads at each refill decision. It is a clonable shared handle, so the
//! underlying allocation is released exactly once, when the last owner drops,
//! regardless of whether the registry side or the session side lets go first.
//!
//! The [`SessionRegistry`] maps play ids to stop signals so an external
//! caller can stop a specific session (or all of them) without holding any
//! reference to the playback internals.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

/// Identifier for one playback session, unique within a registry.
pub type PlayId = u64;

/// Advisory cross-thread stop flag for one playback session.
///
/// Cloning shares the same flag. Setting it never aborts chunks already
/// submitted to the device; it only suppresses further refills, so the 1-2
/// outstanding chunks drain before the session terminates.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the session stop refilling chunks.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Number of live owners of this signal (diagnostic).
    pub fn owner_count(&self) -> usize {
        Arc::strong_count(&self.stopped)
    }
}

/// Thread-safe registry of in-flight playback sessions.
///
/// The internal lock is held only for map insert/remove/lookup, never across
/// a blocking wait.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<PlayId, StopSignal>>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session, sharing its stop signal with the registry.
    /// Returns the id an external caller can stop it by.
    pub fn register(&self, stop: &StopSignal) -> PlayId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .insert(id, stop.clone());
        debug!(play_id = id, "Registered playback session");
        id
    }

    /// Remove a session's entry, releasing the registry's hold on its stop
    /// signal. Called exactly once per session, on termination or launch
    /// failure.
    pub fn unregister(&self, id: PlayId) {
        let removed = self
            .sessions
            .lock()
            .expect("session registry lock poisoned")
            .remove(&id);
        if removed.is_none() {
            warn!(play_id = id, "Unregister for unknown playback session");
        } else {
            debug!(play_id = id, "Unregistered playback session");
        }
    }

    /// Request that one session stop. Returns false if the session is no
    /// longer in flight.
    pub fn stop(&self, id: PlayId) -> bool {
        let sessions = self
            .sessions
            .lock()
            .expect("session registry lock poisoned");
        match sessions.get(&id) {
            Some(signal) => {
                signal.stop();
                debug!(play_id = id, "Stop requested");
                true
            }
            None => false,
        }
    }

    /// Request that every in-flight session stop.
    pub fn stop_all(&self) {
        let sessions = self
            .sessions
            .lock()
            .expect("session registry lock poisoned");
        debug!(count = sessions.len(), "Stopping all playback sessions");
        for signal in sessions.values() {
            signal.stop();
        }
    }

    /// Whether the session is still in flight (registered and not yet
    /// terminated).
    pub fn is_active(&self, id: PlayId) -> bool {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .contains_key(&id)
    }

    /// Number of in-flight sessions.
    pub fn active_count(&self) -> usize {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .len()
    }
}
