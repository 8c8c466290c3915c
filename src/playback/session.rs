//! Per-session playback state and the chunk refill protocol
//!
//! A [`PlaybackSession`] owns everything one playing sample needs: the copied
//! audio buffer, the read cursor, the two-slot chunk arena, the output device
//! and a clone of the session's stop signal. After launch the session moves
//! into its notification loop thread, which is then the only code that
//! touches it; the stop signal's atomic flag is the sole cross-thread state.
//!
//! The refill protocol is the decision taken for every finished chunk:
//! refill it with the next stretch of the buffer, retire it because the
//! buffer is exhausted (or a stop was requested) while the other slot is
//! still draining, or terminate the session once nothing is left in flight.

use tracing::{debug, trace};

use crate::audio::device::AudioOutput;
use crate::error::Result;
use crate::playback::registry::{PlayId, StopSignal};

/// Number of chunk slots: classic double buffering.
pub const CHUNK_SLOTS: usize = 2;

/// Outcome of one refill decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefillAction {
    /// The finished slot was refilled and resubmitted with this many bytes.
    Refilled(usize),
    /// The finished slot was retired; the other slot is still draining.
    Retired,
    /// Nothing left in flight: the session is over and must be torn down.
    Terminated,
}

/// Mutable state for one playing sample.
pub struct PlaybackSession<D: AudioOutput> {
    /// Owned copy of the sample, immutable after creation
    buffer: Vec<u8>,
    /// Bytes already consumed from `buffer`
    cursor: usize,
    /// Chunks submitted to the device and not yet retired (0..=2)
    outstanding: u8,
    /// Fixed arena of two chunk slots, recycled for every refill
    chunks: [Vec<u8>; CHUNK_SLOTS],
    device: D,
    stop: StopSignal,
    play_id: PlayId,
}

impl<D: AudioOutput> PlaybackSession<D> {
    pub fn new(
        buffer: Vec<u8>,
        chunk_bytes: usize,
        device: D,
        stop: StopSignal,
        play_id: PlayId,
    ) -> Self {
        Self {
            buffer,
            cursor: 0,
            outstanding: 0,
            chunks: [vec![0u8; chunk_bytes], vec![0u8; chunk_bytes]],
            device,
            stop,
            play_id,
        }
    }

    pub fn play_id(&self) -> PlayId {
        self.play_id
    }

    /// Bytes not yet handed to the device.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn outstanding(&self) -> u8 {
        self.outstanding
    }

    /// Launch-time fill of one slot. Returns whether a chunk was actually
    /// submitted (false once the sample is shorter than the already-primed
    /// slots, or a stop beat the launch).
    pub fn prime(&mut self, slot: usize) -> Result<bool> {
        Ok(self.refill(slot)?.is_some())
    }

    /// Refill decision for a finished chunk.
    ///
    /// Invoked for every completion notification, exclusively from the
    /// session's notification loop. A device failure here is terminal for
    /// the session and is propagated, never masked.
    pub fn handle_chunk_done(&mut self, slot: usize) -> Result<RefillAction> {
        debug_assert!(self.outstanding > 0, "completion with nothing in flight");
        self.outstanding = self.outstanding.saturating_sub(1);

        if let Some(take) = self.refill(slot)? {
            trace!(
                play_id = self.play_id,
                slot,
                take,
                cursor = self.cursor,
                "Chunk refilled"
            );
            return Ok(RefillAction::Refilled(take));
        }

        if self.outstanding > 0 {
            // Draining down: the other slot is still playing out
            trace!(play_id = self.play_id, slot, "Chunk retired");
            Ok(RefillAction::Retired)
        } else {
            debug!(
                play_id = self.play_id,
                consumed = self.cursor,
                stopped = self.stop.is_stopped(),
                "Playback session finished"
            );
            Ok(RefillAction::Terminated)
        }
    }

    /// Copy the next stretch of the buffer into `slot` and submit it.
    ///
    /// Returns the number of bytes submitted, or `None` when no refill should
    /// happen (buffer exhausted or stop requested). The stop flag read is the
    /// only cross-thread read in the decision.
    fn refill(&mut self, slot: usize) -> Result<Option<usize>> {
        if self.stop.is_stopped() {
            return Ok(None);
        }
        let available = self.buffer.len() - self.cursor;
        if available == 0 {
            return Ok(None);
        }

        let capacity = self.chunks[slot].len();
        let take = available.min(capacity);
        self.chunks[slot][..take]
            .copy_from_slice(&self.buffer[self.cursor..self.cursor + take]);
        // Submit the true filled length, not the slot capacity: the device
        // must play only valid bytes.
        self.device.submit(slot, &self.chunks[slot][..take])?;
        self.cursor += take;
        self.outstanding += 1;
        debug_assert!(self.outstanding as usize <= CHUNK_SLOTS);
        Ok(Some(take))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    /// Records submissions; optionally fails from the nth submit onward.
    struct RecordingOutput {
        submitted: Vec<(usize, usize)>,
        fail_from: Option<usize>,
    }

    impl RecordingOutput {
        fn new() -> Self {
            Self {
                submitted: Vec::new(),
                fail_from: None,
            }
        }

        fn failing_from(n: usize) -> Self {
            Self {
                submitted: Vec::new(),
                fail_from: Some(n),
            }
        }
    }

    impl AudioOutput for RecordingOutput {
        fn submit(&mut self, slot: usize, data: &[u8]) -> Result<()> {
            if let Some(n) = self.fail_from {
                if self.submitted.len() >= n {
                    return Err(Error::AudioOutput("simulated submit failure".into()));
                }
            }
            self.submitted.push((slot, data.len()));
            Ok(())
        }
    }

    fn session(len: usize, chunk_bytes: usize) -> PlaybackSession<RecordingOutput> {
        let buffer: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        PlaybackSession::new(buffer, chunk_bytes, RecordingOutput::new(), StopSignal::new(), 7)
    }

    /// Drive a primed session to termination, alternating finished slots the
    /// way FIFO completion order would.
    fn drain(session: &mut PlaybackSession<RecordingOutput>) {
        let mut slot = 0;
        loop {
            match session.handle_chunk_done(slot).unwrap() {
                RefillAction::Terminated => break,
                _ => slot = (slot + 1) % CHUNK_SLOTS,
            }
            assert!(session.outstanding() as usize <= CHUNK_SLOTS);
        }
    }

    #[test]
    fn takes_sum_to_buffer_length() {
        for (len, chunk) in [
            (8000usize, 4410usize),
            (4000, 4410),
            (8820, 4410),
            (1, 4096),
            (4096 * 5, 4096),
            (4097, 4096),
        ] {
            let mut s = session(len, chunk);
            assert!(s.prime(0).unwrap());
            s.prime(1).unwrap();
            drain(&mut s);

            let takes: Vec<usize> = s.device.submitted.iter().map(|&(_, n)| n).collect();
            assert!(takes.iter().all(|&t| t <= chunk), "take exceeded capacity");
            assert_eq!(
                takes.iter().sum::<usize>(),
                len,
                "takes for len={} chunk={} must sum to the buffer length",
                len,
                chunk
            );
            assert_eq!(s.remaining(), 0);
            assert_eq!(s.outstanding(), 0);
        }
    }

    #[test]
    fn long_sample_retires_then_terminates() {
        // L=8000, C=4410: both slots fill at launch (4410 + 3590), then the
        // first completion finds nothing left and retires, the second
        // terminates.
        let mut s = session(8000, 4410);
        assert!(s.prime(0).unwrap());
        assert!(s.prime(1).unwrap());
        assert_eq!(s.device.submitted, vec![(0, 4410), (1, 3590)]);
        assert_eq!(s.outstanding(), 2);
        assert_eq!(s.remaining(), 0);

        assert_eq!(s.handle_chunk_done(0).unwrap(), RefillAction::Retired);
        assert_eq!(s.outstanding(), 1);
        assert_eq!(s.handle_chunk_done(1).unwrap(), RefillAction::Terminated);
        assert_eq!(s.outstanding(), 0);
    }

    #[test]
    fn short_sample_primes_one_slot() {
        // L=4000, C=4410: the first prime consumes the whole sample, the
        // second submits nothing, and the single completion terminates.
        let mut s = session(4000, 4410);
        assert!(s.prime(0).unwrap());
        assert!(!s.prime(1).unwrap());
        assert_eq!(s.device.submitted, vec![(0, 4000)]);
        assert_eq!(s.outstanding(), 1);

        assert_eq!(s.handle_chunk_done(0).unwrap(), RefillAction::Terminated);
    }

    #[test]
    fn stop_suppresses_refill_and_drains() {
        let mut s = session(44100, 4410);
        s.prime(0).unwrap();
        s.prime(1).unwrap();
        assert_eq!(s.outstanding(), 2);

        s.stop.stop();
        // In-flight chunks still drain; no new bytes are taken
        assert_eq!(s.handle_chunk_done(0).unwrap(), RefillAction::Retired);
        assert_eq!(s.handle_chunk_done(1).unwrap(), RefillAction::Terminated);
        assert_eq!(s.device.submitted.len(), 2);
        assert!(s.remaining() > 0);
    }

    #[test]
    fn stop_midway_finishes_outstanding_only() {
        let mut s = session(4410 * 6, 4410);
        s.prime(0).unwrap();
        s.prime(1).unwrap();

        assert_eq!(s.handle_chunk_done(0).unwrap(), RefillAction::Refilled(4410));
        s.stop.stop();
        assert_eq!(s.handle_chunk_done(1).unwrap(), RefillAction::Retired);
        assert_eq!(s.handle_chunk_done(0).unwrap(), RefillAction::Terminated);
        assert_eq!(s.device.submitted.len(), 3);
    }

    #[test]
    fn chunk_contents_match_buffer() {
        let mut s = session(10_000, 4096);
        s.prime(0).unwrap();
        s.prime(1).unwrap();
        // Second refill of slot 0 carries the tail: 10000 - 2*4096 = 1808
        assert_eq!(s.handle_chunk_done(0).unwrap(), RefillAction::Refilled(1808));
        let expected: Vec<u8> = (8192..10_000).map(|i| (i % 251) as u8).collect();
        assert_eq!(&s.chunks[0][..1808], &expected[..]);
    }

    #[test]
    fn submit_failure_is_propagated() {
        let buffer = vec![0u8; 9000];
        let device = RecordingOutput::failing_from(2);
        let mut s = PlaybackSession::new(buffer, 4096, device, StopSignal::new(), 1);
        s.prime(0).unwrap();
        s.prime(1).unwrap();

        // Third submit (first runtime refill) fails; cursor must not advance
        let before = s.remaining();
        assert!(s.handle_chunk_done(0).is_err());
        assert_eq!(s.remaining(), before);
    }
}
