//! Test helpers: a scriptable mock output device
//!
//! `MockOutput` stands in for the OS device behind the `AudioOutput` seam.
//! In auto-complete mode every submitted chunk immediately queues its own
//! completion event, driving a whole session to termination; in manual mode
//! the test drives completions itself through the captured event sender.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use waveplay::{AudioOutput, DeviceEvent, Error, Result};

type SubmitLog = Arc<Mutex<Vec<(usize, Vec<u8>)>>>;

pub struct MockOutput {
    events: Sender<DeviceEvent>,
    log: SubmitLog,
    auto_complete: bool,
    fail_from: Option<usize>,
    submits: usize,
}

impl AudioOutput for MockOutput {
    fn submit(&mut self, slot: usize, data: &[u8]) -> Result<()> {
        let n = self.submits;
        self.submits += 1;
        if let Some(fail_from) = self.fail_from {
            if n >= fail_from {
                return Err(Error::AudioOutput("mock submit failure".into()));
            }
        }
        self.log.lock().unwrap().push((slot, data.to_vec()));
        if self.auto_complete {
            let _ = self.events.send(DeviceEvent::ChunkDone(slot));
        }
        Ok(())
    }
}

/// Shared view into a mock device living on the session thread.
pub struct MockHarness {
    log: SubmitLog,
    events: Arc<Mutex<Option<Sender<DeviceEvent>>>>,
    auto_complete: bool,
    fail_from: Option<usize>,
}

impl MockHarness {
    pub fn auto() -> Self {
        Self::new(true, None)
    }

    pub fn manual() -> Self {
        Self::new(false, None)
    }

    pub fn failing_from(n: usize) -> Self {
        Self::new(true, Some(n))
    }

    fn new(auto_complete: bool, fail_from: Option<usize>) -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            events: Arc::new(Mutex::new(None)),
            auto_complete,
            fail_from,
        }
    }

    /// Device-open closure for `launch_with_output`. Captures the session's
    /// event sender so manual tests can deliver completions.
    pub fn open(&self) -> impl FnOnce(Sender<DeviceEvent>) -> Result<MockOutput> + Send + 'static {
        let log = Arc::clone(&self.log);
        let captured = Arc::clone(&self.events);
        let auto_complete = self.auto_complete;
        let fail_from = self.fail_from;
        move |events| {
            *captured.lock().unwrap() = Some(events.clone());
            Ok(MockOutput {
                events,
                log,
                auto_complete,
                fail_from,
                submits: 0,
            })
        }
    }

    /// Deliver an event to the session as the device would.
    pub fn send(&self, event: DeviceEvent) {
        self.events
            .lock()
            .unwrap()
            .as_ref()
            .expect("device not opened yet")
            .send(event)
            .expect("session event channel closed");
    }

    /// Lengths of every submitted chunk, in submission order.
    pub fn takes(&self) -> Vec<usize> {
        self.log.lock().unwrap().iter().map(|(_, d)| d.len()).collect()
    }

    /// All submitted bytes concatenated in submission order.
    pub fn submitted_bytes(&self) -> Vec<u8> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, d)| d.iter().copied())
            .collect()
    }
}
