//! Audio output using cpal
//!
//! Implements the [`AudioOutput`] seam on top of a cpal output stream. The
//! submit side pushes a `(slot, len)` descriptor and the chunk's bytes into a
//! pair of lock-free SPSC rings; the real-time callback drains bytes into the
//! device buffer and emits a `ChunkDone` event when a descriptor's last byte
//! has been consumed. The rings are sized for the two double-buffering slots,
//! so a submit can only fail if the session accounting is broken.
//!
//! Samples cross the ring as little-endian integer PCM and are reassembled in
//! the callback; underruns are filled with silence.

use std::sync::mpsc::Sender;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::{debug, warn};

use crate::audio::device::{AudioOutput, DeviceEvent};
use crate::audio::types::AudioSpec;
use crate::error::{Error, Result};

/// Descriptor for one submitted chunk, consumed by the callback in FIFO order.
#[derive(Debug, Clone, Copy)]
struct ChunkDesc {
    slot: usize,
    remaining: usize,
}

/// Integer PCM sample the callback can reassemble from ring bytes.
trait PcmSample: cpal::SizedSample + Send + 'static {
    const BYTES: usize;
    const SILENCE: Self;
    fn from_le(raw: &[u8]) -> Self;
}

impl PcmSample for u8 {
    const BYTES: usize = 1;
    const SILENCE: Self = 0x80;
    fn from_le(raw: &[u8]) -> Self {
        raw[0]
    }
}

impl PcmSample for i16 {
    const BYTES: usize = 2;
    const SILENCE: Self = 0;
    fn from_le(raw: &[u8]) -> Self {
        i16::from_le_bytes([raw[0], raw[1]])
    }
}

impl PcmSample for i32 {
    const BYTES: usize = 4;
    const SILENCE: Self = 0;
    fn from_le(raw: &[u8]) -> Self {
        i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])
    }
}

/// Consumer half owned by the real-time callback.
struct CallbackFeed {
    descs: HeapCons<ChunkDesc>,
    bytes: HeapCons<u8>,
    current: Option<ChunkDesc>,
    events: Sender<DeviceEvent>,
}

impl CallbackFeed {
    /// Fill one device buffer, emitting completion events as descriptors drain.
    fn fill<T: PcmSample>(&mut self, out: &mut [T]) {
        let mut i = 0;
        while i < out.len() {
            if self.current.is_none() {
                self.current = self.descs.try_pop();
            }
            let Some(desc) = self.current.as_mut() else {
                // Nothing queued: underrun, play silence
                for sample in &mut out[i..] {
                    *sample = T::SILENCE;
                }
                return;
            };

            // Submit pushes bytes before the descriptor, so every byte the
            // descriptor accounts for is already in the ring.
            debug_assert!(desc.remaining % T::BYTES == 0);
            let n = (desc.remaining / T::BYTES).min(out.len() - i);
            let mut raw = [0u8; 4];
            for sample in &mut out[i..i + n] {
                let popped = self.bytes.pop_slice(&mut raw[..T::BYTES]);
                debug_assert_eq!(popped, T::BYTES);
                *sample = T::from_le(&raw[..T::BYTES]);
            }
            i += n;
            desc.remaining -= n * T::BYTES;

            if desc.remaining == 0 {
                let slot = desc.slot;
                self.current = None;
                // Session may already be tearing down; a missed event is fine
                let _ = self.events.send(DeviceEvent::ChunkDone(slot));
            }
        }
    }
}

/// cpal-backed output device for one playback session.
pub struct CpalOutput {
    descs: HeapProd<ChunkDesc>,
    bytes: HeapProd<u8>,
    // Held for its lifetime; dropping the stream closes the device path
    _stream: Stream,
}

impl CpalOutput {
    /// List available audio output device names.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Open an output stream matching `spec`, delivering completion events
    /// for this session on `events`.
    ///
    /// `chunk_bytes` is the capacity of one chunk slot; the internal rings
    /// are sized to hold both slots.
    pub fn open(
        spec: &AudioSpec,
        device_name: Option<&str>,
        chunk_bytes: usize,
        events: Sender<DeviceEvent>,
    ) -> Result<Self> {
        spec.validate()?;

        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => host
                .output_devices()
                .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
                .find(|d| d.name().ok().as_deref() == Some(name))
                .ok_or_else(|| Error::AudioOutput(format!("Device '{}' not found", name)))?,
            None => host.default_output_device().ok_or_else(|| {
                Error::AudioOutput("No default output device available".into())
            })?,
        };
        let device_label = device.name().unwrap_or_else(|_| "<unnamed>".into());

        let sample_format = match spec.bits_per_sample {
            8 => SampleFormat::U8,
            16 => SampleFormat::I16,
            32 => SampleFormat::I32,
            other => {
                return Err(Error::UnsupportedFormat(format!(
                    "{}-bit samples not supported",
                    other
                )))
            }
        };

        let range = device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("Failed to query device configs: {}", e)))?
            .find(|r| {
                r.channels() == spec.channels
                    && r.sample_format() == sample_format
                    && r.min_sample_rate().0 <= spec.sample_rate
                    && spec.sample_rate <= r.max_sample_rate().0
            })
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!(
                    "Device '{}' does not support {} ch / {}-bit / {} Hz",
                    device_label, spec.channels, spec.bits_per_sample, spec.sample_rate
                ))
            })?;
        let config = range
            .with_sample_rate(SampleRate(spec.sample_rate))
            .config();

        debug!(
            device = %device_label,
            channels = spec.channels,
            bits = spec.bits_per_sample,
            rate = spec.sample_rate,
            chunk_bytes,
            "Opening output stream"
        );

        // One ring of raw bytes sized for both slots, one small ring of
        // chunk descriptors. Submit never outruns the callback because a
        // slot is only refilled after its ChunkDone arrives.
        let (byte_prod, byte_cons) = HeapRb::<u8>::new(chunk_bytes * 2).split();
        let (desc_prod, desc_cons) = HeapRb::<ChunkDesc>::new(4).split();

        let feed = CallbackFeed {
            descs: desc_cons,
            bytes: byte_cons,
            current: None,
            events: events.clone(),
        };

        let stream = match sample_format {
            SampleFormat::U8 => build_stream::<u8>(&device, &config, feed, events),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, feed, events),
            SampleFormat::I32 => build_stream::<i32>(&device, &config, feed, events),
            _ => unreachable!("sample format restricted above"),
        }?;

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

        Ok(Self {
            descs: desc_prod,
            bytes: byte_prod,
            _stream: stream,
        })
    }
}

fn build_stream<T: PcmSample>(
    device: &Device,
    config: &StreamConfig,
    mut feed: CallbackFeed,
    events: Sender<DeviceEvent>,
) -> Result<Stream> {
    device
        .build_output_stream(
            config,
            move |out: &mut [T], _| feed.fill(out),
            move |err| {
                warn!("Output stream error: {}", err);
                let _ = events.send(DeviceEvent::Failed(err.to_string()));
            },
            None,
        )
        .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
}

impl AudioOutput for CpalOutput {
    fn submit(&mut self, slot: usize, data: &[u8]) -> Result<()> {
        if self.bytes.vacant_len() < data.len() || self.descs.vacant_len() == 0 {
            return Err(Error::AudioOutput(format!(
                "Device queue full submitting slot {} ({} bytes)",
                slot,
                data.len()
            )));
        }

        // Bytes first, descriptor last: the callback only learns about the
        // chunk once all of its bytes are visible in the ring.
        let pushed = self.bytes.push_slice(data);
        debug_assert_eq!(pushed, data.len());
        let _ = self.descs.try_push(ChunkDesc {
            slot,
            remaining: data.len(),
        });
        Ok(())
    }
}
