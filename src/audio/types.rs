//! Core audio parameter types
//!
//! `AudioSpec` carries the PCM parameters a caller supplies and derives the
//! sizes the device path needs (frame size, average byte rate).

use crate::error::{Error, Result};

/// PCM stream parameters for one playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    /// Interleaved channel count (1 = mono, 2 = stereo, ...)
    pub channels: u16,
    /// Bits per sample per channel (8, 16 or 32, integer PCM)
    pub bits_per_sample: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioSpec {
    /// Bytes per single-channel sample.
    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    /// Bytes per interleaved frame (channels x bytes-per-sample).
    pub fn frame_size(&self) -> usize {
        self.channels as usize * self.bytes_per_sample()
    }

    /// Average bytes per second (sample rate x frame size).
    pub fn byte_rate(&self) -> usize {
        self.sample_rate as usize * self.frame_size()
    }

    /// Check that the parameters describe a playable integer PCM stream.
    pub fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(Error::InvalidData("channel count must be non-zero".into()));
        }
        if self.sample_rate == 0 {
            return Err(Error::InvalidData("sample rate must be non-zero".into()));
        }
        match self.bits_per_sample {
            8 | 16 | 32 => Ok(()),
            other => Err(Error::UnsupportedFormat(format!(
                "{}-bit samples not supported (expected 8, 16 or 32)",
                other
            ))),
        }
    }
}
