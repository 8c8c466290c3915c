//! WAV file loading for the CLI
//!
//! Reads integer PCM WAV files into the raw little-endian byte layout the
//! playback core consumes. Compressed and float formats are rejected; this
//! crate does not convert formats.

use std::path::Path;

use hound::{SampleFormat, WavReader};
use tracing::debug;

use crate::audio::types::AudioSpec;
use crate::error::{Error, Result};

/// Load a WAV file, returning the interleaved PCM bytes and their spec.
pub fn read_wav(path: &Path) -> Result<(Vec<u8>, AudioSpec)> {
    let mut reader = WavReader::open(path)?;
    let wav_spec = reader.spec();

    if wav_spec.sample_format != SampleFormat::Int {
        return Err(Error::UnsupportedFormat(
            "float WAV files are not supported (integer PCM only)".into(),
        ));
    }

    let spec = AudioSpec {
        channels: wav_spec.channels,
        bits_per_sample: wav_spec.bits_per_sample,
        sample_rate: wav_spec.sample_rate,
    };
    spec.validate()?;

    let mut bytes = Vec::with_capacity(reader.len() as usize * spec.bytes_per_sample());
    match spec.bits_per_sample {
        8 => {
            // WAV stores 8-bit PCM unsigned; hound yields signed samples
            for sample in reader.samples::<i8>() {
                bytes.push((sample? as i16 + 0x80) as u8);
            }
        }
        16 => {
            for sample in reader.samples::<i16>() {
                bytes.extend_from_slice(&sample?.to_le_bytes());
            }
        }
        32 => {
            for sample in reader.samples::<i32>() {
                bytes.extend_from_slice(&sample?.to_le_bytes());
            }
        }
        _ => unreachable!("bit depth restricted by AudioSpec::validate"),
    }

    debug!(
        path = %path.display(),
        bytes = bytes.len(),
        channels = spec.channels,
        bits = spec.bits_per_sample,
        rate = spec.sample_rate,
        "Loaded WAV file"
    );
    Ok((bytes, spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavSpec;

    fn write_test_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn reads_16_bit_stereo() {
        let dir = std::env::temp_dir();
        let path = dir.join("waveplay_test_stereo.wav");
        write_test_wav(&path, 2, &[0, 1000, -1000, i16::MAX]);

        let (bytes, spec) = read_wav(&path).unwrap();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[2..4], &1000i16.to_le_bytes());
        assert_eq!(bytes.len() % spec.frame_size(), 0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_float_wav() {
        let dir = std::env::temp_dir();
        let path = dir.join("waveplay_test_float.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.5f32).unwrap();
        writer.finalize().unwrap();

        assert!(matches!(
            read_wav(&path),
            Err(Error::UnsupportedFormat(_))
        ));
        std::fs::remove_file(&path).ok();
    }
}
