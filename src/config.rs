//! waveplay playback configuration
//!
//! Small TOML-backed configuration for the output path: which device to open
//! and how large each double-buffering chunk is.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default chunk capacity in bytes (one of the two double-buffering slots).
pub const DEFAULT_CHUNK_BYTES: usize = 4096;

/// Playback configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Output device name; `None` selects the host default device
    pub device: Option<String>,
    /// Capacity in bytes of each of the two chunk slots
    pub chunk_bytes: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            device: None,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
        }
    }
}

impl PlaybackConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: PlaybackConfig = toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field ranges.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_bytes == 0 {
            return Err(Error::Config("chunk_bytes must be non-zero".into()));
        }
        Ok(())
    }
}
