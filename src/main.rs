//! waveplay - Command-line WAV player
//!
//! Plays an integer-PCM WAV file through the default (or a named) output
//! device using the double-buffered playback engine, and can exercise the
//! early-stop path with `--stop-after`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use waveplay::{launch, CpalOutput, PlaybackConfig, SessionRegistry};

/// Command-line arguments for waveplay
#[derive(Parser, Debug)]
#[command(name = "waveplay")]
#[command(about = "Play a WAV file through an audio output device")]
#[command(version)]
struct Args {
    /// WAV file to play (required unless --list-devices)
    wav: Option<PathBuf>,

    /// Output device name (default: system default device)
    #[arg(short, long, env = "WAVEPLAY_DEVICE")]
    device: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long, env = "WAVEPLAY_CONFIG")]
    config: Option<PathBuf>,

    /// List available output devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Stop playback after this many seconds instead of playing to the end
    #[arg(long)]
    stop_after: Option<f64>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waveplay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if args.list_devices {
        for name in CpalOutput::list_devices().context("Failed to enumerate output devices")? {
            println!("{}", name);
        }
        return Ok(());
    }

    let wav_path = args
        .wav
        .context("No WAV file given (or use --list-devices)")?;

    let mut config = match args.config {
        Some(path) => PlaybackConfig::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PlaybackConfig::default(),
    };
    if args.device.is_some() {
        config.device = args.device;
    }

    let (samples, spec) = waveplay::wav::read_wav(&wav_path)
        .with_context(|| format!("Failed to read {}", wav_path.display()))?;
    info!(
        "Playing {} ({} ch, {}-bit, {} Hz, {:.1}s)",
        wav_path.display(),
        spec.channels,
        spec.bits_per_sample,
        spec.sample_rate,
        samples.len() as f64 / spec.byte_rate() as f64
    );

    let registry = Arc::new(SessionRegistry::new());
    let handle = launch(&samples, spec, &config, &registry).context("Failed to start playback")?;

    if let Some(secs) = args.stop_after {
        std::thread::sleep(Duration::from_secs_f64(secs));
        info!("Stopping playback after {:.1}s", secs);
        handle.stop();
    }

    handle.wait().context("Playback failed")?;
    info!("Done");
    Ok(())
}
