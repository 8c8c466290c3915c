//! Audio device layer: parameter types, the output device seam, and the
//! cpal-backed implementation.

pub mod device;
pub mod output;
pub mod types;

pub use device::{AudioOutput, DeviceEvent};
pub use output::CpalOutput;
pub use types::AudioSpec;
