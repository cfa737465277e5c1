//! Audio companion module
//!
//! Microphone capture and speaker playback for the `ask` subcommand. The
//! relay server itself never touches audio hardware.

mod capture;
mod playback;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use playback::AudioPlayback;
