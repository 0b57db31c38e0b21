//! Hardware collaborator seams: display, speaker, speech synthesizer.
//!
//! The real peripherals live behind these traits so the coordination layer
//! can be exercised on a development host (see [`sim`]) and so device ports
//! only have to supply three implementations. All trait objects are owned by
//! the main loop; nothing here crosses a thread boundary.

pub mod sim;

use thiserror::Error;

/// Raster formats the display path understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Webp,
}

/// Collaborator failures. All of these are logged and the current action
/// abandoned - none propagate past the sequencer.
#[derive(Debug, Error)]
pub enum HwError {
    #[error("image decode failed: {0}")]
    Decode(String),
    #[error("audio playback failed: {0}")]
    Playback(String),
    #[error("speech synthesis rejected: {0}")]
    SynthesisRejected(String),
}

/// The display. `draw` consumes encoded image bytes (from the asset cache
/// or an on-demand storage read) and renders full-screen.
pub trait Screen {
    fn draw(&mut self, bytes: &[u8], format: ImageFormat) -> Result<(), HwError>;
    fn set_brightness(&mut self, level: u8);
}

/// The speaker. `play` returns once the buffer is handed off; the audio
/// keeps rendering (DMA) afterwards, so callers wait the drain interval
/// computed from the buffer before the next speaker command.
pub trait Speaker {
    fn play(&mut self, wav: &[u8]) -> Result<(), HwError>;
    fn stop(&mut self);
    fn set_volume(&mut self, level: u8);
}

/// The speech synthesizer. `speak` reports acceptance only; samples arrive
/// as push writes into the `PcmSink` the implementation was built with,
/// possibly after `speak` has already returned.
pub trait Synth {
    fn speak(&mut self, text: &str) -> Result<(), HwError>;
}
