//! Development-host implementations of the hardware seams.
//!
//! `SimScreen` runs a real decode via the `image` crate, so bad asset bytes
//! fail here the same way they would on the device decoder. The speaker and
//! synthesizer just log and, for the synthesizer, push a placeholder tone so
//! the whole speech pipeline is exercisable without a TTS engine.

use super::{HwError, ImageFormat, Screen, Speaker, Synth};
use crate::audio::PcmSink;
use image::ImageFormat as RasterFormat;
use log::{debug, info};

/// Screen that decodes to verify and logs what it would render.
#[derive(Debug, Default)]
pub struct SimScreen {
    brightness: u8,
}

impl Screen for SimScreen {
    fn draw(&mut self, bytes: &[u8], format: ImageFormat) -> Result<(), HwError> {
        let raster = match format {
            ImageFormat::Png => RasterFormat::Png,
            ImageFormat::Webp => RasterFormat::WebP,
        };
        let img = image::load_from_memory_with_format(bytes, raster)
            .map_err(|e| HwError::Decode(e.to_string()))?;
        info!(
            "screen: {}x{} {:?} image ({} bytes)",
            img.width(),
            img.height(),
            format,
            bytes.len()
        );
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) {
        self.brightness = level;
        debug!("screen: brightness {}", level);
    }
}

/// Speaker that accepts any buffer and logs the handoff.
#[derive(Debug, Default)]
pub struct SimSpeaker {
    volume: u8,
}

impl Speaker for SimSpeaker {
    fn play(&mut self, wav: &[u8]) -> Result<(), HwError> {
        info!("speaker: playing {} bytes at volume {}", wav.len(), self.volume);
        Ok(())
    }

    fn stop(&mut self) {
        debug!("speaker: stop");
    }

    fn set_volume(&mut self, level: u8) {
        self.volume = level;
        debug!("speaker: volume {}", level);
    }
}

/// Tone length per word pushed by [`SimSynth`].
const TONE_MS: usize = 120;
const TONE_HZ: f32 = 440.0;
const TONE_AMPLITUDE: f32 = 3000.0;

/// Synthesizer stand-in: one short tone per word, pushed synchronously.
#[derive(Debug)]
pub struct SimSynth {
    sink: PcmSink,
    sample_rate: u32,
}

impl SimSynth {
    pub fn new(sink: PcmSink, sample_rate: u32) -> Self {
        Self { sink, sample_rate }
    }
}

impl Synth for SimSynth {
    fn speak(&mut self, text: &str) -> Result<(), HwError> {
        if text.trim().is_empty() {
            return Err(HwError::SynthesisRejected("empty text".into()));
        }

        let words = text.split_whitespace().count().max(1);
        let samples_per_word = self.sample_rate as usize * TONE_MS / 1000;
        let step = TONE_HZ * std::f32::consts::TAU / self.sample_rate as f32;

        let tone: Vec<i16> = (0..words * samples_per_word)
            .map(|i| ((i as f32 * step).sin() * TONE_AMPLITUDE) as i16)
            .collect();
        let pushed = self.sink.push(&tone);
        debug!("synth: \"{}\" -> {} placeholder samples", text, pushed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_rejects_garbage_bytes() {
        let mut screen = SimScreen::default();
        let err = screen.draw(b"definitely not a png", ImageFormat::Png);
        assert!(matches!(err, Err(HwError::Decode(_))));
    }

    #[test]
    fn test_screen_draws_valid_png() {
        // Smallest valid PNG: encode a 1x1 image through the same crate
        let mut png = Vec::new();
        image::RgbaImage::new(1, 1)
            .write_to(&mut std::io::Cursor::new(&mut png), RasterFormat::Png)
            .unwrap();

        let mut screen = SimScreen::default();
        assert!(screen.draw(&png, ImageFormat::Png).is_ok());
    }

    #[test]
    fn test_synth_rejects_empty_text() {
        let mut synth = SimSynth::new(PcmSink::new(16000), 16000);
        assert!(matches!(
            synth.speak("   "),
            Err(HwError::SynthesisRejected(_))
        ));
    }

    #[test]
    fn test_synth_pushes_samples_per_word() {
        let sink = PcmSink::new(1_000_000);
        let mut synth = SimSynth::new(sink.clone(), 16000);
        synth.speak("two words").unwrap();
        // 2 words * 120 ms at 16 kHz
        assert_eq!(sink.len(), 2 * 1920);
    }
}
