//! Canonical WAV container assembly for synthesized speech and clip playback.
//!
//! `package_wav` is a pure function over a PCM16 mono sample slice, so the
//! header math is unit-testable without any audio hardware attached.

use std::time::Duration;

/// Length of the canonical RIFF/fmt/data header emitted by [`package_wav`].
pub const WAV_HEADER_LEN: usize = 44;

/// Extra wait tacked onto the drain interval so DMA has finished before the
/// next command touches the speaker.
const DRAIN_TAIL_MS: u64 = 50;

/// Wrap PCM16 mono samples into a self-contained playable WAV buffer.
///
/// Emits the fixed 44-byte little-endian header (format tag 1 = linear PCM,
/// 1 channel, 16 bits/sample, byte rate `sample_rate * 2`, block align 2)
/// followed by the raw sample bytes. Zero samples yield a header-only buffer.
pub fn package_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_bytes = (samples.len() * 2) as u32;
    let riff_size = 36 + data_bytes;

    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + data_bytes as usize);

    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&riff_size.to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // linear PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    wav.extend_from_slice(&2u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_bytes.to_le_bytes());

    for s in samples {
        wav.extend_from_slice(&s.to_le_bytes());
    }

    wav
}

/// How long to wait after handing a buffer to the speaker before issuing the
/// next command: `data_bytes * 1000 / (sample_rate * 2) + 50` ms.
///
/// The speaker reports success as soon as the transfer is queued; the audio
/// keeps rendering for the duration of the data.
pub fn playback_drain(data_bytes: usize, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::from_millis(DRAIN_TAIL_MS);
    }
    let ms = data_bytes as u64 * 1000 / (sample_rate as u64 * 2) + DRAIN_TAIL_MS;
    Duration::from_millis(ms)
}

/// Read `(sample_rate, data_bytes)` out of a canonical WAV buffer.
///
/// Only understands the 44-byte layout emitted by [`package_wav`] (which is
/// also what the sound-clip tree on the media card carries). Returns None for
/// anything else so callers can fall back to a minimal drain wait.
pub fn wav_stream_params(bytes: &[u8]) -> Option<(u32, usize)> {
    if bytes.len() < WAV_HEADER_LEN || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return None;
    }
    let rate = u32::from_le_bytes(bytes[24..28].try_into().ok()?);
    if rate == 0 {
        return None;
    }
    let data_bytes = u32::from_le_bytes(bytes[40..44].try_into().ok()?) as usize;
    // Trust the actual buffer over a lying header
    Some((rate, data_bytes.min(bytes.len() - WAV_HEADER_LEN)))
}
