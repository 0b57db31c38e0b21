//! Audio plumbing - PCM accumulation and WAV packaging.

pub mod pcm;
pub mod wav;

pub use pcm::{PcmBuffer, PcmSink};
pub use wav::{WAV_HEADER_LEN, package_wav, playback_drain, wav_stream_params};
