//! Main-loop action sequencer.
//!
//! **Architecture**: the sequencer owns the hardware trait objects and is the
//! only code that touches them. Once per loop pass it applies any dirty
//! settings, then drains at most one coordinator slot in fixed priority
//! order: face draw, then speech, then sound. Nothing started here is
//! cancellable - an action runs to completion (including its drain and
//! settle waits) before the next command can be drained.
//!
//! # Failure policy
//!
//! Collaborator failures (cache miss, decode failure, synthesis rejection,
//! playback failure, missing clip file) are logged and the action abandoned
//! for that cycle. No retry, no crash, nothing surfaced to the HTTP caller.
//!
//! # The sound command
//!
//! A compound sequence with the display used twice under different intents:
//! show the clip's cue image, play the clip from live storage, wait for the
//! audio to physically drain plus a settle delay, then re-request the face
//! slot with the currently shown face so the display reverts. The revert
//! happens whether or not the clip played.

use crate::assets::AssetCache;
use crate::audio::{PcmSink, package_wav, playback_drain, wav_stream_params};
use crate::coordinator::Coordinator;
use crate::hw::{ImageFormat, Screen, Speaker, Synth};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Bounded wait for the first synthesized sample to arrive.
const FIRST_SAMPLE_WAIT_MS: u64 = 300;
/// Poll granularity while waiting for that first sample.
const FIRST_SAMPLE_POLL_MS: u64 = 5;
/// Pause between sound playback finishing and the face revert.
const SOUND_SETTLE: Duration = Duration::from_millis(200);

/// Where the sequencer currently is in its pass. `Idle` between passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Drawing,
    Speaking,
    ShowingSound,
    PlayingSound,
}

pub struct Sequencer {
    coord: Arc<Coordinator>,
    cache: Arc<AssetCache>,
    screen: Box<dyn Screen>,
    speaker: Box<dyn Speaker>,
    synth: Box<dyn Synth>,
    sink: PcmSink,
    sample_rate: u32,
    media_root: PathBuf,
    state: State,
}

impl Sequencer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        coord: Arc<Coordinator>,
        cache: Arc<AssetCache>,
        screen: Box<dyn Screen>,
        speaker: Box<dyn Speaker>,
        synth: Box<dyn Synth>,
        sink: PcmSink,
        sample_rate: u32,
        media_root: PathBuf,
    ) -> Self {
        Self {
            coord,
            cache,
            screen,
            speaker,
            synth,
            sink,
            sample_rate,
            media_root,
            state: State::Idle,
        }
    }

    /// One cooperative pass: apply settings, drain at most one slot.
    pub fn run_pass(&mut self) {
        self.apply_settings();

        // Local handle so the busy guards don't hold a borrow of self
        let coord = Arc::clone(&self.coord);

        if let Some(name) = coord.face.try_drain() {
            let _busy = coord.face.begin();
            self.set_state(State::Drawing);
            self.draw_face(&name);
        } else if let Some(text) = coord.speech.try_drain() {
            let _busy = coord.speech.begin();
            self.set_state(State::Speaking);
            self.speak(&text);
        } else if let Some(name) = coord.sound.try_drain() {
            let _busy = coord.sound.begin();
            self.play_sound(&name);
        }

        self.set_state(State::Idle);
    }

    fn set_state(&mut self, next: State) {
        if next != self.state {
            log::trace!("sequencer: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn apply_settings(&mut self) {
        if let Some(settings) = self.coord.take_dirty_settings() {
            debug!(
                "applying settings: brightness={} volume={}",
                settings.brightness, settings.volume
            );
            self.screen.set_brightness(settings.brightness);
            self.speaker.set_volume(settings.volume);
        }
    }

    /// Render a mood-matrix face from the cache. Display stays unchanged on
    /// any failure; no retry.
    fn draw_face(&mut self, name: &str) {
        let key = format!("/mood_matrix/{}.png", name);
        debug!("drawing face {}", key);

        let Some(asset) = self.cache.find(&key) else {
            warn!("face {} not cached", key);
            return;
        };
        let Some(format) = image_format(asset.content_type) else {
            warn!("face {} is not an image asset", key);
            return;
        };

        match self.screen.draw(&asset.bytes, format) {
            Ok(()) => {
                self.coord.note_face_shown(name);
                info!("face {} shown", name);
            }
            Err(e) => warn!("face {} draw failed: {}", key, e),
        }
    }

    /// Synthesize, package and play one utterance.
    ///
    /// The wait is for the *first* sample only - good enough for short
    /// utterances, and long ones keep filling the buffer while we package.
    /// Zero accumulated samples still produce a header-only WAV and playback
    /// is attempted with it.
    fn speak(&mut self, text: &str) {
        info!("speaking: \"{}\"", text);
        self.sink.clear();

        if let Err(e) = self.synth.speak(text) {
            warn!("synthesis rejected: {}", e);
            return;
        }

        let mut waited = 0;
        while self.sink.is_empty() && waited < FIRST_SAMPLE_WAIT_MS {
            thread::sleep(Duration::from_millis(FIRST_SAMPLE_POLL_MS));
            waited += FIRST_SAMPLE_POLL_MS;
        }
        if self.sink.is_empty() {
            debug!("no sample within {} ms, packaging anyway", FIRST_SAMPLE_WAIT_MS);
        }

        let samples = self.sink.snapshot();
        let wav = package_wav(&samples, self.sample_rate);

        self.speaker.stop();
        match self.speaker.play(&wav) {
            Ok(()) => {
                // Hold the loop until the audio has physically drained
                thread::sleep(playback_drain(samples.len() * 2, self.sample_rate));
            }
            Err(e) => warn!("speech playback failed: {}", e),
        }
    }

    /// The compound show -> play -> revert sequence.
    fn play_sound(&mut self, name: &str) {
        self.set_state(State::ShowingSound);
        let cue_key = format!("/sounds/{}.png", name);
        match self.cache.find(&cue_key) {
            Some(asset) => match image_format(asset.content_type) {
                Some(format) => {
                    if let Err(e) = self.screen.draw(&asset.bytes, format) {
                        warn!("sound cue {} draw failed: {}", cue_key, e);
                    }
                }
                None => warn!("sound cue {} is not an image asset", cue_key),
            },
            None => warn!("sound cue {} not cached", cue_key),
        }

        self.set_state(State::PlayingSound);
        // Clips are read on demand, not cached
        let clip = self
            .media_root
            .join("sounds")
            .join(format!("{}.wav", name));
        match std::fs::read(&clip) {
            Ok(bytes) => {
                self.speaker.stop();
                match self.speaker.play(&bytes) {
                    Ok(()) => {
                        if let Some((rate, data_bytes)) = wav_stream_params(&bytes) {
                            thread::sleep(playback_drain(data_bytes, rate));
                        }
                        info!("sound {} played ({} bytes)", name, bytes.len());
                    }
                    Err(e) => warn!("sound {} playback failed: {}", name, e),
                }
            }
            Err(e) => warn!("sound clip {} unreadable: {}", clip.display(), e),
        }

        // Revert the display to the current face, success or not
        thread::sleep(SOUND_SETTLE);
        self.coord.face.request(self.coord.face_shown());
    }
}

fn image_format(content_type: crate::assets::ContentType) -> Option<ImageFormat> {
    match content_type {
        crate::assets::ContentType::Png => Some(ImageFormat::Png),
        crate::assets::ContentType::Webp => Some(ImageFormat::Webp),
        _ => None,
    }
}
