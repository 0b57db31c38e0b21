//! Pending-action coordinator between the HTTP threads and the main loop.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐      request()       ┌──────────────────────┐
//! │   HTTP handler threads  │  ──▶ face slot  ──▶  │   Main loop          │
//! │   (rouille)             │  ──▶ speech slot ──▶ │   (sequencer)        │
//! │                         │  ──▶ sound slot ──▶  │   try_drain() once   │
//! │  set_brightness/volume  │  ──▶ settings  ──▶   │   per pass           │
//! └─────────────────────────┘                      └──────────────────────┘
//! ```
//!
//! Each command slot is a latest-value mailbox: capacity one, overwrite on
//! full. A request that lands while an older one is still unconsumed simply
//! replaces it - the device always acts on the newest intent, and the
//! overwritten payload is intentionally lost. This is a design choice, not a
//! missing queue.
//!
//! # Thread safety
//!
//! Payload and pending flag live under one mutex per slot, so the main loop
//! never observes a torn half-written command. `request()` never blocks on
//! hardware and never fails; there is no backpressure toward the HTTP layer.
//! `busy` is owned by the consumer via [`BusyGuard`] - scoped so a failing
//! action can never leave its slot permanently starved.

use log::trace;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct SlotState<T> {
    payload: Option<T>,
    pending: bool,
    busy: bool,
}

/// One command channel with latest-write-wins semantics.
#[derive(Debug)]
pub struct CommandSlot<T> {
    state: Mutex<SlotState<T>>,
    name: &'static str,
}

impl<T> CommandSlot<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            state: Mutex::new(SlotState {
                payload: None,
                pending: false,
                busy: false,
            }),
            name,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Producer side: store the newest payload and mark it pending.
    ///
    /// Always succeeds, never blocks, overwrites an unconsumed payload.
    /// Accepted even while the slot is busy - it will be drained on the
    /// next loop pass.
    pub fn request(&self, payload: T) {
        let mut s = self.lock();
        if s.pending {
            trace!("{} slot: overwriting unconsumed request", self.name);
        }
        s.payload = Some(payload);
        s.pending = true;
    }

    /// Consumer side (main loop only): take the pending payload, if any.
    ///
    /// Clears `pending` and returns the payload iff pending and not busy.
    pub fn try_drain(&self) -> Option<T> {
        let mut s = self.lock();
        if !s.pending || s.busy {
            return None;
        }
        s.pending = false;
        s.payload.take()
    }

    /// Mark the slot busy for the duration of the returned guard.
    pub fn begin(&self) -> BusyGuard<'_, T> {
        self.lock().busy = true;
        BusyGuard { slot: self }
    }

    pub fn is_pending(&self) -> bool {
        self.lock().pending
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }
}

/// Clears `busy` on drop, even if the action panics partway.
pub struct BusyGuard<'a, T> {
    slot: &'a CommandSlot<T>,
}

impl<T> Drop for BusyGuard<'_, T> {
    fn drop(&mut self) {
        self.slot.lock().busy = false;
    }
}

/// Volatile device settings. No persistence across reboots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceSettings {
    pub brightness: u8,
    pub volume: u8,
}

#[derive(Debug)]
struct SettingsCell {
    value: DeviceSettings,
    dirty: bool,
}

/// JSON-serializable state snapshot for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub face: String,
    pub brightness: u8,
    pub volume: u8,
    pub face_pending: bool,
    pub speech_pending: bool,
    pub sound_pending: bool,
    pub cached_assets: usize,
    pub cached_bytes: usize,
}

/// Process-wide coordination state: the three command slots, the settings
/// cell and the currently shown face. One instance, created at startup and
/// shared via `Arc` - no ambient globals.
#[derive(Debug)]
pub struct Coordinator {
    pub face: CommandSlot<String>,
    pub speech: CommandSlot<String>,
    pub sound: CommandSlot<String>,
    settings: Mutex<SettingsCell>,
    current_face: Mutex<String>,
}

impl Coordinator {
    pub fn new(defaults: DeviceSettings, boot_face: &str) -> Self {
        Self {
            face: CommandSlot::new("face"),
            speech: CommandSlot::new("speech"),
            sound: CommandSlot::new("sound"),
            settings: Mutex::new(SettingsCell {
                value: defaults,
                // Dirty at boot so the first pass pushes defaults to hardware
                dirty: true,
            }),
            current_face: Mutex::new(boot_face.to_string()),
        }
    }

    pub fn set_brightness(&self, level: u8) {
        let mut s = self.settings.lock().unwrap_or_else(|e| e.into_inner());
        s.value.brightness = level;
        s.dirty = true;
    }

    pub fn set_volume(&self, level: u8) {
        let mut s = self.settings.lock().unwrap_or_else(|e| e.into_inner());
        s.value.volume = level;
        s.dirty = true;
    }

    pub fn settings(&self) -> DeviceSettings {
        self.settings.lock().unwrap_or_else(|e| e.into_inner()).value
    }

    /// Main loop only: take the settings if they changed since last applied.
    pub fn take_dirty_settings(&self) -> Option<DeviceSettings> {
        let mut s = self.settings.lock().unwrap_or_else(|e| e.into_inner());
        if !s.dirty {
            return None;
        }
        s.dirty = false;
        Some(s.value)
    }

    /// Record the face the sequencer last rendered (used by the sound
    /// command's revert and by the status endpoint).
    pub fn note_face_shown(&self, name: &str) {
        let mut f = self.current_face.lock().unwrap_or_else(|e| e.into_inner());
        *f = name.to_string();
    }

    pub fn face_shown(&self) -> String {
        self.current_face
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn status(&self, cached_assets: usize, cached_bytes: usize) -> StatusSnapshot {
        let settings = self.settings();
        StatusSnapshot {
            face: self.face_shown(),
            brightness: settings.brightness,
            volume: settings.volume,
            face_pending: self.face.is_pending(),
            speech_pending: self.speech.is_pending(),
            sound_pending: self.sound.is_pending(),
            cached_assets,
            cached_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> Coordinator {
        Coordinator::new(
            DeviceSettings {
                brightness: 255,
                volume: 128,
            },
            "pleased",
        )
    }

    #[test]
    fn test_request_then_drain_exactly_once() {
        let slot = CommandSlot::new("test");
        slot.request("happy".to_string());
        assert!(slot.is_pending());

        assert_eq!(slot.try_drain().as_deref(), Some("happy"));
        assert!(!slot.is_pending());
        // Nothing left to do
        assert_eq!(slot.try_drain(), None);
    }

    #[test]
    fn test_latest_write_wins() {
        let slot = CommandSlot::new("test");
        slot.request("a".to_string());
        slot.request("b".to_string());

        // A is lost, B is the only drained value
        assert_eq!(slot.try_drain().as_deref(), Some("b"));
        assert_eq!(slot.try_drain(), None);
    }

    #[test]
    fn test_busy_blocks_drain_until_guard_drops() {
        let slot = CommandSlot::new("test");
        slot.request("a".to_string());

        {
            let _busy = slot.begin();
            assert!(slot.is_busy());
            // Pending but busy: not drainable this pass
            assert_eq!(slot.try_drain(), None);
            assert!(slot.is_pending());
        }

        assert!(!slot.is_busy());
        assert_eq!(slot.try_drain().as_deref(), Some("a"));
    }

    #[test]
    fn test_request_during_busy_accepted_for_next_pass() {
        let slot = CommandSlot::new("test");
        slot.request("first".to_string());
        let drained = slot.try_drain().unwrap();
        assert_eq!(drained, "first");

        {
            let _busy = slot.begin();
            // Arrives mid-action: stored, not blocking, not queued
            slot.request("second".to_string());
            assert!(slot.is_pending());
            assert_eq!(slot.try_drain(), None);
        }

        assert_eq!(slot.try_drain().as_deref(), Some("second"));
    }

    #[test]
    fn test_busy_cleared_even_on_panic() {
        let slot = CommandSlot::<String>::new("test");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _busy = slot.begin();
            panic!("action failed partway");
        }));
        assert!(result.is_err());
        // A stuck busy flag would starve the slot forever
        assert!(!slot.is_busy());
    }

    #[test]
    fn test_settings_dirty_cycle() {
        let coord = coordinator();

        // Dirty at boot: defaults get applied once
        let s = coord.take_dirty_settings().unwrap();
        assert_eq!(s.brightness, 255);
        assert_eq!(coord.take_dirty_settings(), None);

        coord.set_volume(40);
        let s = coord.take_dirty_settings().unwrap();
        assert_eq!(s.volume, 40);
        assert_eq!(s.brightness, 255);
        assert_eq!(coord.take_dirty_settings(), None);
    }

    #[test]
    fn test_slots_independent() {
        let coord = coordinator();
        coord.face.request("happy".to_string());
        coord.sound.request("bell".to_string());

        assert_eq!(coord.speech.try_drain(), None);
        assert_eq!(coord.face.try_drain().as_deref(), Some("happy"));
        assert_eq!(coord.sound.try_drain().as_deref(), Some("bell"));
    }

    #[test]
    fn test_face_shown_tracking() {
        let coord = coordinator();
        assert_eq!(coord.face_shown(), "pleased");
        coord.note_face_shown("angry");
        assert_eq!(coord.face_shown(), "angry");

        let status = coord.status(3, 1024);
        assert_eq!(status.face, "angry");
        assert_eq!(status.cached_assets, 3);
    }
}
