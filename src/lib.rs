//! MOODBOX - face/speech/sound appliance library
//!
//! Re-exports the coordination core for the daemon binary and device ports.

// Coordination core (cache, slots, audio, sequencer)
pub mod assets;
pub mod audio;
pub mod coordinator;
pub mod hw;
pub mod sequencer;

// App modules
pub mod cli;
pub mod server;

// Re-export commonly used types
pub use assets::{AssetCache, CACHE_FOLDERS, CachedAsset, ContentType};
pub use audio::{PcmBuffer, PcmSink, package_wav, playback_drain};
pub use coordinator::{CommandSlot, Coordinator, DeviceSettings};
pub use sequencer::Sequencer;
pub use server::ApiServer;
