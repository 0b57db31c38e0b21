//! HTTP control surface for the appliance.
//!
//! # Purpose
//!
//! Translates inbound web requests into coordinator calls and serves the
//! cached static assets. This is the producer side of the command slots: a
//! handler stores the newest payload and returns immediately - acceptance
//! always succeeds, and the eventual hardware outcome is never reported back
//! (best-effort, fire-and-forget).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐      request()       ┌──────────────────────┐
//! │   API Server Thread     │  ──▶ command slot ──▶│   Main Loop          │
//! │   (rouille HTTP)        │                      │   (sequencer)        │
//! │                         │                      │                      │
//! │  POST /api/face/happy   │  ──▶ face slot       │  drains one slot     │
//! │  POST /api/say {text}   │  ──▶ speech slot     │  per pass            │
//! │  GET  /www/assets/...   │  ◀── asset cache (read-only)                │
//! └─────────────────────────┘                      └──────────────────────┘
//! ```
//!
//! - **rouille** - sync HTTP server (no async runtime on the appliance)
//! - **command slots** - latest-write-wins mailboxes, never block a handler
//! - **asset cache** - immutable after boot, shared by plain `Arc`
//!
//! # Endpoints
//!
//! | Method | Path                  | Description                         |
//! |--------|-----------------------|-------------------------------------|
//! | POST   | `/api/face/{name}`    | Show a mood-matrix face             |
//! | POST   | `/api/say`            | Speak JSON `{"text": ...}`          |
//! | POST   | `/api/sound/{name}`   | Cue image + sound clip + revert     |
//! | POST   | `/api/brightness/{n}` | Set display brightness (0-255)      |
//! | POST   | `/api/volume/{n}`     | Set speaker volume (0-255)          |
//! | GET    | `/api/status`         | Settings, shown face, pending flags |
//! | GET    | `/api/health`         | Health check                        |
//! | GET    | *other*               | Cached asset by exact path, or 404  |

mod api;

pub use api::ApiServer;
