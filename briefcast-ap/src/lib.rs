//! # Briefcast Audio Player Library (briefcast-ap)
//!
//! Headless playback engine for voice-synthesized topic segments.
//!
//! **Purpose:** Poll a segment manifest, decode new segments, and schedule
//! them gaplessly against a shared audio clock with crossfades (live path);
//! manage an ordered topic queue with play/advance/rewind and auto-advance
//! over discrete per-topic tracks (on-demand path). An HTTP/SSE surface
//! exposes the command set to out-of-scope presentation code.
//!
//! **Architecture:** reqwest fetch → symphonia decode → rubato resample →
//! schedule-at-time mixer → ringbuf → cpal output.

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod fetch;
pub mod live;
pub mod media_session;
pub mod player;
pub mod queue;
pub mod state;

pub use error::{Error, Result};
pub use player::Player;
pub use state::SharedState;
