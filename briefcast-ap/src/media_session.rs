//! Lock-screen / notification sink
//!
//! Platform media-session integration is out of scope and modeled as a
//! narrow sink: the player pushes `{ title, artist }` on every topic
//! change, and inbound play/pause intents map onto the same commands the
//! UI uses.

use tracing::info;

/// Outbound notification surface for platform media sessions.
pub trait MediaSessionSink: Send + Sync {
    /// Called on every topic change with the new display metadata.
    fn metadata_changed(&self, title: &str, artist: &str);

    /// Called when the playback state flips, so lock-screen controls can
    /// mirror it.
    fn playback_changed(&self, playing: bool);
}

/// Inbound intent from the platform media session (lock-screen buttons).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaIntent {
    /// Resume playback
    Play,
    /// Pause playback
    Pause,
}

/// Default sink: logs metadata updates via tracing.
pub struct LogMediaSession;

impl MediaSessionSink for LogMediaSession {
    fn metadata_changed(&self, title: &str, artist: &str) {
        info!("Media session metadata: {} / {}", title, artist);
    }

    fn playback_changed(&self, playing: bool) {
        info!("Media session playback: {}", if playing { "playing" } else { "paused" });
    }
}
