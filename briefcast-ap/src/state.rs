//! Shared playback state
//!
//! Thread-safe shared state for coordination between the player facade,
//! the session loops, and the HTTP surface.

use briefcast_common::events::{BriefcastEvent, EventBus, PlaybackState};
use briefcast_common::types::Topic;
use tokio::sync::RwLock;

/// Shared state accessible by all components
///
/// Uses RwLock for concurrent read access with rare writes.
pub struct SharedState {
    /// Current playback state (Playing or Paused)
    pub playback_state: RwLock<PlaybackState>,

    /// Currently active topic (live-derived or queue-selected)
    pub current_topic: RwLock<Option<Topic>>,

    /// Mute state (master gain 0 or 1); decoupled from play/pause
    pub muted: RwLock<bool>,

    /// Event bus shared with SSE subscribers
    pub events: EventBus,
}

impl SharedState {
    /// Create new shared state with default values
    pub fn new(event_capacity: usize) -> Self {
        Self {
            playback_state: RwLock::new(PlaybackState::Paused),
            current_topic: RwLock::new(None),
            muted: RwLock::new(false),
            events: EventBus::new(event_capacity),
        }
    }

    /// Broadcast an event to all subscribers
    pub fn emit(&self, event: BriefcastEvent) {
        self.events.emit(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<BriefcastEvent> {
        self.events.subscribe()
    }

    /// Get current playback state
    pub async fn playback_state(&self) -> PlaybackState {
        *self.playback_state.read().await
    }

    /// Set playback state, emitting a PlaybackStateChanged event when it
    /// actually changes.
    pub async fn set_playback_state(&self, new_state: PlaybackState) {
        let old_state = {
            let mut guard = self.playback_state.write().await;
            let old = *guard;
            *guard = new_state;
            old
        };
        if old_state != new_state {
            self.emit(BriefcastEvent::PlaybackStateChanged {
                old_state,
                new_state,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Get the currently active topic
    pub async fn current_topic(&self) -> Option<Topic> {
        self.current_topic.read().await.clone()
    }

    /// Set the currently active topic
    pub async fn set_current_topic(&self, topic: Option<Topic>) {
        *self.current_topic.write().await = topic;
    }

    /// Get mute state
    pub async fn is_muted(&self) -> bool {
        *self.muted.read().await
    }

    /// Set mute state, emitting MuteChanged when it actually changes
    pub async fn set_muted(&self, muted: bool) {
        let changed = {
            let mut guard = self.muted.write().await;
            let changed = *guard != muted;
            *guard = muted;
            changed
        };
        if changed {
            self.emit(BriefcastEvent::MuteChanged {
                muted,
                timestamp: chrono::Utc::now(),
            });
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_playback_state_transitions() {
        let state = SharedState::default();

        // Default is Paused until the first play intent
        assert_eq!(state.playback_state().await, PlaybackState::Paused);

        state.set_playback_state(PlaybackState::Playing).await;
        assert_eq!(state.playback_state().await, PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_state_change_emits_event() {
        let state = SharedState::default();
        let mut rx = state.subscribe_events();

        state.set_playback_state(PlaybackState::Playing).await;

        match rx.recv().await.unwrap() {
            BriefcastEvent::PlaybackStateChanged { old_state, new_state, .. } => {
                assert_eq!(old_state, PlaybackState::Paused);
                assert_eq!(new_state, PlaybackState::Playing);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_redundant_state_change_emits_nothing() {
        let state = SharedState::default();
        let mut rx = state.subscribe_events();

        state.set_playback_state(PlaybackState::Paused).await;
        state.set_muted(false).await;

        assert!(rx.try_recv().is_err());
    }
}
