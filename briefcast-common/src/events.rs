//! Event types for the Briefcast event system
//!
//! Provides shared event definitions and the EventBus used by the player
//! and its SSE control surface.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::Topic;

/// Playback state (Playing or Paused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Audio clock advancing, scheduled audio audible
    Playing,
    /// Audio clock suspended, polling halted
    Paused,
}

/// Briefcast event types
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission. All events use this central enum for type safety and
/// exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BriefcastEvent {
    /// Playback state changed (Playing ↔ Paused)
    ///
    /// Triggers:
    /// - SSE: Update UI controls
    /// - Media session: Update lock-screen play/pause state
    PlaybackStateChanged {
        /// Playback state before change
        old_state: PlaybackState,
        /// Playback state after change
        new_state: PlaybackState,
        /// When state changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The active topic changed
    ///
    /// In the live path this is derived from segment metadata; in the
    /// on-demand path from the selected queue entry.
    ///
    /// Triggers:
    /// - SSE: Update "now playing" display
    /// - Media session: Push { title, artist } metadata
    TopicChanged {
        /// Topic identifier extracted from metadata or feed
        topic_id: String,
        /// Topic title when known (on-demand path)
        title: Option<String>,
        /// Sender when known (on-demand path)
        sender: Option<String>,
        /// When the change was observed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An on-demand track reached natural completion
    ///
    /// Triggers:
    /// - Queue manager: auto-advance (exactly once per completion)
    /// - SSE: Update played indicators
    TopicCompleted {
        /// Topic whose track completed
        topic_id: String,
        /// Track duration in seconds
        duration_seconds: f64,
        /// When completion was detected
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A live segment was scheduled against the audio clock
    ///
    /// Triggers:
    /// - SSE: Diagnostics / live-edge display
    SegmentScheduled {
        /// Segment URL (identity)
        url: String,
        /// Clock time the segment starts at (seconds)
        start_time: f64,
        /// Segment duration in seconds
        duration: f64,
        /// When scheduling happened
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The ordered topic queue was re-derived from the feed
    ///
    /// Triggers:
    /// - SSE: Update queue display
    QueueChanged {
        /// Topic ids in playback order
        topic_ids: Vec<String>,
        /// When the queue was rebuilt
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Mute toggled
    ///
    /// Mute is a master-gain multiplier; scheduling is unaffected.
    MuteChanged {
        /// New mute state
        muted: bool,
        /// When mute changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback progress update for the on-demand track
    ///
    /// Emitted periodically while a track plays.
    PlaybackProgress {
        /// Current position in seconds
        position_seconds: f64,
        /// Track duration in seconds
        duration_seconds: f64,
        /// Update timestamp
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl BriefcastEvent {
    /// Event type string used as the SSE `event:` field
    pub fn type_str(&self) -> &'static str {
        match self {
            BriefcastEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            BriefcastEvent::TopicChanged { .. } => "TopicChanged",
            BriefcastEvent::TopicCompleted { .. } => "TopicCompleted",
            BriefcastEvent::SegmentScheduled { .. } => "SegmentScheduled",
            BriefcastEvent::QueueChanged { .. } => "QueueChanged",
            BriefcastEvent::MuteChanged { .. } => "MuteChanged",
            BriefcastEvent::PlaybackProgress { .. } => "PlaybackProgress",
        }
    }

    /// Convenience constructor for topic changes observed in the live path,
    /// where only the id is known.
    pub fn topic_changed_by_id(topic_id: String) -> Self {
        BriefcastEvent::TopicChanged {
            topic_id,
            title: None,
            sender: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Convenience constructor for topic changes in the on-demand path.
    pub fn topic_changed(topic: &Topic) -> Self {
        BriefcastEvent::TopicChanged {
            topic_id: topic.id.clone(),
            title: Some(topic.title.clone()),
            sender: topic.sender.clone(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BriefcastEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<BriefcastEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// A send error only means no subscriber is currently listening, which
    /// is not a failure for fire-and-forget emission.
    pub fn emit(&self, event: BriefcastEvent) {
        let _ = self.tx.send(event);
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(BriefcastEvent::MuteChanged {
            muted: true,
            timestamp: chrono::Utc::now(),
        });

        match rx.recv().await.unwrap() {
            BriefcastEvent::MuteChanged { muted, .. } => assert!(muted),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_ok() {
        let bus = EventBus::new(16);
        // No subscriber; emit must not panic or error out.
        bus.emit(BriefcastEvent::topic_changed_by_id("abc".into()));
    }

    #[test]
    fn test_event_type_strings() {
        let ev = BriefcastEvent::topic_changed_by_id("abc".into());
        assert_eq!(ev.type_str(), "TopicChanged");
    }

    #[test]
    fn test_event_serialization_tagged() {
        let ev = BriefcastEvent::SegmentScheduled {
            url: "http://h/seg1.ts".into(),
            start_time: 1.5,
            duration: 4.0,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"type\":\"SegmentScheduled\""));
    }
}
