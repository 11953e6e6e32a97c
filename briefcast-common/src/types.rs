//! Topic model
//!
//! Topics are produced by an external metadata feed and consumed read-only
//! by the playback components. A topic becomes playable once its audio
//! resource has been rendered and published.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Readiness of a topic's audio resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicReadyState {
    /// Audio is still being rendered; topic cannot be played yet
    Processing,
    /// Audio resource is published and fetchable
    Ready,
}

/// One content item ("story") from the topic feed.
///
/// Immutable once observed. Identity is `id`; the feed may re-deliver the
/// same topic across polls and consumers keep the first occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    /// Stable topic identifier (UUID-like string from the feed)
    pub id: String,

    /// Display title
    pub title: String,

    /// Originating sender, when known
    #[serde(default)]
    pub sender: Option<String>,

    /// Publication timestamp; feed ordering is ascending by this field
    pub timestamp: DateTime<Utc>,

    /// URL of the rendered single-file audio resource, once available
    #[serde(default)]
    pub audio_url: Option<String>,
}

impl Topic {
    /// Readiness derived from audio resource presence
    pub fn ready_state(&self) -> TopicReadyState {
        if self.audio_url.is_some() {
            TopicReadyState::Ready
        } else {
            TopicReadyState::Processing
        }
    }

    /// True when the topic's audio resource can be played
    pub fn is_ready(&self) -> bool {
        self.ready_state() == TopicReadyState::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn topic(id: &str, audio_url: Option<&str>) -> Topic {
        Topic {
            id: id.to_string(),
            title: format!("Topic {}", id),
            sender: None,
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            audio_url: audio_url.map(String::from),
        }
    }

    #[test]
    fn test_ready_state_derived_from_audio_url() {
        assert_eq!(topic("a", None).ready_state(), TopicReadyState::Processing);
        assert_eq!(
            topic("b", Some("http://feed/b.m4a")).ready_state(),
            TopicReadyState::Ready
        );
        assert!(!topic("a", None).is_ready());
        assert!(topic("b", Some("http://feed/b.m4a")).is_ready());
    }

    #[test]
    fn test_feed_record_deserialization() {
        let json = r#"{
            "id": "0a1b2c3d",
            "title": "Markets open higher",
            "sender": "newsdesk",
            "timestamp": "2025-06-01T12:00:00Z",
            "audio_url": "https://cdn.example/topics/0a1b2c3d.m4a"
        }"#;
        let t: Topic = serde_json::from_str(json).unwrap();
        assert_eq!(t.id, "0a1b2c3d");
        assert_eq!(t.sender.as_deref(), Some("newsdesk"));
        assert!(t.is_ready());
    }

    #[test]
    fn test_feed_record_missing_optional_fields() {
        let json = r#"{
            "id": "0a1b2c3d",
            "title": "Still processing",
            "timestamp": "2025-06-01T12:00:00Z"
        }"#;
        let t: Topic = serde_json::from_str(json).unwrap();
        assert!(t.sender.is_none());
        assert!(!t.is_ready());
    }
}
