//! Topic queue state machine
//!
//! Tracks the ordered topic list, the current position, and the played
//! set. Pure state: all audio side effects live in the session layer.
//!
//! The ordered list is re-derived from the external feed on every poll;
//! the current position is relocated by topic id in the new ordering and
//! falls back to "none" if the topic disappeared. Topics without a ready
//! audio resource are never auto-selected by next/prev.

use briefcast_common::types::Topic;
use std::collections::HashSet;

/// Queue state over the polled topic list
#[derive(Debug, Default)]
pub struct TopicQueue {
    /// Topics in playback order (timestamp ascending)
    topics: Vec<Topic>,

    /// Index of the current topic, when it is part of the queue
    current_index: Option<usize>,

    /// The current topic itself. Set even for one-off selections that are
    /// not part of the queue (then `current_index` is None).
    current_topic: Option<Topic>,

    /// Ids of topics whose playback has started
    played_ids: HashSet<String>,
}

impl TopicQueue {
    /// Create an empty queue (Idle)
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the ordered topic list, relocating the current topic by id.
    ///
    /// Returns true when the list of topic ids actually changed.
    pub fn set_queue(&mut self, topics: Vec<Topic>) -> bool {
        let changed = self.topics.len() != topics.len()
            || self
                .topics
                .iter()
                .zip(topics.iter())
                .any(|(a, b)| a.id != b.id);

        self.topics = topics;
        self.current_index = self
            .current_topic
            .as_ref()
            .and_then(|current| self.topics.iter().position(|t| t.id == current.id));

        changed
    }

    /// Make a topic current and mark it played.
    ///
    /// A topic absent from the queue becomes a one-off selection:
    /// `current_index` is None while the topic is still current.
    pub fn select(&mut self, topic: &Topic) {
        self.current_index = self.topics.iter().position(|t| t.id == topic.id);
        self.current_topic = Some(topic.clone());
        self.played_ids.insert(topic.id.clone());
    }

    /// The current topic, if any
    pub fn current_topic(&self) -> Option<&Topic> {
        self.current_topic.as_ref()
    }

    /// Index of the current topic within the queue, if it is a member
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Whether playback of this topic has started at some point
    pub fn is_played(&self, topic: &Topic) -> bool {
        self.played_ids.contains(&topic.id)
    }

    /// Whether playback of the topic with this id has started
    pub fn is_played_id(&self, id: &str) -> bool {
        self.played_ids.contains(id)
    }

    /// Find a topic by id
    pub fn topic_by_id(&self, id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    /// Next ready topic after the current position.
    ///
    /// From Idle (no current member), the search starts at the front.
    /// Not-ready topics are skipped; None when no ready topic remains.
    pub fn next_ready(&self) -> Option<&Topic> {
        let start = match self.current_index {
            Some(i) => i + 1,
            None => 0,
        };
        self.topics[start.min(self.topics.len())..]
            .iter()
            .find(|t| t.is_ready())
    }

    /// Nearest ready topic before the current position.
    ///
    /// None from Idle or at the front boundary.
    pub fn prev_ready(&self) -> Option<&Topic> {
        let end = self.current_index?;
        self.topics[..end].iter().rev().find(|t| t.is_ready())
    }

    /// Topics after the current position (not yet reached).
    ///
    /// Recomputed projection; from Idle the whole queue is still ahead.
    pub fn playback_queue(&self) -> &[Topic] {
        match self.current_index {
            Some(i) => &self.topics[i + 1..],
            None => &self.topics,
        }
    }

    /// Topics before the current position.
    pub fn played_topics(&self) -> &[Topic] {
        match self.current_index {
            Some(i) => &self.topics[..i],
            None => &[],
        }
    }

    /// Number of topics in the queue
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Topic ids in playback order
    pub fn topic_ids(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn topic(id: &str, minute: u32, ready: bool) -> Topic {
        Topic {
            id: id.to_string(),
            title: format!("Topic {}", id),
            sender: Some("newsdesk".to_string()),
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap(),
            audio_url: ready.then(|| format!("https://cdn.example/topics/{}.m4a", id)),
        }
    }

    #[test]
    fn test_new_queue_is_idle() {
        let queue = TopicQueue::new();
        assert!(queue.current_topic().is_none());
        assert!(queue.current_index().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_select_marks_played_and_positions() {
        let mut queue = TopicQueue::new();
        queue.set_queue(vec![topic("a", 0, true), topic("b", 1, true)]);

        let b = queue.topic_by_id("b").unwrap().clone();
        queue.select(&b);

        assert_eq!(queue.current_index(), Some(1));
        assert_eq!(queue.current_topic().unwrap().id, "b");
        assert!(queue.is_played_id("b"));
        assert!(!queue.is_played_id("a"));
    }

    #[test]
    fn test_one_off_selection() {
        let mut queue = TopicQueue::new();
        queue.set_queue(vec![topic("a", 0, true)]);

        // Not in the queue: plays as a one-off
        let external = topic("x", 5, true);
        queue.select(&external);

        assert!(queue.current_index().is_none());
        assert_eq!(queue.current_topic().unwrap().id, "x");
        assert!(queue.is_played_id("x"));
        // The whole queue is still "ahead"
        assert_eq!(queue.playback_queue().len(), 1);
        assert!(queue.played_topics().is_empty());
    }

    #[test]
    fn test_set_queue_relocates_current_by_id() {
        let mut queue = TopicQueue::new();
        queue.set_queue(vec![topic("a", 0, true), topic("b", 1, true)]);
        let b = queue.topic_by_id("b").unwrap().clone();
        queue.select(&b);
        assert_eq!(queue.current_index(), Some(1));

        // Superset and reordering: b moves to the front
        queue.set_queue(vec![
            topic("b", 1, true),
            topic("c", 2, true),
            topic("a", 0, true),
        ]);
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(queue.current_topic().unwrap().id, "b");
    }

    #[test]
    fn test_set_queue_current_disappears() {
        let mut queue = TopicQueue::new();
        queue.set_queue(vec![topic("a", 0, true)]);
        let a = queue.topic_by_id("a").unwrap().clone();
        queue.select(&a);

        queue.set_queue(vec![topic("b", 1, true)]);
        assert!(queue.current_index().is_none());
        // The topic object itself remains current until a new selection
        assert_eq!(queue.current_topic().unwrap().id, "a");
    }

    #[test]
    fn test_set_queue_reports_change() {
        let mut queue = TopicQueue::new();
        assert!(queue.set_queue(vec![topic("a", 0, true)]));
        assert!(!queue.set_queue(vec![topic("a", 0, true)]));
        assert!(queue.set_queue(vec![topic("a", 0, true), topic("b", 1, true)]));
    }

    #[test]
    fn test_next_ready_skips_not_ready() {
        let mut queue = TopicQueue::new();
        queue.set_queue(vec![
            topic("t1", 0, true),
            topic("t2", 1, false),
            topic("t3", 2, true),
        ]);
        let t1 = queue.topic_by_id("t1").unwrap().clone();
        queue.select(&t1);

        // t2 is not ready: next skips straight to t3
        assert_eq!(queue.next_ready().unwrap().id, "t3");
    }

    #[test]
    fn test_next_ready_none_at_boundary() {
        let mut queue = TopicQueue::new();
        queue.set_queue(vec![topic("a", 0, true), topic("b", 1, false)]);
        let a = queue.topic_by_id("a").unwrap().clone();
        queue.select(&a);

        assert!(queue.next_ready().is_none());
    }

    #[test]
    fn test_next_ready_from_idle_starts_at_front() {
        let mut queue = TopicQueue::new();
        queue.set_queue(vec![topic("a", 0, false), topic("b", 1, true)]);
        assert_eq!(queue.next_ready().unwrap().id, "b");
    }

    #[test]
    fn test_prev_ready_skips_not_ready() {
        let mut queue = TopicQueue::new();
        queue.set_queue(vec![
            topic("t1", 0, true),
            topic("t2", 1, false),
            topic("t3", 2, true),
        ]);
        let t3 = queue.topic_by_id("t3").unwrap().clone();
        queue.select(&t3);

        assert_eq!(queue.prev_ready().unwrap().id, "t1");
    }

    #[test]
    fn test_prev_ready_none_from_idle_or_front() {
        let mut queue = TopicQueue::new();
        queue.set_queue(vec![topic("a", 0, true), topic("b", 1, true)]);
        assert!(queue.prev_ready().is_none());

        let a = queue.topic_by_id("a").unwrap().clone();
        queue.select(&a);
        assert!(queue.prev_ready().is_none());
    }

    #[test]
    fn test_projections() {
        let mut queue = TopicQueue::new();
        queue.set_queue(vec![
            topic("a", 0, true),
            topic("b", 1, true),
            topic("c", 2, true),
        ]);
        let b = queue.topic_by_id("b").unwrap().clone();
        queue.select(&b);

        let ahead: Vec<&str> = queue.playback_queue().iter().map(|t| t.id.as_str()).collect();
        let behind: Vec<&str> = queue.played_topics().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ahead, vec!["c"]);
        assert_eq!(behind, vec!["a"]);
    }
}
