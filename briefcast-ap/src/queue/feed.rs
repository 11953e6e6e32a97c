//! Topic feed polling
//!
//! The topic feed is a read-only JSON list polled at a fixed interval.
//! Duplicate ids may arrive across polls; the first occurrence wins.
//! The queue ordering is timestamp ascending, re-sorted on every poll.

use crate::error::{Error, Result};
use crate::fetch::RemoteFetcher;
use briefcast_common::types::Topic;
use std::collections::HashSet;
use std::sync::Arc;

/// Normalize a raw feed delivery into queue order: deduplicate by id
/// keeping the first occurrence, then sort ascending by timestamp.
pub fn normalize_feed(raw: Vec<Topic>) -> Vec<Topic> {
    let mut seen = HashSet::new();
    let mut topics: Vec<Topic> = raw
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect();
    topics.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    topics
}

/// Fetch and normalize one feed delivery.
pub async fn poll_feed(fetcher: &Arc<dyn RemoteFetcher>, feed_url: &str) -> Result<Vec<Topic>> {
    let body = fetcher
        .fetch_text(feed_url)
        .await
        .map_err(|e| Error::TopicFeed(format!("Fetch of {} failed: {}", feed_url, e)))?;

    let raw: Vec<Topic> = serde_json::from_str(&body)
        .map_err(|e| Error::TopicFeed(format!("Malformed feed from {}: {}", feed_url, e)))?;

    Ok(normalize_feed(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn topic(id: &str, minute: u32, title: &str) -> Topic {
        Topic {
            id: id.to_string(),
            title: title.to_string(),
            sender: None,
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap(),
            audio_url: None,
        }
    }

    #[test]
    fn test_normalize_sorts_ascending_by_timestamp() {
        let topics = normalize_feed(vec![
            topic("c", 30, "third"),
            topic("a", 10, "first"),
            topic("b", 20, "second"),
        ]);
        let ids: Vec<&str> = topics.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_normalize_dedup_keeps_first_occurrence() {
        let topics = normalize_feed(vec![
            topic("a", 10, "original"),
            topic("a", 10, "duplicate"),
            topic("b", 20, "other"),
        ]);
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].title, "original");
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize_feed(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn test_poll_feed_malformed_json() {
        struct BadFetcher;

        #[async_trait::async_trait]
        impl RemoteFetcher for BadFetcher {
            async fn fetch_text(&self, _url: &str) -> Result<String> {
                Ok("not json".to_string())
            }
            async fn fetch_bytes(&self, _url: &str) -> Result<Vec<u8>> {
                unreachable!()
            }
        }

        let fetcher: Arc<dyn RemoteFetcher> = Arc::new(BadFetcher);
        let result = poll_feed(&fetcher, "https://feed.example/topics").await;
        assert!(matches!(result, Err(Error::TopicFeed(_))));
    }
}
