//! On-demand playback path
//!
//! A session over the polled topic feed: the queue state machine plus the
//! audio side effects (resource switches on the clock source, play/pause,
//! auto-advance on natural completion).

pub mod feed;
pub mod manager;

pub use feed::{normalize_feed, poll_feed};
pub use manager::TopicQueue;

use crate::audio::mixer::MixerHandle;
use crate::audio::types::SegmentAudio;
use crate::error::{Error, Result};
use crate::fetch::{AudioFetchPipeline, RemoteFetcher};
use crate::state::SharedState;
use async_trait::async_trait;
use briefcast_common::events::{BriefcastEvent, PlaybackState};
use briefcast_common::types::Topic;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

/// Source of decoded track audio for ready topics.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Fetch and decode one topic's audio resource
    async fn track(&self, url: &str) -> Result<SegmentAudio>;
}

#[async_trait]
impl TrackSource for AudioFetchPipeline {
    async fn track(&self, url: &str) -> Result<SegmentAudio> {
        self.fetch_audio(url).await
    }
}

/// One on-demand session: queue state plus clock-source commands.
pub struct QueueSession {
    queue: RwLock<TopicQueue>,
    mixer: MixerHandle,
    source: Arc<dyn TrackSource>,
    state: Arc<SharedState>,
    stop_tx: std::sync::Mutex<Option<watch::Sender<bool>>>,
}

impl QueueSession {
    /// Create a session; feed polling starts separately via `start_feed`.
    pub fn new(
        mixer: MixerHandle,
        source: Arc<dyn TrackSource>,
        state: Arc<SharedState>,
    ) -> Self {
        Self {
            queue: RwLock::new(TopicQueue::new()),
            mixer,
            source,
            state,
            stop_tx: std::sync::Mutex::new(None),
        }
    }

    /// Replace the ordered topic list (normalized feed delivery).
    pub async fn set_queue(&self, topics: Vec<Topic>) {
        let (changed, topic_ids) = {
            let mut queue = self.queue.write().await;
            let changed = queue.set_queue(topics);
            (changed, queue.topic_ids())
        };
        if changed {
            self.state.emit(BriefcastEvent::QueueChanged {
                topic_ids,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Play a topic, or toggle play/pause when it is already current.
    ///
    /// The resource switch is atomic from the caller's perspective: the
    /// queue position and current topic move to the new topic before the
    /// fetch begins, and on fetch/decode failure the position keeps its
    /// new value while the playback state reports Paused and the call
    /// returns `Error::ResourceSwitch`.
    pub async fn play_topic(&self, topic: &Topic) -> Result<()> {
        // Same topic with its track actually loaded: toggle play/pause
        // without touching the position. After a failed resource switch
        // the topic is current but unloaded, and a repeat call retries
        // the switch instead.
        let current_id = self.state.current_topic().await.map(|t| t.id);
        if current_id.as_deref() == Some(topic.id.as_str())
            && self.mixer.loaded_topic_id().as_deref() == Some(topic.id.as_str())
        {
            if self.mixer.is_suspended() {
                self.mixer.resume();
                self.state.set_playback_state(PlaybackState::Playing).await;
            } else {
                self.mixer.suspend();
                self.state.set_playback_state(PlaybackState::Paused).await;
            }
            return Ok(());
        }

        let Some(audio_url) = topic.audio_url.clone() else {
            return Err(Error::NotReady(format!(
                "Topic {} has no audio resource yet",
                topic.id
            )));
        };

        // Commit the switch before fetching: the old topic is no longer
        // current once the switch begins.
        self.queue.write().await.select(topic);
        self.state.set_current_topic(Some(topic.clone())).await;

        let audio = match self.source.track(&audio_url).await {
            Ok(audio) => audio,
            Err(e) => {
                self.state.set_playback_state(PlaybackState::Paused).await;
                return Err(Error::ResourceSwitch(format!(
                    "Audio for topic {} failed to load: {}",
                    topic.id, e
                )));
            }
        };

        self.mixer.load_track(&topic.id, audio)?;
        self.mixer.resume();
        self.state.set_playback_state(PlaybackState::Playing).await;
        self.state.emit(BriefcastEvent::topic_changed(topic));

        info!("Playing topic {} ({})", topic.id, topic.title);
        Ok(())
    }

    /// Advance to the nearest ready topic after the current position.
    ///
    /// Not-ready topics are skipped, never auto-selected. Returns None at
    /// the boundary (no ready topic remains).
    pub async fn play_next_topic(&self) -> Result<Option<Topic>> {
        let next = self.queue.read().await.next_ready().cloned();
        match next {
            Some(topic) => {
                self.play_topic(&topic).await?;
                Ok(Some(topic))
            }
            None => Ok(None),
        }
    }

    /// Step back to the nearest ready topic before the current position.
    pub async fn play_prev_topic(&self) -> Result<Option<Topic>> {
        let prev = self.queue.read().await.prev_ready().cloned();
        match prev {
            Some(topic) => {
                self.play_topic(&topic).await?;
                Ok(Some(topic))
            }
            None => Ok(None),
        }
    }

    /// Toggle play/pause, auto-starting from the queue front when nothing
    /// is current yet.
    pub async fn toggle_play(&self) -> Result<()> {
        match self.state.current_topic().await {
            Some(topic) => self.play_topic(&topic).await,
            None => {
                // Nothing loaded: start with the first ready topic
                self.play_next_topic().await.map(|_| ())
            }
        }
    }

    /// Natural-completion handler; invoked once per completion event.
    ///
    /// Auto-advances exactly once; when the queue is exhausted the state
    /// drops to Paused.
    pub async fn on_track_completed(&self, topic_id: &str, duration_seconds: f64) {
        self.state.emit(BriefcastEvent::TopicCompleted {
            topic_id: topic_id.to_string(),
            duration_seconds,
            timestamp: chrono::Utc::now(),
        });

        match self.play_next_topic().await {
            Ok(Some(topic)) => debug!("Auto-advanced to topic {}", topic.id),
            Ok(None) => {
                info!("Queue exhausted after topic {}", topic_id);
                self.state.set_playback_state(PlaybackState::Paused).await;
            }
            Err(e) => {
                // Advance failure is not fatal to the session
                warn!("Auto-advance failed: {}", e);
            }
        }
    }

    /// Membership test against the played set
    pub async fn is_played(&self, topic_id: &str) -> bool {
        self.queue.read().await.is_played_id(topic_id)
    }

    /// Topic ids after the current position
    pub async fn playback_queue_ids(&self) -> Vec<String> {
        self.queue
            .read()
            .await
            .playback_queue()
            .iter()
            .map(|t| t.id.clone())
            .collect()
    }

    /// Topic ids before the current position
    pub async fn played_topic_ids(&self) -> Vec<String> {
        self.queue
            .read()
            .await
            .played_topics()
            .iter()
            .map(|t| t.id.clone())
            .collect()
    }

    /// Find a queue member by id
    pub async fn topic_by_id(&self, id: &str) -> Option<Topic> {
        self.queue.read().await.topic_by_id(id).cloned()
    }

    /// Start the feed poll loop.
    pub fn start_feed(
        self: &Arc<Self>,
        fetcher: Arc<dyn RemoteFetcher>,
        feed_url: String,
        poll_interval: Duration,
    ) {
        let mut guard = self.stop_tx.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_some() {
            return; // already polling
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        *guard = Some(stop_tx);

        let session = Arc::clone(self);
        tokio::spawn(async move {
            debug!("Topic feed poll loop started");
            loop {
                match poll_feed(&fetcher, &feed_url).await {
                    Ok(topics) => session.set_queue(topics).await,
                    Err(e) => warn!("Feed poll failed, retrying next tick: {}", e),
                }

                tokio::select! {
                    _ = tokio::time::sleep(poll_interval) => {}
                    _ = stop_rx.changed() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Topic feed poll loop stopped");
        });
    }

    /// Stop the feed poll loop.
    pub fn stop_feed(&self) {
        let mut guard = self.stop_tx.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(stop_tx) = guard.take() {
            let _ = stop_tx.send(true);
        }
    }
}
