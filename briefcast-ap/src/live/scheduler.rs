//! Crossfade scheduler
//!
//! Core of the live path. Maintains a monotonically advancing
//! next-start-time cursor and an append-only processed-URL set, schedules
//! decoded segments with fade envelopes so adjacent segments overlap by
//! one crossfade window, and derives the active topic purely from segment
//! metadata.
//!
//! Two modes:
//! - **Bootstrap** (first successful poll of a session): every listed
//!   segment is marked processed without playing, except the most recent
//!   one, which is scheduled immediately at the current clock time (jump
//!   to the live edge).
//! - **Steady** (every later poll): each not-yet-processed segment is
//!   scheduled in manifest order at
//!   `max(now + pre_buffer, next_start_time)`.

use crate::audio::mixer::ScheduleSink;
use crate::audio::types::SegmentAudio;
use crate::error::{Error, Result};
use crate::fetch::AudioFetchPipeline;
use crate::live::manifest::{parse_manifest, Segment};
use crate::live::topic_marker::extract_topic_id;
use async_trait::async_trait;
use briefcast_common::events::{BriefcastEvent, EventBus};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

/// Scheduling parameters
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Forward buffer from "now" for newly scheduled segments, in
    /// seconds. Gives the decode+schedule round trip time to complete
    /// before the engine needs the first sample.
    pub pre_buffer_seconds: f64,

    /// Crossfade window in seconds
    pub crossfade_seconds: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pre_buffer_seconds: 0.5,
            crossfade_seconds: 0.03,
        }
    }
}

/// Source of manifest text and decoded segment audio.
///
/// The production implementation fetches over HTTP and decodes; tests
/// substitute canned data.
#[async_trait]
pub trait SegmentSource: Send + Sync {
    /// Fetch the current manifest text
    async fn manifest(&self) -> Result<String>;

    /// Fetch and decode one segment into clock-ready audio
    async fn segment(&self, url: &str) -> Result<SegmentAudio>;
}

/// HTTP-backed segment source
pub struct HttpSegmentSource {
    pipeline: AudioFetchPipeline,
    manifest_url: String,
}

impl HttpSegmentSource {
    /// Source polling `manifest_url` and decoding through `pipeline`
    pub fn new(pipeline: AudioFetchPipeline, manifest_url: String) -> Self {
        Self {
            pipeline,
            manifest_url,
        }
    }
}

#[async_trait]
impl SegmentSource for HttpSegmentSource {
    async fn manifest(&self) -> Result<String> {
        self.pipeline
            .fetcher()
            .fetch_text(&self.manifest_url)
            .await
            .map_err(|e| Error::ManifestFetch(e.to_string()))
    }

    async fn segment(&self, url: &str) -> Result<SegmentAudio> {
        self.pipeline.fetch_audio(url).await
    }
}

/// Cursor and per-session scheduling state
struct SchedulerState {
    /// Next segment start time on the clock (seconds); non-decreasing
    next_start_time: f64,

    /// URLs already processed this session; append-only
    processed: HashSet<String>,

    /// Whether the first successful poll has been observed
    bootstrapped: bool,

    /// Last topic id derived from metadata
    current_topic_id: Option<String>,
}

/// The crossfade scheduler.
///
/// State is guarded by an async mutex whose `try_lock` doubles as the
/// single-flight guard: a tick arriving while a previous tick is still
/// suspended in fetch/decode is dropped rather than interleaved.
pub struct CrossfadeScheduler {
    source: Arc<dyn SegmentSource>,
    sink: Arc<dyn ScheduleSink>,
    base_url: Url,
    config: SchedulerConfig,
    events: EventBus,
    state: Mutex<SchedulerState>,
}

impl CrossfadeScheduler {
    /// Create a scheduler for one live session.
    pub fn new(
        source: Arc<dyn SegmentSource>,
        sink: Arc<dyn ScheduleSink>,
        base_url: Url,
        config: SchedulerConfig,
        events: EventBus,
    ) -> Self {
        Self {
            source,
            sink,
            base_url,
            config,
            events,
            state: Mutex::new(SchedulerState {
                next_start_time: 0.0,
                processed: HashSet::new(),
                bootstrapped: false,
                current_topic_id: None,
            }),
        }
    }

    /// Run one poll tick: fetch the manifest, process new segments.
    ///
    /// All per-tick failures are isolated: a failed manifest fetch is
    /// retried on the next tick, a failed segment decode skips only that
    /// segment. An overlapping tick is dropped by the single-flight
    /// guard.
    pub async fn tick(&self) {
        let mut state = match self.state.try_lock() {
            Ok(state) => state,
            Err(_) => {
                debug!("Previous poll tick still in flight; dropping this tick");
                return;
            }
        };

        let text = match self.source.manifest().await {
            Ok(text) => text,
            Err(e) => {
                // Tolerated: feed may not have started yet
                warn!("Manifest fetch failed, retrying next tick: {}", e);
                return;
            }
        };

        let segments = parse_manifest(&text, &self.base_url);

        if !state.bootstrapped {
            state.bootstrapped = true;
            self.bootstrap(&mut state, segments).await;
        } else {
            self.steady(&mut state, segments).await;
        }
    }

    /// First manifest observation: jump to the live edge.
    async fn bootstrap(&self, state: &mut SchedulerState, segments: Vec<Segment>) {
        // Everything currently listed is history; mark processed unplayed
        for segment in &segments {
            state.processed.insert(segment.url.clone());
        }

        let Some(last) = segments.last() else {
            debug!("Bootstrap with empty manifest");
            return;
        };

        info!("Bootstrapping at live edge: {}", last.url);
        self.observe_topic(state, &last.metadata_raw);

        let audio = match self.source.segment(&last.url).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Skipping segment {}: {}", last.url, e);
                return;
            }
        };

        // Immediate start for minimal time-to-first-audio
        let start = self.sink.clock_seconds();
        state.next_start_time = self.schedule(&last.url, audio, start);
    }

    /// Steady-state observation: process new segments in manifest order.
    async fn steady(&self, state: &mut SchedulerState, segments: Vec<Segment>) {
        for segment in segments {
            if state.processed.contains(&segment.url) {
                continue;
            }
            state.processed.insert(segment.url.clone());

            self.observe_topic(state, &segment.metadata_raw);

            let audio = match self.source.segment(&segment.url).await {
                Ok(audio) => audio,
                Err(e) => {
                    // Skip without advancing the cursor
                    warn!("Skipping segment {}: {}", segment.url, e);
                    continue;
                }
            };

            // Back-to-back on the cursor, but never earlier than the
            // pre-buffer floor from "now"
            let floor = self.sink.clock_seconds() + self.config.pre_buffer_seconds;
            let start = floor.max(state.next_start_time);
            state.next_start_time = self.schedule(&segment.url, audio, start);
        }
    }

    /// Schedule one decoded segment and return the advanced cursor.
    ///
    /// The next segment starts one crossfade window before this one ends,
    /// so fade-out and fade-in overlap exactly.
    fn schedule(&self, url: &str, audio: SegmentAudio, start: f64) -> f64 {
        let duration = audio.duration_seconds();
        // A window longer than half the segment would overlap both ends
        let fade = self.config.crossfade_seconds.min(duration / 2.0);

        self.sink.schedule(url, audio, start, fade);
        self.events.emit(BriefcastEvent::SegmentScheduled {
            url: url.to_string(),
            start_time: start,
            duration,
            timestamp: chrono::Utc::now(),
        });

        start + duration - fade
    }

    /// Fire a topic-change event when metadata names a different topic.
    fn observe_topic(&self, state: &mut SchedulerState, metadata: &str) {
        if let Some(topic_id) = extract_topic_id(metadata) {
            if state.current_topic_id.as_deref() != Some(topic_id.as_str()) {
                info!("Topic changed: {}", topic_id);
                state.current_topic_id = Some(topic_id.clone());
                self.events.emit(BriefcastEvent::topic_changed_by_id(topic_id));
            }
        }
    }

    /// Reset session state (manifest source change).
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.next_start_time = 0.0;
        state.processed.clear();
        state.bootstrapped = false;
        state.current_topic_id = None;
    }

    /// Number of URLs processed so far this session
    pub async fn processed_count(&self) -> usize {
        self.state.lock().await.processed.len()
    }
}
