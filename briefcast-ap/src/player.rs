//! Player facade and lifecycle glue
//!
//! Owns the audio output, the active session (live or on-demand), and the
//! shared state, and exposes the command set consumed by presentation
//! code (HTTP surface, media-session intents). All timer and cursor state
//! lives inside the session objects; nothing is module-global.
//!
//! Exactly one session mode commands the clock source per player
//! instance: the live crossfade scheduler or the on-demand queue manager,
//! never both.

use crate::audio::mixer::{MixerHandle, MixerNotice, ScheduleSink};
use crate::audio::output::AudioOutput;
use crate::config::PlayerConfig;
use crate::error::{Error, Result};
use crate::fetch::{AudioFetchPipeline, HttpFetcher, RemoteFetcher};
use crate::live::scheduler::{HttpSegmentSource, SchedulerConfig};
use crate::live::{CrossfadeScheduler, LiveSession};
use crate::media_session::{MediaIntent, MediaSessionSink};
use crate::queue::QueueSession;
use crate::state::SharedState;
use briefcast_common::events::{BriefcastEvent, PlaybackState};
use briefcast_common::types::Topic;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Which path drives this player instance
#[derive(Debug, Clone)]
pub enum PlayerMode {
    /// Continuous live feed from a segment manifest
    Live {
        /// Manifest URL (also the base for relative segment URLs)
        manifest_url: String,
    },
    /// Discrete on-demand tracks from a topic feed
    OnDemand {
        /// Topic feed URL (JSON list)
        feed_url: String,
    },
}

/// Read-only observables snapshot for the UI layer
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStatus {
    /// Whether the clock is advancing
    pub is_playing: bool,
    /// Master-gain mute state
    pub is_muted: bool,
    /// Current position in seconds (track position, or live clock)
    pub current_time: f64,
    /// Track duration in seconds (0.0 on the live path)
    pub duration: f64,
    /// Currently active topic
    pub current_topic: Option<Topic>,
}

/// The headless player.
///
/// Construct with [`Player::new`]; all methods are safe to call from any
/// task. Dropping the player stops the audio thread.
pub struct Player {
    state: Arc<SharedState>,
    mixer: MixerHandle,
    live: Option<Arc<LiveSession>>,
    queue: Option<Arc<QueueSession>>,
    media: Arc<dyn MediaSessionSink>,
    // Held for its Drop: stops the audio thread with the player
    _output: AudioOutput,
}

impl Player {
    /// Initialize the audio output and the session for the given mode.
    ///
    /// Opening the output device is the only fatal failure; it is
    /// surfaced once, here. The output stream starts immediately with the
    /// clock suspended (silence), so the first `toggle_play` only has to
    /// resume the clock.
    pub fn new(
        mode: PlayerMode,
        config: PlayerConfig,
        media: Arc<dyn MediaSessionSink>,
    ) -> Result<Arc<Self>> {
        let state = Arc::new(SharedState::new(config.event_capacity));

        let (notice_tx, notice_rx) = tokio::sync::mpsc::unbounded_channel();
        let output = AudioOutput::new(
            config.audio_device.clone(),
            config.ring_buffer_frames,
            notice_tx,
        )?;
        let mixer = output.mixer();

        let fetcher: Arc<dyn RemoteFetcher> = Arc::new(HttpFetcher::new(
            Duration::from_secs(config.fetch_timeout_seconds),
        )?);
        let pipeline = AudioFetchPipeline::new(Arc::clone(&fetcher), output.sample_rate());

        let mut live = None;
        let mut queue = None;

        match &mode {
            PlayerMode::Live { manifest_url } => {
                let base_url = Url::parse(manifest_url)
                    .map_err(|e| Error::Config(format!("Invalid manifest URL: {}", e)))?;
                let source = Arc::new(HttpSegmentSource::new(pipeline, manifest_url.clone()));
                let scheduler = Arc::new(CrossfadeScheduler::new(
                    source,
                    Arc::new(mixer.clone()) as Arc<dyn ScheduleSink>,
                    base_url,
                    SchedulerConfig {
                        pre_buffer_seconds: config.pre_buffer_seconds,
                        crossfade_seconds: config.crossfade_window(),
                    },
                    state.events.clone(),
                ));
                live = Some(Arc::new(LiveSession::new(
                    scheduler,
                    mixer.clone(),
                    Duration::from_millis(config.manifest_poll_interval_ms),
                )));
                info!("Player in live mode: {}", manifest_url);
            }
            PlayerMode::OnDemand { feed_url } => {
                let session = Arc::new(QueueSession::new(
                    mixer.clone(),
                    Arc::new(pipeline),
                    Arc::clone(&state),
                ));
                // The topic list polls regardless of play state; only the
                // clock obeys play/pause.
                session.start_feed(
                    Arc::clone(&fetcher),
                    feed_url.clone(),
                    Duration::from_millis(config.feed_poll_interval_ms),
                );
                queue = Some(session);
                info!("Player in on-demand mode: {}", feed_url);
            }
        }

        let player = Arc::new(Self {
            state,
            mixer,
            live,
            queue,
            media,
            _output: output,
        });

        player.spawn_notice_router(notice_rx);
        player.spawn_event_router();
        if player.queue.is_some() {
            player.spawn_progress_reporter(config.progress_interval_ms);
        }

        Ok(player)
    }

    /// Route mixer notices (track completions) to the queue manager.
    fn spawn_notice_router(
        self: &Arc<Self>,
        mut notice_rx: tokio::sync::mpsc::UnboundedReceiver<MixerNotice>,
    ) {
        let player = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(notice) = notice_rx.recv().await {
                match notice {
                    MixerNotice::TrackCompleted {
                        topic_id,
                        duration_seconds,
                    } => {
                        debug!("Track completed: {}", topic_id);
                        if let Some(queue) = &player.queue {
                            queue.on_track_completed(&topic_id, duration_seconds).await;
                        }
                    }
                }
            }
        });
    }

    /// Mirror topic and state changes into the media-session sink.
    fn spawn_event_router(self: &Arc<Self>) {
        let player = Arc::clone(self);
        let mut rx = self.state.subscribe_events();
        tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                match event {
                    BriefcastEvent::TopicChanged { title, sender, .. } => {
                        let title = title.unwrap_or_else(|| "Live Broadcast".to_string());
                        let artist = sender.unwrap_or_else(|| "Briefcast".to_string());
                        player.media.metadata_changed(&title, &artist);
                    }
                    BriefcastEvent::PlaybackStateChanged { new_state, .. } => {
                        player
                            .media
                            .playback_changed(new_state == PlaybackState::Playing);
                    }
                    _ => {}
                }
            }
        });
    }

    /// Emit periodic progress events while an on-demand track plays.
    fn spawn_progress_reporter(self: &Arc<Self>, interval_ms: u64) {
        let player = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(Duration::from_millis(interval_ms.max(100)));
            loop {
                ticker.tick().await;
                if player.state.playback_state().await == PlaybackState::Playing {
                    let duration = player.mixer.duration_seconds();
                    if duration > 0.0 {
                        player.state.emit(BriefcastEvent::PlaybackProgress {
                            position_seconds: player.mixer.position_seconds(),
                            duration_seconds: duration,
                            timestamp: chrono::Utc::now(),
                        });
                    }
                }
            }
        });
    }

    /// Toggle play/pause.
    ///
    /// Live path: pausing suspends the clock and halts polling; resuming
    /// restarts polling from the stored cursor (no re-bootstrap).
    /// On-demand path: resuming with nothing current auto-starts the
    /// first ready topic.
    pub async fn toggle_play(&self) -> Result<()> {
        let playing = self.state.playback_state().await == PlaybackState::Playing;

        if let Some(live) = &self.live {
            if playing {
                live.pause();
                self.state.set_playback_state(PlaybackState::Paused).await;
            } else {
                live.resume();
                self.state.set_playback_state(PlaybackState::Playing).await;
            }
            return Ok(());
        }

        if let Some(queue) = &self.queue {
            return queue.toggle_play().await;
        }

        Err(Error::InvalidState("No session configured".to_string()))
    }

    /// Toggle mute. A pure master-gain multiplier: scheduling and the
    /// play/pause state are unaffected.
    pub async fn toggle_mute(&self) {
        let muted = !self.state.is_muted().await;
        self.mixer.set_master_gain(if muted { 0.0 } else { 1.0 });
        self.state.set_muted(muted).await;
    }

    /// Seek the on-demand track by a signed delta in seconds.
    ///
    /// A no-op on the live path, which has no seekable resource.
    pub async fn seek_by(&self, delta_seconds: f64) {
        if self.queue.is_some() {
            self.mixer.seek_by(delta_seconds);
        } else {
            debug!("seek_by ignored in live mode");
        }
    }

    /// Play a topic (or toggle it when already current). On-demand only.
    pub async fn play_topic(&self, topic: &Topic) -> Result<()> {
        let queue = self.queue.as_ref().ok_or_else(|| {
            Error::InvalidState("play_topic requires on-demand mode".to_string())
        })?;
        queue.play_topic(topic).await
    }

    /// Play a queue member by id. On-demand only.
    pub async fn play_topic_by_id(&self, topic_id: &str) -> Result<()> {
        let queue = self.queue.as_ref().ok_or_else(|| {
            Error::InvalidState("play_topic requires on-demand mode".to_string())
        })?;
        let topic = queue
            .topic_by_id(topic_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("Unknown topic: {}", topic_id)))?;
        queue.play_topic(&topic).await
    }

    /// Advance to the next ready topic; None at the boundary.
    pub async fn play_next_topic(&self) -> Result<Option<Topic>> {
        let queue = self.queue.as_ref().ok_or_else(|| {
            Error::InvalidState("play_next_topic requires on-demand mode".to_string())
        })?;
        queue.play_next_topic().await
    }

    /// Step back to the previous ready topic; None at the boundary.
    pub async fn play_prev_topic(&self) -> Result<Option<Topic>> {
        let queue = self.queue.as_ref().ok_or_else(|| {
            Error::InvalidState("play_prev_topic requires on-demand mode".to_string())
        })?;
        queue.play_prev_topic().await
    }

    /// Whether playback of this topic has started
    pub async fn is_played(&self, topic_id: &str) -> bool {
        match &self.queue {
            Some(queue) => queue.is_played(topic_id).await,
            None => false,
        }
    }

    /// Topic ids after the current position (on-demand)
    pub async fn playback_queue_ids(&self) -> Vec<String> {
        match &self.queue {
            Some(queue) => queue.playback_queue_ids().await,
            None => Vec::new(),
        }
    }

    /// Topic ids before the current position (on-demand)
    pub async fn played_topic_ids(&self) -> Vec<String> {
        match &self.queue {
            Some(queue) => queue.played_topic_ids().await,
            None => Vec::new(),
        }
    }

    /// Observables snapshot
    pub async fn status(&self) -> PlayerStatus {
        PlayerStatus {
            is_playing: self.state.playback_state().await == PlaybackState::Playing,
            is_muted: self.state.is_muted().await,
            current_time: self.mixer.position_seconds(),
            duration: self.mixer.duration_seconds(),
            current_topic: self.state.current_topic().await,
        }
    }

    /// Map an inbound media-session intent onto the command set.
    pub async fn handle_media_intent(&self, intent: MediaIntent) -> Result<()> {
        let playing = self.state.playback_state().await == PlaybackState::Playing;
        match intent {
            MediaIntent::Play if !playing => self.toggle_play().await,
            MediaIntent::Pause if playing => self.toggle_play().await,
            _ => Ok(()),
        }
    }

    /// Shared state handle (for the HTTP surface)
    pub fn state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    /// Restart the live session from scratch (manifest source change).
    pub async fn reset_live(&self) -> Result<()> {
        let live = self.live.as_ref().ok_or_else(|| {
            Error::InvalidState("reset_live requires live mode".to_string())
        })?;
        warn!("Resetting live session");
        live.reset().await;
        Ok(())
    }
}
