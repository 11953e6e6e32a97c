//! Live streaming path
//!
//! Polls the segment manifest, decodes new segments, and schedules them
//! against the audio clock with crossfades. One poll loop per session;
//! pausing halts polling and suspends the clock, resuming continues from
//! the stored cursor without re-bootstrapping.

pub mod manifest;
pub mod scheduler;
pub mod topic_marker;

pub use manifest::{parse_manifest, Segment};
pub use scheduler::{CrossfadeScheduler, SchedulerConfig, SegmentSource};
pub use topic_marker::extract_topic_id;

use crate::audio::mixer::MixerHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// One live streaming session: the scheduler plus its poll loop.
pub struct LiveSession {
    scheduler: Arc<CrossfadeScheduler>,
    mixer: MixerHandle,
    poll_interval: Duration,
    stop_tx: std::sync::Mutex<Option<watch::Sender<bool>>>,
}

impl LiveSession {
    /// Create a session around a scheduler; polling starts on `resume`.
    pub fn new(
        scheduler: Arc<CrossfadeScheduler>,
        mixer: MixerHandle,
        poll_interval: Duration,
    ) -> Self {
        Self {
            scheduler,
            mixer,
            poll_interval,
            stop_tx: std::sync::Mutex::new(None),
        }
    }

    /// Resume the clock and (re)start the poll loop.
    ///
    /// Continues from the stored processed-set and cursor; only the very
    /// first poll of the session bootstraps.
    pub fn resume(&self) {
        self.mixer.resume();

        let mut guard = self.stop_tx.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_some() {
            return; // already polling
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        *guard = Some(stop_tx);

        let scheduler = Arc::clone(&self.scheduler);
        let interval = self.poll_interval;

        tokio::spawn(async move {
            debug!("Live poll loop started");
            loop {
                // Each tick runs to completion before the timer re-arms,
                // so ticks never interleave.
                scheduler.tick().await;

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = stop_rx.changed() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Live poll loop stopped");
        });
    }

    /// Suspend the clock and cancel the poll re-arm.
    ///
    /// A tick already in flight completes; its segments schedule against
    /// the suspended clock and stay silent until resume.
    pub fn pause(&self) {
        self.mixer.suspend();

        let mut guard = self.stop_tx.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(stop_tx) = guard.take() {
            let _ = stop_tx.send(true);
        }
    }

    /// Reset the session (manifest source change): clears the cursor,
    /// processed-set, and any still-scheduled audio.
    pub async fn reset(&self) {
        self.scheduler.reset().await;
        self.mixer.clear_scheduled();
    }
}
