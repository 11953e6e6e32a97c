//! Schedule-at-time audio mixer
//!
//! The mixer is the shared audio clock. Clock time is derived from frames
//! rendered, not wall time: while suspended the clock is frozen and the
//! mixer emits silence. Two front-ends drive it, one per session mode:
//!
//! - Live path: `schedule()` places decoded segments at absolute clock
//!   times with fade-in/fade-out envelopes; overlapping segments are
//!   summed, which is what produces the gapless crossfade.
//! - On-demand path: `load_track()` installs a single track with
//!   play/pause/seek semantics and natural-completion detection.
//!
//! The master gain multiplier (mute/volume) applies to the final mix and
//! is independent of scheduling state.

use crate::audio::types::{AudioFrame, SegmentAudio};
use crate::error::{Error, Result};
use briefcast_common::FadeCurve;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

/// Notifications surfaced from the render loop.
///
/// The render thread collects these per render call; the session glue
/// forwards them to the queue manager.
#[derive(Debug, Clone, PartialEq)]
pub enum MixerNotice {
    /// The loaded track reached natural completion (position reached a
    /// real duration > 0). Emitted exactly once per loaded track until a
    /// resource switch or a seek away from the end re-arms it.
    TrackCompleted {
        /// Topic whose track completed
        topic_id: String,
        /// Track duration in seconds
        duration_seconds: f64,
    },
}

/// One segment placed on the clock timeline
struct ScheduledSegment {
    /// Segment URL, for logging only
    url: String,

    /// Absolute clock frame the segment starts at
    start_frame: u64,

    /// Stereo interleaved samples at the working rate
    samples: Vec<f32>,

    /// Number of stereo frames
    frame_count: u64,

    /// Envelope length in frames (fade-in at head, fade-out at tail)
    fade_frames: u64,
}

impl ScheduledSegment {
    /// Envelope gain at a frame offset into the segment
    fn envelope(&self, offset: u64, curve: FadeCurve) -> f32 {
        let mut gain = 1.0f32;
        if self.fade_frames > 0 {
            if offset < self.fade_frames {
                gain *= curve.fade_in(offset as f32 / self.fade_frames as f32);
            }
            let tail_start = self.frame_count.saturating_sub(self.fade_frames);
            if offset >= tail_start {
                gain *= curve.fade_out((offset - tail_start) as f32 / self.fade_frames as f32);
            }
        }
        gain
    }

    /// Frame at an offset, with the envelope applied
    fn frame_at(&self, offset: u64, curve: FadeCurve) -> AudioFrame {
        let idx = (offset * 2) as usize;
        let mut frame = AudioFrame {
            left: self.samples[idx],
            right: self.samples[idx + 1],
        };
        frame.apply_gain(self.envelope(offset, curve));
        frame
    }
}

/// Single track loaded for on-demand playback
struct LoadedTrack {
    /// Owning topic id
    topic_id: String,

    /// Stereo interleaved samples at the working rate
    samples: Vec<f32>,

    /// Number of stereo frames
    frame_count: u64,

    /// Current playback position in frames
    position: u64,

    /// Completion latch: set once the completion notice has fired
    completed: bool,
}

/// Audio mixer and clock source
pub struct Mixer {
    /// Working sample rate (matches the output device)
    sample_rate: u32,

    /// Frames rendered while running; the clock
    clock_frames: u64,

    /// Suspended: clock frozen, silence emitted
    suspended: bool,

    /// Master gain multiplier (mute/volume), applied at the final mix
    master_gain: f32,

    /// Envelope curve for scheduled segments
    fade_curve: FadeCurve,

    /// Segments placed on the timeline (live path)
    scheduled: Vec<ScheduledSegment>,

    /// Loaded track (on-demand path)
    track: Option<LoadedTrack>,
}

impl Mixer {
    /// Create a mixer at the given working sample rate, starting suspended.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            clock_frames: 0,
            suspended: true,
            master_gain: 1.0,
            fade_curve: FadeCurve::default(),
            scheduled: Vec::new(),
            track: None,
        }
    }

    /// Working sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current clock time in seconds
    pub fn clock_seconds(&self) -> f64 {
        self.clock_frames as f64 / self.sample_rate as f64
    }

    /// Suspend the clock (silence, frozen time)
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Resume the clock
    pub fn resume(&mut self) {
        self.suspended = false;
    }

    /// Whether the clock is suspended
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Set the master gain multiplier (0.0 = mute)
    pub fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain.clamp(0.0, 1.0);
    }

    /// Current master gain
    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Place a segment on the timeline with fade envelopes.
    ///
    /// A segment scheduled behind the clock plays only its remaining
    /// portion (or nothing at all); in-flight scheduling completing after
    /// a pause is therefore harmless.
    pub fn schedule(&mut self, url: &str, audio: SegmentAudio, start_seconds: f64, fade_seconds: f64) {
        let frame_count = audio.frame_count() as u64;
        if frame_count == 0 {
            return;
        }

        let start_frame = (start_seconds.max(0.0) * self.sample_rate as f64).round() as u64;
        let fade_frames =
            ((fade_seconds.max(0.0) * self.sample_rate as f64).round() as u64).min(frame_count);

        debug!(
            "Scheduling {} at frame {} ({} frames, fade {})",
            url, start_frame, frame_count, fade_frames
        );

        self.scheduled.push(ScheduledSegment {
            url: url.to_string(),
            start_frame,
            samples: audio.samples,
            frame_count,
            fade_frames,
        });
    }

    /// Number of segments currently on the timeline (not yet retired)
    pub fn scheduled_count(&self) -> usize {
        self.scheduled.len()
    }

    /// Drop all scheduled segments (live session restart)
    pub fn clear_scheduled(&mut self) {
        self.scheduled.clear();
    }

    /// Install a track for on-demand playback, replacing any previous one.
    ///
    /// The position resets to zero and the completion latch re-arms. This
    /// is the resource-switch point: the swap is a single state update
    /// under the mixer lock, so no render observes a half-switched track.
    pub fn load_track(&mut self, topic_id: &str, audio: SegmentAudio) -> Result<()> {
        let frame_count = audio.frame_count() as u64;
        if frame_count == 0 {
            return Err(Error::ResourceSwitch(format!(
                "Track for topic {} decoded to zero frames",
                topic_id
            )));
        }
        self.track = Some(LoadedTrack {
            topic_id: topic_id.to_string(),
            samples: audio.samples,
            frame_count,
            position: 0,
            completed: false,
        });
        Ok(())
    }

    /// Remove the loaded track
    pub fn unload_track(&mut self) {
        self.track = None;
    }

    /// Topic id of the loaded track
    pub fn loaded_topic_id(&self) -> Option<String> {
        self.track.as_ref().map(|t| t.topic_id.clone())
    }

    /// Seek the loaded track by a signed delta in seconds, clamped to the
    /// track bounds. Seeking away from the end re-arms the completion
    /// latch.
    pub fn seek_by(&mut self, delta_seconds: f64) {
        let sample_rate = self.sample_rate as f64;
        if let Some(track) = self.track.as_mut() {
            let delta_frames = (delta_seconds * sample_rate).round() as i64;
            let new_position = (track.position as i64 + delta_frames)
                .clamp(0, track.frame_count as i64) as u64;
            track.position = new_position;
            if new_position < track.frame_count {
                track.completed = false;
            }
        }
    }

    /// Position in seconds: track position when a track is loaded,
    /// otherwise the live clock.
    pub fn position_seconds(&self) -> f64 {
        match &self.track {
            Some(track) => track.position as f64 / self.sample_rate as f64,
            None => self.clock_seconds(),
        }
    }

    /// Duration in seconds of the loaded track (0.0 for the live path)
    pub fn duration_seconds(&self) -> f64 {
        match &self.track {
            Some(track) => track.frame_count as f64 / self.sample_rate as f64,
            None => 0.0,
        }
    }

    /// Render the next block of frames, advancing the clock.
    ///
    /// While suspended, emits silence without advancing the clock or the
    /// track position. Returns notices collected during this block.
    pub fn render(&mut self, out: &mut [AudioFrame]) -> Vec<MixerNotice> {
        if self.suspended {
            out.fill(AudioFrame::zero());
            return Vec::new();
        }

        let mut notices = Vec::new();

        for slot in out.iter_mut() {
            let mut mixed = AudioFrame::zero();

            // Live path: sum every segment overlapping this clock frame
            for segment in &self.scheduled {
                if self.clock_frames >= segment.start_frame {
                    let offset = self.clock_frames - segment.start_frame;
                    if offset < segment.frame_count {
                        mixed.add(&segment.frame_at(offset, self.fade_curve));
                    }
                }
            }

            // On-demand path: advance the loaded track
            if let Some(track) = self.track.as_mut() {
                if track.position < track.frame_count {
                    let idx = (track.position * 2) as usize;
                    mixed.add(&AudioFrame {
                        left: track.samples[idx],
                        right: track.samples[idx + 1],
                    });
                    track.position += 1;

                    if track.position >= track.frame_count && !track.completed {
                        track.completed = true;
                        notices.push(MixerNotice::TrackCompleted {
                            topic_id: track.topic_id.clone(),
                            duration_seconds: track.frame_count as f64
                                / self.sample_rate as f64,
                        });
                    }
                }
            }

            mixed.apply_gain(self.master_gain);
            mixed.clamp();
            *slot = mixed;

            self.clock_frames += 1;
        }

        // Retire segments fully behind the clock
        let clock = self.clock_frames;
        let before = self.scheduled.len();
        self.scheduled
            .retain(|s| s.start_frame + s.frame_count > clock);
        if self.scheduled.len() != before {
            trace!("Retired {} finished segments", before - self.scheduled.len());
        }

        notices
    }
}

/// Clock and scheduling interface used by the crossfade scheduler.
///
/// The production implementation is [`MixerHandle`]; tests substitute a
/// recording sink with a manual clock.
pub trait ScheduleSink: Send + Sync {
    /// Current clock time in seconds
    fn clock_seconds(&self) -> f64;

    /// Place decoded audio at an absolute clock time with the given fade
    /// window at head and tail
    fn schedule(&self, url: &str, audio: SegmentAudio, start_seconds: f64, fade_seconds: f64);
}

/// Cloneable, lockable handle to the shared mixer.
#[derive(Clone)]
pub struct MixerHandle {
    inner: Arc<Mutex<Mixer>>,
}

impl MixerHandle {
    /// Wrap a mixer for sharing between the render thread and command
    /// paths.
    pub fn new(mixer: Mixer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(mixer)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Mixer> {
        // A poisoned mixer lock means the render thread panicked; the
        // mixer state itself is still structurally valid.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Working sample rate
    pub fn sample_rate(&self) -> u32 {
        self.lock().sample_rate()
    }

    /// Suspend the clock
    pub fn suspend(&self) {
        self.lock().suspend();
    }

    /// Resume the clock
    pub fn resume(&self) {
        self.lock().resume();
    }

    /// Whether the clock is suspended
    pub fn is_suspended(&self) -> bool {
        self.lock().is_suspended()
    }

    /// Set master gain (0.0 = mute, 1.0 = unity)
    pub fn set_master_gain(&self, gain: f32) {
        self.lock().set_master_gain(gain);
    }

    /// Install a track for on-demand playback
    pub fn load_track(&self, topic_id: &str, audio: SegmentAudio) -> Result<()> {
        self.lock().load_track(topic_id, audio)
    }

    /// Remove the loaded track
    pub fn unload_track(&self) {
        self.lock().unload_track();
    }

    /// Topic id of the loaded track
    pub fn loaded_topic_id(&self) -> Option<String> {
        self.lock().loaded_topic_id()
    }

    /// Seek the loaded track by a signed delta in seconds
    pub fn seek_by(&self, delta_seconds: f64) {
        self.lock().seek_by(delta_seconds);
    }

    /// Position in seconds (track position, or live clock)
    pub fn position_seconds(&self) -> f64 {
        self.lock().position_seconds()
    }

    /// Duration of the loaded track in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.lock().duration_seconds()
    }

    /// Drop all scheduled segments
    pub fn clear_scheduled(&self) {
        self.lock().clear_scheduled();
    }

    /// Render a block of frames (called from the feeder thread)
    pub fn render(&self, out: &mut [AudioFrame]) -> Vec<MixerNotice> {
        self.lock().render(out)
    }
}

impl ScheduleSink for MixerHandle {
    fn clock_seconds(&self) -> f64 {
        self.lock().clock_seconds()
    }

    fn schedule(&self, url: &str, audio: SegmentAudio, start_seconds: f64, fade_seconds: f64) {
        self.lock().schedule(url, audio, start_seconds, fade_seconds);
    }
}
