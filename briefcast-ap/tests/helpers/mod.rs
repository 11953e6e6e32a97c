//! Shared test fixtures: scripted sources, audio builders, topic builders
#![allow(dead_code)]

use async_trait::async_trait;
use briefcast_ap::audio::types::SegmentAudio;
use briefcast_ap::error::{Error, Result};
use briefcast_ap::live::scheduler::SegmentSource;
use briefcast_ap::queue::TrackSource;
use briefcast_common::types::Topic;
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::Mutex;

/// Small working rate keeps frame math readable in assertions
pub const TEST_RATE: u32 = 1000;

/// Constant-valued stereo audio at the test rate
pub fn tone_audio(frames: usize, value: f32) -> SegmentAudio {
    SegmentAudio::new(vec![value; frames * 2], TEST_RATE)
}

/// Topic builder; `ready` controls audio resource presence
pub fn topic(id: &str, minute: u32, ready: bool) -> Topic {
    Topic {
        id: id.to_string(),
        title: format!("Topic {}", id),
        sender: Some("newsdesk".to_string()),
        timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap(),
        audio_url: ready.then(|| format!("https://cdn.example/topics/{}.m4a", id)),
    }
}

/// Synthesize a WAV payload in memory (sine-ish content)
pub fn wav_bytes(frames: usize, sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..frames {
            let sample = (0.25 * (i as f32 * 0.05).sin() * i16::MAX as f32) as i16;
            for _ in 0..channels {
                writer.write_sample(sample).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Scripted manifest + segment source for the live path
pub struct ScriptedSource {
    manifest: Mutex<String>,
    segments: HashMap<String, f64>, // absolute url -> duration seconds
    fail: HashSet<String>,
}

impl ScriptedSource {
    pub fn new(manifest: &str) -> Self {
        Self {
            manifest: Mutex::new(manifest.to_string()),
            segments: HashMap::new(),
            fail: HashSet::new(),
        }
    }

    pub fn with_segment(mut self, name: &str, duration: f64) -> Self {
        self.segments
            .insert(format!("https://cdn.example/live/{}", name), duration);
        self
    }

    pub fn with_failing(mut self, name: &str) -> Self {
        self.fail
            .insert(format!("https://cdn.example/live/{}", name));
        self
    }

    pub fn set_manifest(&self, manifest: &str) {
        *self.manifest.lock().unwrap() = manifest.to_string();
    }
}

#[async_trait]
impl SegmentSource for ScriptedSource {
    async fn manifest(&self) -> Result<String> {
        Ok(self.manifest.lock().unwrap().clone())
    }

    async fn segment(&self, url: &str) -> Result<SegmentAudio> {
        if self.fail.contains(url) {
            return Err(Error::SegmentDecode("scripted failure".into()));
        }
        let duration = self
            .segments
            .get(url)
            .copied()
            .ok_or_else(|| Error::SegmentDecode(format!("unknown url {}", url)))?;
        let frames = (duration * TEST_RATE as f64) as usize;
        Ok(tone_audio(frames, 0.2))
    }
}

/// Scripted per-topic track source for the on-demand path
pub struct ScriptedTracks {
    duration_seconds: f64,
    fail: HashSet<String>,
}

impl ScriptedTracks {
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            duration_seconds,
            fail: HashSet::new(),
        }
    }

    pub fn failing_for(mut self, id: &str) -> Self {
        self.fail
            .insert(format!("https://cdn.example/topics/{}.m4a", id));
        self
    }
}

#[async_trait]
impl TrackSource for ScriptedTracks {
    async fn track(&self, url: &str) -> Result<SegmentAudio> {
        if self.fail.contains(url) {
            return Err(Error::Http("503 service unavailable".into()));
        }
        let frames = (self.duration_seconds * TEST_RATE as f64) as usize;
        Ok(tone_audio(frames, 0.2))
    }
}
