//! Audio pipeline: decode, resample, mix, output
//!
//! Decoded audio is normalized to f32 interleaved stereo at the output
//! device's working sample rate before it reaches the mixer.

pub mod decoder;
pub mod mixer;
pub mod output;
pub mod resampler;
pub mod types;

pub use mixer::{Mixer, MixerHandle, MixerNotice, ScheduleSink};
pub use output::AudioOutput;
pub use types::{AudioFrame, SegmentAudio};
