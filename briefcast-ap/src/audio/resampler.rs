//! Audio resampling using rubato
//!
//! Converts decoded audio to the output device's working sample rate so
//! every scheduled buffer shares one clock timebase.

use crate::error::{Error, Result};
use rubato::{FastFixedIn, Resampler as RubatoResampler};
use tracing::debug;

/// Whole-buffer resampler for fully decoded segments.
pub struct Resampler;

impl Resampler {
    /// Resample interleaved audio to the target rate.
    ///
    /// # Arguments
    /// - `input`: Interleaved audio samples
    /// - `input_rate`: Input sample rate
    /// - `output_rate`: Working sample rate of the output device
    /// - `channels`: Number of channels (2 after stereo conversion)
    ///
    /// # Returns
    /// Resampled interleaved audio; a plain copy when rates already match.
    pub fn resample(
        input: &[f32],
        input_rate: u32,
        output_rate: u32,
        channels: u16,
    ) -> Result<Vec<f32>> {
        if input_rate == output_rate {
            return Ok(input.to_vec());
        }

        if input.is_empty() || channels == 0 {
            return Ok(Vec::new());
        }

        debug!(
            "Resampling from {}Hz to {}Hz ({} channels)",
            input_rate, output_rate, channels
        );

        // De-interleave for rubato (planar format)
        let planar_input = Self::deinterleave(input, channels);
        let input_frames = planar_input[0].len();

        // FastFixedIn: good quality/performance tradeoff for speech segments
        let mut resampler = FastFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            1.0, // fixed ratio
            rubato::PolynomialDegree::Septic,
            input_frames,
            channels as usize,
        )
        .map_err(|e| Error::SegmentDecode(format!("Failed to create resampler: {}", e)))?;

        let planar_output = resampler
            .process(&planar_input, None)
            .map_err(|e| Error::SegmentDecode(format!("Resampling failed: {}", e)))?;

        Ok(Self::interleave(planar_output))
    }

    /// Split interleaved samples into per-channel vectors
    fn deinterleave(input: &[f32], channels: u16) -> Vec<Vec<f32>> {
        let channels = channels as usize;
        let frames = input.len() / channels;
        let mut planar = vec![Vec::with_capacity(frames); channels];

        for frame in input.chunks_exact(channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                planar[ch].push(sample);
            }
        }

        planar
    }

    /// Merge per-channel vectors back into interleaved samples
    fn interleave(planar: Vec<Vec<f32>>) -> Vec<f32> {
        let channels = planar.len();
        if channels == 0 {
            return Vec::new();
        }
        let frames = planar[0].len();
        let mut interleaved = Vec::with_capacity(frames * channels);

        for frame_idx in 0..frames {
            for channel in &planar {
                interleaved.push(channel[frame_idx]);
            }
        }

        interleaved
    }
}
