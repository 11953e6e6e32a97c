//! Audio decoder using symphonia
//!
//! Decodes fetched segment payloads (MP3, AAC/M4A, FLAC, Vorbis, WAV) to
//! PCM samples. Segments arrive as in-memory byte buffers, so decoding
//! reads from a cursor rather than a file handle.

use crate::error::{Error, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Decoded PCM prior to stereo conversion and resampling
#[derive(Debug)]
pub struct DecodedAudio {
    /// Interleaved samples in the source channel layout
    pub samples: Vec<f32>,

    /// Source sample rate
    pub sample_rate: u32,

    /// Source channel count
    pub channels: u16,
}

/// Segment decoder backed by symphonia's probe and default codec registry.
pub struct SegmentDecoder;

impl SegmentDecoder {
    /// Decode an entire in-memory payload to PCM samples.
    ///
    /// # Arguments
    /// - `bytes`: Raw container bytes as fetched
    /// - `extension_hint`: File extension from the URL, when available,
    ///   to help format probing
    ///
    /// # Errors
    /// `Error::SegmentDecode` when the payload is not a supported
    /// container/codec or contains no decodable audio track. Callers treat
    /// this as non-fatal and skip the segment.
    pub fn decode_bytes(bytes: Vec<u8>, extension_hint: Option<&str>) -> Result<DecodedAudio> {
        let byte_len = bytes.len();
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension_hint {
            hint.with_extension(ext);
        }

        let format_opts = FormatOptions::default();
        let metadata_opts = MetadataOptions::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &format_opts, &metadata_opts)
            .map_err(|e| Error::SegmentDecode(format!("Failed to probe format: {}", e)))?;

        let mut format = probed.format;

        // Default audio track
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::SegmentDecode("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| Error::SegmentDecode("Sample rate not found".to_string()))?;

        let channels = codec_params
            .channels
            .map(|c| c.count() as u16)
            .ok_or_else(|| Error::SegmentDecode("Channel count not found".to_string()))?;

        debug!(
            "Decoding {} byte payload: sample_rate={}, channels={}",
            byte_len, sample_rate, channels
        );

        let decoder_opts = DecoderOptions::default();
        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &decoder_opts)
            .map_err(|e| Error::SegmentDecode(format!("Failed to create decoder: {}", e)))?;

        let mut samples: Vec<f32> = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    // End of stream
                    break;
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let needed = decoded.capacity() as u64;
                    let min_capacity = needed as usize * spec.channels.count();
                    // Reallocate when a packet is larger than any before it
                    if sample_buf
                        .as_ref()
                        .map_or(true, |b| b.capacity() < min_capacity)
                    {
                        sample_buf = Some(SampleBuffer::<f32>::new(needed, spec));
                    }
                    if let Some(buf) = sample_buf.as_mut() {
                        buf.copy_interleaved_ref(decoded);
                        samples.extend_from_slice(buf.samples());
                    }
                }
                Err(e) => {
                    // Per-packet decode errors are recoverable; continue
                    warn!("Decode error: {}", e);
                    continue;
                }
            }
        }

        if samples.is_empty() {
            return Err(Error::SegmentDecode(
                "Payload yielded no audio samples".to_string(),
            ));
        }

        debug!(
            "Decoded {} samples ({} frames)",
            samples.len(),
            samples.len() / channels as usize
        );

        Ok(DecodedAudio {
            samples,
            sample_rate,
            channels,
        })
    }
}

/// Extract a lowercase file extension from a URL path, for probe hints.
pub fn extension_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 5 {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
