//! HTTP fetching and the fetch-decode pipeline
//!
//! All network access goes through [`RemoteFetcher`] so the polling and
//! scheduling loops are testable without a network. Every request is
//! bounded by the configured timeout; a timeout is a skippable
//! per-request failure, never a loop-stopper.

use crate::audio::decoder::{extension_from_url, SegmentDecoder};
use crate::audio::resampler::Resampler;
use crate::audio::types::{to_stereo, SegmentAudio};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Narrow fetch interface over HTTP
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetch a resource as text (manifest, topic feed)
    async fn fetch_text(&self, url: &str) -> Result<String>;

    /// Fetch a resource as raw bytes (segment or track payload)
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// reqwest-backed fetcher with a per-request timeout
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Http(format!("GET {} failed: {}", url, e)))?
            .error_for_status()
            .map_err(|e| Error::Http(format!("GET {} failed: {}", url, e)))?;

        response
            .text()
            .await
            .map_err(|e| Error::Http(format!("Reading body of {} failed: {}", url, e)))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Http(format!("GET {} failed: {}", url, e)))?
            .error_for_status()
            .map_err(|e| Error::Http(format!("GET {} failed: {}", url, e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Http(format!("Reading body of {} failed: {}", url, e)))?;

        Ok(bytes.to_vec())
    }
}

/// Fetch-decode pipeline producing clock-ready audio.
///
/// Fetches a payload, decodes it on a blocking worker, converts to
/// stereo, and resamples to the working rate. Any failure along the way
/// maps to `Error::SegmentDecode` so callers apply the single skip
/// policy.
pub struct AudioFetchPipeline {
    fetcher: Arc<dyn RemoteFetcher>,
    target_rate: u32,
}

impl AudioFetchPipeline {
    /// Pipeline resampling everything to `target_rate`
    pub fn new(fetcher: Arc<dyn RemoteFetcher>, target_rate: u32) -> Self {
        Self {
            fetcher,
            target_rate,
        }
    }

    /// Fetcher shared with other pollers
    pub fn fetcher(&self) -> Arc<dyn RemoteFetcher> {
        Arc::clone(&self.fetcher)
    }

    /// Fetch and decode one audio resource.
    pub async fn fetch_audio(&self, url: &str) -> Result<SegmentAudio> {
        let bytes = self
            .fetcher
            .fetch_bytes(url)
            .await
            .map_err(|e| Error::SegmentDecode(format!("Fetch of {} failed: {}", url, e)))?;

        let hint = extension_from_url(url);
        let target_rate = self.target_rate;
        let url_owned = url.to_string();

        // symphonia + rubato are CPU-bound; keep them off the runtime
        let audio = tokio::task::spawn_blocking(move || -> Result<SegmentAudio> {
            let decoded = SegmentDecoder::decode_bytes(bytes, hint.as_deref())?;
            let stereo = to_stereo(&decoded.samples, decoded.channels);
            let resampled =
                Resampler::resample(&stereo, decoded.sample_rate, target_rate, 2)?;
            debug!(
                "Decoded {}: {:.2}s at {} Hz",
                url_owned,
                resampled.len() as f64 / 2.0 / target_rate as f64,
                target_rate
            );
            Ok(SegmentAudio::new(resampled, target_rate))
        })
        .await
        .map_err(|e| Error::Internal(format!("Decode task panicked: {}", e)))??;

        Ok(audio)
    }
}
