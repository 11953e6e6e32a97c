//! Error types for briefcast-ap
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Per-tick and per-segment errors are isolated by the
//! scheduling loops; only audio output initialization failure is fatal.

use thiserror::Error;

/// Main error type for the briefcast-ap module
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or HTTP failure fetching the segment manifest.
    /// Non-fatal: logged and retried on the next poll tick.
    #[error("Manifest fetch error: {0}")]
    ManifestFetch(String),

    /// Unsupported, corrupt, or unfetchable segment payload.
    /// Non-fatal: the segment is skipped and the scheduling cursor is
    /// not advanced.
    #[error("Segment decode error: {0}")]
    SegmentDecode(String),

    /// On-demand audio resource failed to load during a topic switch.
    /// The queue position still advances; playback state reports the
    /// failure.
    #[error("Resource switch error: {0}")]
    ResourceSwitch(String),

    /// Attempt to play a topic whose audio resource is not yet ready
    #[error("Topic not ready: {0}")]
    NotReady(String),

    /// Audio output device errors (fatal at initialization)
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Topic feed fetch or parse errors
    #[error("Topic feed error: {0}")]
    TopicFeed(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the briefcast-ap Error
pub type Result<T> = std::result::Result<T, Error>;
