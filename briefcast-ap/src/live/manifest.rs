//! Manifest parsing
//!
//! The manifest is a line-oriented playlist. Non-empty lines that do not
//! start with `#` are segment URLs, resolved against the manifest URL.
//! The line immediately preceding a URL line carries that segment's
//! metadata (the first line of the file has none). Order is preserved.

use tracing::warn;
use url::Url;

/// One unit of streamable audio referenced by the manifest.
///
/// Immutable once observed; identity (and deduplication key) is `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Absolute segment URL
    pub url: String,

    /// Raw metadata line preceding the URL line (may be empty)
    pub metadata_raw: String,
}

/// Parse manifest text into segments, in manifest order.
///
/// Lines that fail URL resolution are skipped with a warning; a malformed
/// line never aborts the parse.
pub fn parse_manifest(text: &str, base: &Url) -> Vec<Segment> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut segments = Vec::new();

    for (i, raw_line) in lines.iter().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let url = match base.join(line) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!("Skipping unresolvable manifest line '{}': {}", line, e);
                continue;
            }
        };

        let metadata_raw = if i > 0 { lines[i - 1].to_string() } else { String::new() };
        segments.push(Segment { url, metadata_raw });
    }

    segments
}
