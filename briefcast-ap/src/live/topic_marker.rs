//! Topic identifier extraction from segment metadata
//!
//! Segment metadata may embed the owning topic as a case-insensitive
//! `ID:` marker followed by a UUID-like hex token. Extraction is a pure
//! function with no failure mode beyond "not found".

const MARKER: &str = "id:";

/// Extract a topic identifier from a metadata string.
///
/// Returns the hex/dash token following the first `ID:` marker
/// (case-insensitive), or None when no marker with a non-empty token is
/// present.
pub fn extract_topic_id(metadata: &str) -> Option<String> {
    let bytes = metadata.as_bytes();
    let marker = MARKER.as_bytes();

    let mut i = 0;
    while i + marker.len() <= bytes.len() {
        if bytes[i..i + marker.len()].eq_ignore_ascii_case(marker) {
            let token_start = i + marker.len();
            let token_end = bytes[token_start..]
                .iter()
                .position(|b| !b.is_ascii_hexdigit() && *b != b'-')
                .map(|p| token_start + p)
                .unwrap_or(bytes.len());

            if token_end > token_start {
                return Some(metadata[token_start..token_end].to_string());
            }
        }
        i += 1;
    }

    None
}
