//! Multipart batch response splitting
//!
//! Gmail answers a batch with a `multipart/mixed` body where each part wraps
//! an HTTP response whose payload is a single JSON object. Parts are located
//! by splitting on the boundary and taking the span from the first `{` to
//! the last `}` of each chunk.

use log::debug;

use super::api::ParsedItem;
use super::client::RawBatchResponse;
use crate::error::ItemError;

/// Extract the boundary token from a `content-type` header value
///
/// Returns an empty string when the header or its `boundary=` parameter is
/// missing.
pub fn batch_boundary(content_type: Option<&str>) -> String {
    let Some(content_type) = content_type else {
        return String::new();
    };

    content_type
        .split("; ")
        .map(str::trim)
        .find_map(|segment| segment.strip_prefix("boundary="))
        .map(|boundary| boundary.trim().trim_matches('"').to_string())
        .unwrap_or_default()
}

/// Split a batch body into its JSON fragments, in order of appearance
///
/// Chunks without both a `{` and a `}` are boundary or header noise and are
/// skipped. An empty boundary finds nothing.
pub fn split_fragments<'a>(body: &'a str, boundary: &str) -> Vec<&'a str> {
    if boundary.is_empty() {
        return Vec::new();
    }

    let delimiter = format!("--{}", boundary);

    body.split(delimiter.as_str())
        .filter_map(|chunk| {
            let start = chunk.find('{')?;
            let end = chunk.rfind('}')?;
            (start <= end).then(|| &chunk[start..=end])
        })
        .collect()
}

/// Parse every fragment of one batch response
///
/// A fragment that is not valid JSON becomes an
/// [`ItemError::MalformedFragment`] in its position; the other fragments
/// are unaffected.
pub fn parse_batch(response: &RawBatchResponse) -> Vec<Result<ParsedItem, ItemError>> {
    let boundary = batch_boundary(response.content_type.as_deref());
    let fragments = split_fragments(&response.body, &boundary);

    debug!(
        "Found {} fragments in batch response (boundary {:?})",
        fragments.len(),
        boundary
    );

    fragments
        .into_iter()
        .map(|fragment| {
            serde_json::from_str::<ParsedItem>(fragment).map_err(|e| {
                ItemError::MalformedFragment {
                    reason: e.to_string(),
                }
            })
        })
        .collect()
}
