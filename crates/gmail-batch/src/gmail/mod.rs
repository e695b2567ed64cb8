//! Gmail batch API integration
//!
//! This module provides:
//! - Batch request building and paging
//! - The HTTP transport seam
//! - Multipart response splitting
//! - Raw message decoding to domain models

pub mod batch;
mod client;
pub mod multipart;
mod normalize;
pub mod quotes;

pub use batch::{build_batch_body, fetch_all_by_batches};
pub use client::{BatchTransport, RawBatchResponse, TransportError, UreqTransport};
pub use multipart::{batch_boundary, parse_batch, split_fragments};
pub use normalize::{decode_item, decode_raw_body};
pub use quotes::{QuoteStripError, QuoteStripper, ReplyQuoteStripper};

/// Gmail API response types
pub mod api {
    use serde::{Deserialize, Serialize};
    use std::fmt;

    /// Error object Gmail returns in place of a resource
    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    pub struct ApiError {
        pub code: Option<i64>,
        pub message: Option<String>,
        pub status: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub errors: Vec<serde_json::Value>,
    }

    impl fmt::Display for ApiError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let mut prefix = Vec::new();
            if let Some(code) = self.code {
                prefix.push(code.to_string());
            }
            if let Some(status) = &self.status {
                prefix.push(status.clone());
            }

            match (prefix.is_empty(), &self.message) {
                (true, Some(message)) => write!(f, "{}", message),
                (true, None) => write!(f, "unknown error"),
                (false, Some(message)) => write!(f, "{}: {}", prefix.join(" "), message),
                (false, None) => write!(f, "{}", prefix.join(" ")),
            }
        }
    }

    /// Message fetched with `format=raw`
    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RawMessagePayload {
        pub history_id: String,
        pub id: String,
        pub thread_id: String,
        pub internal_date: String,
        /// URL-safe base64 of the full RFC 5322 message
        pub raw: Option<String>,
    }

    /// One JSON fragment of a batch response
    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(from = "BatchItemWire")]
    pub enum ParsedItem {
        Error(ApiError),
        Message(RawMessagePayload),
    }

    /// Wire shape of a fragment before it is classified
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct BatchItemWire {
        error: Option<ApiError>,
        #[serde(default)]
        history_id: String,
        #[serde(default)]
        id: String,
        #[serde(default)]
        thread_id: String,
        #[serde(default)]
        internal_date: String,
        raw: Option<String>,
    }

    impl From<BatchItemWire> for ParsedItem {
        fn from(wire: BatchItemWire) -> Self {
            match wire.error {
                Some(error) => ParsedItem::Error(error),
                None => ParsedItem::Message(RawMessagePayload {
                    history_id: wire.history_id,
                    id: wire.id,
                    thread_id: wire.thread_id,
                    internal_date: wire.internal_date,
                    raw: wire.raw,
                }),
            }
        }
    }

}
