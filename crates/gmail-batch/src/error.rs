//! Error types for the batch pipeline
//!
//! Two tiers: [`PipelineError`] aborts a whole fetch, [`ItemError`] is
//! collected per message and never aborts its siblings.

use serde::Serialize;

use crate::gmail::TransportError;
use crate::gmail::api::ApiError;

/// Failure that aborts the whole pipeline invocation
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Batch request for page {page} failed")]
    Transport {
        page: usize,
        #[source]
        source: TransportError,
    },
}

/// Failure scoped to a single item of a batch response
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemError {
    /// Gmail returned an error object instead of the message
    #[error("Gmail API error: {0}")]
    Api(ApiError),

    /// A multipart section did not hold valid JSON
    #[error("Malformed batch fragment: {reason}")]
    MalformedFragment { reason: String },

    /// The `raw` field was missing or not valid base64
    #[error("Invalid raw message encoding: {reason}")]
    InvalidEncoding { reason: String },

    /// The decoded message could not be parsed as RFC 5322
    #[error("Failed to parse message: {reason}")]
    Mime { reason: String },

    /// The message has no usable From address
    #[error("From value is missing")]
    MissingSender,
}
