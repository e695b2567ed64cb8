//! Batch request building and paging

use log::debug;

use super::client::{BatchTransport, RawBatchResponse};
use crate::config::BatchConfig;
use crate::error::PipelineError;
use crate::models::MessageQuery;
use crate::sync::CancelFlag;

/// Build a `multipart/mixed` body with one embedded GET per query
///
/// Sections appear in the same order as `queries`. URIs are not validated.
pub fn build_batch_body(queries: &[MessageQuery], boundary: &str) -> String {
    let mut body = String::new();

    for query in queries {
        body.push_str("--");
        body.push_str(boundary);
        body.push_str("\r\n");
        body.push_str("Content-Type: application/http");
        body.push_str("\r\n\r\n");
        body.push_str("GET ");
        body.push_str(&query.uri);
        body.push_str("\r\n\r\n");
    }

    body.push_str("--");
    body.push_str(boundary);
    body.push_str("--");
    body
}

/// Fetch all queries, `config.batch_limit` at a time
///
/// Pages are sent sequentially and responses are returned in page order.
/// An empty query list sends nothing. Stops early (without error) once
/// `cancel` is raised, returning the pages fetched so far.
///
/// # Errors
/// Returns [`PipelineError::Transport`] for the first page that fails.
pub fn fetch_all_by_batches(
    transport: &dyn BatchTransport,
    queries: &[MessageQuery],
    access_token: &str,
    config: &BatchConfig,
    cancel: &CancelFlag,
) -> Result<Vec<RawBatchResponse>, PipelineError> {
    let batch_limit = config.batch_limit.max(1);
    let mut responses = Vec::with_capacity(queries.len().div_ceil(batch_limit));

    for (page, page_queries) in queries.chunks(batch_limit).enumerate() {
        if cancel.is_cancelled() {
            debug!("Batch fetch cancelled before page {}", page);
            break;
        }

        let body = build_batch_body(page_queries, &config.boundary);
        debug!(
            "Sending batch page {} with {} queries",
            page,
            page_queries.len()
        );

        let response = transport
            .send(&body, &config.boundary, access_token)
            .map_err(|source| PipelineError::Transport { page, source })?;

        debug!(
            "Batch page {} returned HTTP {} with {} bytes",
            page,
            response.status,
            response.body.len()
        );
        responses.push(response);
    }

    Ok(responses)
}
