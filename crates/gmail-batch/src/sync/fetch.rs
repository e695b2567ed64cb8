//! Fetch-and-decode orchestration

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use super::cancel::CancelFlag;
use super::timing::{BatchTiming, elapsed_ms};
use crate::config::BatchConfig;
use crate::error::{ItemError, PipelineError};
use crate::gmail::{
    BatchTransport, QuoteStripper, RawBatchResponse, ReplyQuoteStripper, decode_item,
    fetch_all_by_batches, parse_batch,
};
use crate::models::{Message, MessageQuery};

/// Labels attached to timing logs. They do not affect the result.
#[derive(Debug, Default, Clone)]
pub struct JobLabels {
    pub job_name: Option<String>,
    pub workspace_id: Option<String>,
    pub connected_account_id: Option<String>,
}

impl JobLabels {
    pub fn new(
        job_name: impl Into<String>,
        workspace_id: impl Into<String>,
        connected_account_id: impl Into<String>,
    ) -> Self {
        Self {
            job_name: Some(job_name.into()),
            workspace_id: Some(workspace_id.into()),
            connected_account_id: Some(connected_account_id.into()),
        }
    }
}

impl fmt::Display for JobLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} for workspace {} and account {}",
            self.job_name.as_deref().unwrap_or("-"),
            self.workspace_id.as_deref().unwrap_or("-"),
            self.connected_account_id.as_deref().unwrap_or("-"),
        )
    }
}

/// Everything one fetch produced
#[derive(Debug, Default, Clone, Serialize)]
pub struct PipelineResult {
    pub messages: Vec<Message>,
    /// Per-item failures, in the order their items appeared
    pub errors: Vec<ItemError>,
    pub timing: BatchTiming,
}

/// Fetches messages through a batch transport and decodes them
pub struct BatchFetcher<T> {
    transport: T,
    config: BatchConfig,
    stripper: Arc<dyn QuoteStripper>,
    cancel: CancelFlag,
}

impl<T: BatchTransport> BatchFetcher<T> {
    /// Create a fetcher using the default reply quote stripper
    pub fn new(transport: T, config: BatchConfig) -> Self {
        Self {
            transport,
            config,
            stripper: Arc::new(ReplyQuoteStripper),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_quote_stripper(mut self, stripper: impl QuoteStripper + 'static) -> Self {
        self.stripper = Arc::new(stripper);
        self
    }

    /// Stop between pages and items once `cancel` is raised
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Fetch and decode all `queries`
    ///
    /// Item-level failures are collected in [`PipelineResult::errors`];
    /// `messages.len() + errors.len()` equals the number of fragments found
    /// in the responses (fewer if cancelled).
    ///
    /// # Errors
    /// Only a failed batch request aborts the call.
    pub fn fetch_all_messages(
        &self,
        queries: &[MessageQuery],
        access_token: &str,
        labels: &JobLabels,
    ) -> Result<PipelineResult, PipelineError> {
        let start = Instant::now();
        let responses = fetch_all_by_batches(
            &self.transport,
            queries,
            access_token,
            &self.config,
            &self.cancel,
        )?;
        let fetch_ms = elapsed_ms(start);

        info!(
            "{} fetching {} messages in {}ms",
            labels,
            queries.len(),
            fetch_ms
        );

        let start = Instant::now();
        let (messages, errors) = format_batch_responses(&responses, &*self.stripper, &self.cancel);
        let format_ms = elapsed_ms(start);

        info!(
            "{} formatting {} messages in {}ms",
            labels,
            queries.len(),
            format_ms
        );

        if !errors.is_empty() {
            warn!(
                "{} got {} item errors out of {} items",
                labels,
                errors.len(),
                errors.len() + messages.len()
            );
        }

        Ok(PipelineResult {
            messages,
            errors,
            timing: BatchTiming {
                fetch_ms,
                format_ms,
            },
        })
    }
}

/// Fetch with the default configuration and quote stripper
pub fn fetch_all_messages<T: BatchTransport>(
    transport: T,
    queries: &[MessageQuery],
    access_token: &str,
    labels: &JobLabels,
) -> Result<PipelineResult, PipelineError> {
    BatchFetcher::new(transport, BatchConfig::default()).fetch_all_messages(
        queries,
        access_token,
        labels,
    )
}

/// Decode every response in parallel and concatenate in page order
fn format_batch_responses(
    responses: &[RawBatchResponse],
    stripper: &dyn QuoteStripper,
    cancel: &CancelFlag,
) -> (Vec<Message>, Vec<ItemError>) {
    let per_response: Vec<(Vec<Message>, Vec<ItemError>)> = responses
        .par_iter()
        .map(|response| format_batch_response(response, stripper, cancel))
        .collect();

    let mut messages = Vec::new();
    let mut errors = Vec::new();
    for (page_messages, page_errors) in per_response {
        messages.extend(page_messages);
        errors.extend(page_errors);
    }
    (messages, errors)
}

/// Decode the items of one response in parallel
fn format_batch_response(
    response: &RawBatchResponse,
    stripper: &dyn QuoteStripper,
    cancel: &CancelFlag,
) -> (Vec<Message>, Vec<ItemError>) {
    let results: Vec<Option<Result<Message, ItemError>>> = parse_batch(response)
        .into_par_iter()
        .map(|item| {
            if cancel.is_cancelled() {
                return None;
            }
            Some(item.and_then(|item| decode_item(&item, stripper)))
        })
        .collect();

    let mut messages = Vec::new();
    let mut errors = Vec::new();
    for result in results.into_iter().flatten() {
        match result {
            Ok(message) => messages.push(message),
            Err(e) => {
                debug!("Batch item failed: {}", e);
                errors.push(e);
            }
        }
    }
    (messages, errors)
}
