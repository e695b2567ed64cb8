//! Gmail batch crate - fetches and parses mailbox messages in bulk
//!
//! This crate provides the ingestion step of a mailbox sync:
//! - Domain models (Message, Participant, Attachment, MessageQuery)
//! - Multipart batch requests against the Gmail batch endpoint
//! - Multipart response splitting and raw RFC 5322 decoding
//! - A partial-failure-tolerant pipeline that returns messages and per-item errors
//!
//! Persistence, scheduling and retries are left to the caller.

pub mod config;
pub mod error;
pub mod gmail;
pub mod models;
pub mod sync;

pub use config::BatchConfig;
pub use error::{ItemError, PipelineError};
pub use gmail::{
    BatchTransport, QuoteStripError, QuoteStripper, RawBatchResponse, ReplyQuoteStripper,
    TransportError, UreqTransport,
    api::{ApiError, ParsedItem, RawMessagePayload},
};
pub use models::{Attachment, Message, MessageQuery, Participant, ParticipantRole};
pub use sync::{
    BatchFetcher, BatchTiming, CancelFlag, JobLabels, PipelineResult, fetch_all_messages,
};
