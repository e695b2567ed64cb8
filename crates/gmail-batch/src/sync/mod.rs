//! Batch fetch pipeline
//!
//! Pages queries through the batch endpoint and decodes every response into
//! messages and per-item errors.

mod cancel;
mod fetch;
mod timing;

pub use cancel::CancelFlag;
pub use fetch::{BatchFetcher, JobLabels, PipelineResult, fetch_all_messages};
pub use timing::{BatchTiming, elapsed_ms};
