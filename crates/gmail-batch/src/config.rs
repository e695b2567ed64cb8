//! Batch pipeline configuration
//!
//! Settings are resolved in this order (later wins):
//! 1. Built-in defaults
//! 2. JSON file (~/.config/gmail-batch/batch.json)
//! 3. Environment variables

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config filename in the gmail-batch config directory
const CONFIG_FILE: &str = "batch.json";

/// Gmail caps a single batch request at this many calls
const MAX_BATCH_LIMIT: usize = 100;

/// Settings for fetching messages through the batch endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Batch endpoint URL
    pub endpoint: String,
    /// Maximum queries per batch request
    pub batch_limit: usize,
    /// Multipart boundary used for requests
    pub boundary: String,
    /// Deadline for one batch request, in seconds
    pub timeout_secs: u64,
    /// Largest batch response body accepted, in bytes
    pub max_response_bytes: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.googleapis.com/batch/gmail/v1".to_string(),
            batch_limit: 50,
            boundary: "batch_gmail_messages".to_string(),
            timeout_secs: 30,
            max_response_bytes: 256 * 1024 * 1024,
        }
    }
}

impl BatchConfig {
    /// Load config from the default file (if present) and the environment
    pub fn load() -> Result<Self> {
        let base = if config::config_exists(CONFIG_FILE) {
            config::load_json(CONFIG_FILE)?
        } else {
            Self::default()
        };

        let config = base.with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a specific JSON file, then apply the environment
    pub fn from_file(path: &Path) -> Result<Self> {
        let base: Self = config::load_json_file(path)?;
        let config = base.with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse batch config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment)
    ///
    /// Recognized keys: `GMAIL_BATCH_ENDPOINT`, `GMAIL_BATCH_LIMIT`,
    /// `GMAIL_BATCH_TIMEOUT_SECS`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("GMAIL_BATCH_ENDPOINT") {
            self.endpoint = endpoint;
        }

        if let Some(limit) = lookup("GMAIL_BATCH_LIMIT") {
            self.batch_limit = limit
                .trim()
                .parse()
                .with_context(|| format!("Invalid GMAIL_BATCH_LIMIT: {}", limit))?;
        }

        if let Some(timeout) = lookup("GMAIL_BATCH_TIMEOUT_SECS") {
            self.timeout_secs = timeout
                .trim()
                .parse()
                .with_context(|| format!("Invalid GMAIL_BATCH_TIMEOUT_SECS: {}", timeout))?;
        }

        Ok(self)
    }

    /// Check that the settings can drive a batch fetch
    pub fn validate(&self) -> Result<()> {
        if self.batch_limit == 0 || self.batch_limit > MAX_BATCH_LIMIT {
            bail!(
                "batch_limit must be between 1 and {}, got {}",
                MAX_BATCH_LIMIT,
                self.batch_limit
            );
        }
        if self.boundary.is_empty() {
            bail!("boundary must not be empty");
        }
        if self.endpoint.is_empty() {
            bail!("endpoint must not be empty");
        }
        Ok(())
    }
}
