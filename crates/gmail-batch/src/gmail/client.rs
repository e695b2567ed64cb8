//! Gmail batch HTTP transport
//!
//! The pipeline only sees the [`BatchTransport`] trait; [`UreqTransport`] is
//! the production implementation. Uses synchronous HTTP (ureq) to be
//! executor-agnostic.

use std::time::Duration;

use crate::config::BatchConfig;

/// Error raised when a batch request cannot be completed
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Batch endpoint returned HTTP {0}")]
    Status(u16),

    #[error("Failed to send batch request: {0}")]
    Http(#[from] ureq::Error),

    #[error("{0}")]
    Other(String),
}

/// Raw HTTP response of one batch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBatchResponse {
    pub status: u16,
    /// Value of the `content-type` response header
    pub content_type: Option<String>,
    pub body: String,
}

/// Sends one multipart batch request
pub trait BatchTransport {
    /// POST `body` to the batch endpoint
    ///
    /// # Arguments
    /// * `body` - Multipart body built by [`super::build_batch_body`]
    /// * `boundary` - Boundary token used in `body`
    /// * `access_token` - OAuth bearer token
    fn send(
        &self,
        body: &str,
        boundary: &str,
        access_token: &str,
    ) -> Result<RawBatchResponse, TransportError>;
}

impl<T: BatchTransport + ?Sized> BatchTransport for &T {
    fn send(
        &self,
        body: &str,
        boundary: &str,
        access_token: &str,
    ) -> Result<RawBatchResponse, TransportError> {
        (**self).send(body, boundary, access_token)
    }
}

/// Batch transport backed by a ureq agent
pub struct UreqTransport {
    agent: ureq::Agent,
    endpoint: String,
    max_response_bytes: u64,
}

impl UreqTransport {
    /// Create a transport for the endpoint and timeout in `config`
    pub fn new(config: &BatchConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            endpoint: config.endpoint.clone(),
            max_response_bytes: config.max_response_bytes,
        }
    }
}

impl BatchTransport for UreqTransport {
    fn send(
        &self,
        body: &str,
        boundary: &str,
        access_token: &str,
    ) -> Result<RawBatchResponse, TransportError> {
        let response = self
            .agent
            .post(&self.endpoint)
            .header(
                "Content-Type",
                &format!("multipart/mixed; boundary={}", boundary),
            )
            .header("Authorization", &format!("Bearer {}", access_token))
            .send(body);

        let mut response = match response {
            Ok(resp) => resp,
            Err(ureq::Error::StatusCode(code)) => return Err(TransportError::Status(code)),
            Err(e) => return Err(e.into()),
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_response_bytes)
            .read_to_string()?;

        Ok(RawBatchResponse {
            status,
            content_type,
            body,
        })
    }
}
