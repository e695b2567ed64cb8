//! Queries sent inside a batch request

use serde::{Deserialize, Serialize};

/// One resource to fetch, addressed by its path relative to the API host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageQuery {
    pub uri: String,
}

impl MessageQuery {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// Query for a single message in raw RFC 5322 form
    pub fn raw_message(message_id: &str) -> Self {
        Self::new(format!(
            "/gmail/v1/users/me/messages/{}?format=raw",
            message_id
        ))
    }
}
