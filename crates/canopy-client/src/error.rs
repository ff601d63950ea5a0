//! Error types for the gateway

use thiserror::Error;

/// Gateway error
///
/// Callers treat every variant as "the request failed"; the split only
/// exists so logs and tests can tell a timeout from a server refusal.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection could not be established or was interrupted
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request exceeded the configured timeout
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Response body was not the expected JSON
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Server answered with a non-2xx status
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Gateway configuration is unusable (bad URL, bad header value)
    #[error("Invalid gateway configuration: {0}")]
    InvalidConfig(String),

    /// Credential store could not be read or written
    #[error("Credential store error: {0}")]
    Credentials(String),
}

impl ClientError {
    /// HTTP status carried by a server error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server rejected the credential
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, ClientError>;
