//! Error types for the Canopy SDK

use canopy_client::ClientError;
use thiserror::Error;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK error types
#[derive(Error, Debug)]
pub enum SdkError {
    /// Transport failure or non-2xx response
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Server answered 2xx with `success: false`
    #[error("{0}")]
    Rejected(String),

    /// Server reported success but left out the payload
    #[error("Response did not include {0}")]
    MissingData(&'static str),

    /// Payload did not match the expected shape
    #[error("Malformed {entity}: {source}")]
    Decode {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Input failed a domain invariant before being sent
    #[error("{0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SdkError {
    /// Text shown in the dashboard's shared error field
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<toml::de::Error> for SdkError {
    fn from(err: toml::de::Error) -> Self {
        SdkError::Config(err.to_string())
    }
}
