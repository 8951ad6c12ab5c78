//! Error types for the content client
//!
//! Argument problems are reported before any request is made. Everything that
//! goes wrong once the request has been sent is an upstream error.

use thiserror::Error;

/// Errors that can occur when talking to the content API
#[derive(Debug, Error)]
pub enum ContentError {
    /// A caller-supplied argument was missing or out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration is missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed before a response was received
    #[error("Error making request to the content API: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-2xx status
    #[error("Content API error: HTTP {0}")]
    Status(u16),

    /// The API answered with an empty body
    #[error("Empty response from the content API")]
    EmptyResponse,

    /// The API body was not valid JSON
    #[error("Error parsing JSON response from the content API: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The API reported an error in its `error` field
    #[error("Content API error: {0}")]
    Api(String),

    /// The cache backend failed while clearing entries
    #[error("Cache error: {0}")]
    Cache(#[from] std::io::Error),
}

impl ContentError {
    /// Whether the error was raised by argument validation
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ContentError::InvalidArgument(_))
    }

    /// Whether the error came from the remote API or the transport
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ContentError::Request(_)
                | ContentError::Status(_)
                | ContentError::EmptyResponse
                | ContentError::InvalidJson(_)
                | ContentError::Api(_)
        )
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ContentError::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;
