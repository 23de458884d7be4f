//! Error types for fetchers.

use thiserror::Error;

/// Errors that can occur when fetching a stats snapshot.
///
/// Every variant is recoverable from the scheduler's point of view: the next
/// tick simply tries again.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse the response body as a stats snapshot.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The fetcher was configured with an unusable endpoint.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl FetchError {
    /// Short reason string for logs and failure events.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}
