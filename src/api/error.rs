//! Recommendation service error types

use thiserror::Error;

/// Errors surfaced by the recommendation service transport
///
/// This is the only error the dispatcher produces: no retries, no payload
/// interpretation. Callers decide whether a failed request is fatal.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Service error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response body: {0}")]
    Body(#[from] serde_json::Error),
}

impl RequestError {
    /// HTTP status code, when the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            RequestError::Network(e) => e.status().map(|s| s.as_u16()),
            RequestError::Body(_) => None,
        }
    }
}
