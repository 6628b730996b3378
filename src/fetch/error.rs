use reqwest::StatusCode;
use thiserror::Error;

use super::Method;

/// Failure while building, sending, or reading an authenticated request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{method} requests cannot carry a body")]
    BodyNotAllowed { method: Method },

    #[error("credential cannot be used as a bearer token: {0}")]
    InvalidCredential(String),

    #[error("failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl RequestError {
    /// HTTP status of the response, when the failure came from one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            RequestError::Transport(e) => e.status(),
            _ => None,
        }
    }
}
