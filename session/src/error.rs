//! Error taxonomy for client calls.

use reqwest::{Method, StatusCode};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{method} {path} returned {status}: {message}")]
    Status {
        method: Method,
        path: String,
        status: StatusCode,
        message: String,
    },
    /// The refresh call was rejected; the session is gone.
    #[error("session expired (refresh returned {})", describe_status(.status))]
    SessionExpired { status: Option<StatusCode> },
    #[error("failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },
    #[error("guest cart storage: {0}")]
    Storage(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn describe_status(status: &Option<StatusCode>) -> String {
    status.map_or_else(|| "no response".to_owned(), |s| s.to_string())
}

impl ClientError {
    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::SessionExpired { status } => *status,
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED) || matches!(self, Self::SessionExpired { .. })
    }
}
