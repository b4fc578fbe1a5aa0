use serde_json::Value;
use thiserror::Error;

use crate::RequestOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout: {0}")]
    Timeout(String),
    /// HTTP 401 from the backend.
    #[error("{message}")]
    AuthRejected { status: u16, message: String },
    /// Any other non-2xx response.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("{0}")]
    MissingInput(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Turns a non-2xx outcome into the matching error variant.
    pub fn from_outcome(outcome: &RequestOutcome) -> Self {
        let message = error_message(&outcome.body, outcome.status);
        if outcome.status == 401 {
            ApiError::AuthRejected {
                status: outcome.status,
                message,
            }
        } else {
            ApiError::Status {
                status: outcome.status,
                message,
            }
        }
    }

    /// HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthRejected { status, .. } | ApiError::Status { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Whether the failure happened before any HTTP status was available.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Timeout(_) | ApiError::InvalidUrl(_)
        )
    }
}

/// Prefers the backend's `erreur` field, then `message`, then `Erreur {status}`.
pub fn error_message(body: &Value, status: u16) -> String {
    ["erreur", "message"]
        .iter()
        .filter_map(|field| body.get(field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| format!("Erreur {status}"))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("credential store entry {key}: {reason}")]
pub struct StoreError {
    pub key: String,
    pub reason: String,
}

impl StoreError {
    pub fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
