use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;

/// Result of one transport attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    pub ok: bool,
    pub status: u16,
    /// Parsed JSON body, or an empty object when the body is not JSON.
    pub body: Value,
}

/// A fully resolved request handed to a [`crate::Transport`].
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

/// Per-call options merged over the client defaults.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl CallOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self {
            method: Method::POST,
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Where the caller should send the user next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Redirect(String),
}
