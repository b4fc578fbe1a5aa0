use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};
use veille_logging::veille_trace;

use crate::{ApiError, ApiRequest, RequestOutcome};

/// Credentials the transport presents on its own when a request carries no
/// `Authorization` header, like a browser answering a basic-auth challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbientCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub ambient: Option<AmbientCredentials>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            ambient: None,
        }
    }
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Performs exactly one HTTP exchange. Non-2xx statuses are returned as
    /// outcomes, not errors.
    async fn send(&self, request: ApiRequest) -> Result<RequestOutcome, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    ambient: Option<AmbientCredentials>,
}

impl ReqwestTransport {
    pub fn new(settings: TransportSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(Self {
            client,
            ambient: settings.ambient,
        })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<RequestOutcome, ApiError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|err| ApiError::InvalidUrl(format!("{}: {err}", request.url)))?;

        let has_authorization = request.headers.contains_key(AUTHORIZATION);
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let (false, Some(ambient)) = (has_authorization, &self.ambient) {
            builder = builder.basic_auth(&ambient.username, Some(&ambient.password));
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        veille_trace!(
            "{} {} -> {} ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            bytes.len()
        );

        Ok(RequestOutcome {
            ok: status.is_success(),
            status: status.as_u16(),
            body: parse_body(&bytes),
        })
    }
}

/// Unparseable bodies read as an empty object.
pub(crate) fn parse_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::Object(Map::new()))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout(err.to_string());
    }
    ApiError::Network(err.to_string())
}
