use std::sync::{Arc, Mutex, PoisonError};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use veille_core::is_token_problem;
use veille_logging::{redact_token, veille_debug, veille_error, veille_info, veille_warn};

use crate::{
    ApiError, ApiRequest, CallOptions, CredentialStore, RequestOutcome, StoreError, Transport,
    CREDENTIAL_KEY,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme and authority of the backend, e.g. `http://127.0.0.1:5000`.
    pub base_url: String,
    pub api_root: String,
    pub auth_root: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            api_root: "/api".to_string(),
            auth_root: "/auth".to_string(),
        }
    }
}

/// Authenticated access to the backend.
///
/// Holds the bearer token in memory, mirrored in a [`CredentialStore`]. Each
/// logical call makes at most two transport attempts: one with the bearer,
/// and one without it when the backend rejected the token.
pub struct RequestClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    credential: Mutex<Option<String>>,
}

impl RequestClient {
    /// Seeds the in-memory credential from the store.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let credential = match store.load(CREDENTIAL_KEY) {
            Ok(token) => token.filter(|token| !token.is_empty()),
            Err(err) => {
                veille_warn!("Could not read stored credential: {}", err);
                None
            }
        };
        Self {
            config,
            transport,
            store,
            credential: Mutex::new(credential),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Snapshot of the held bearer token.
    pub fn credential(&self) -> Option<String> {
        self.credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_credential(&self) -> bool {
        self.credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Calls `endpoint` under the API root and returns the JSON body.
    pub async fn call(&self, endpoint: &str, options: CallOptions) -> Result<Value, ApiError> {
        let url = self.url_for(&self.config.api_root, endpoint);
        self.call_url(&url, options).await
    }

    /// Same protocol as [`RequestClient::call`], under the auth root.
    pub async fn call_auth(&self, endpoint: &str, options: CallOptions) -> Result<Value, ApiError> {
        let url = self.url_for(&self.config.auth_root, endpoint);
        self.call_url(&url, options).await
    }

    async fn call_url(&self, url: &str, options: CallOptions) -> Result<Value, ApiError> {
        let bearer = self.credential();
        let first = self.attempt(url, &options, bearer.as_deref()).await?;
        let err = match into_result(first) {
            Ok(body) => return Ok(body),
            Err(err) => err,
        };
        if !should_fall_back(&err, bearer.is_some()) {
            veille_debug!("{} {} failed: {}", options.method, url, err);
            return Err(err);
        }

        veille_warn!("Bearer token rejected by {} ({}); retrying without it", url, err);
        if let Some(token) = bearer.as_deref() {
            self.discard_credential_if(token);
        }
        let second = self.attempt(url, &options, None).await?;
        into_result(second)
    }

    /// One transport attempt with the default headers merged in.
    pub(crate) async fn attempt(
        &self,
        url: &str,
        options: &CallOptions,
        bearer: Option<&str>,
    ) -> Result<RequestOutcome, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &options.headers {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(token) = bearer {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| ApiError::InvalidHeader(err.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        self.transport
            .send(ApiRequest {
                method: options.method.clone(),
                url: url.to_string(),
                headers,
                body: options.body.clone(),
            })
            .await
    }

    /// Persists a freshly issued token and starts using it.
    pub fn store_credential(&self, token: &str) -> Result<(), StoreError> {
        self.store.save(CREDENTIAL_KEY, token)?;
        *self.credential.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        veille_info!("Stored credential {}", redact_token(token));
        Ok(())
    }

    /// Forgets the held token, in memory and in the store.
    pub fn discard_credential(&self) {
        self.clear_stored();
        *self.credential.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Forgets `token` unless a newer one replaced it in the meantime.
    fn discard_credential_if(&self, token: &str) {
        let mut held = self.credential.lock().unwrap_or_else(PoisonError::into_inner);
        if held.as_deref() != Some(token) {
            return;
        }
        self.clear_stored();
        *held = None;
        veille_info!("Discarded credential {}", redact_token(token));
    }

    fn clear_stored(&self) {
        if let Err(err) = self.store.clear(CREDENTIAL_KEY) {
            veille_error!("Failed to clear stored credential: {}", err);
        }
    }

    pub(crate) fn url_for(&self, root: &str, endpoint: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if endpoint.starts_with('/') {
            format!("{base}{root}{endpoint}")
        } else {
            format!("{base}{root}/{endpoint}")
        }
    }
}

/// Whether a failed first attempt should be retried without the bearer.
///
/// Only a 401 whose message looks like a token problem qualifies, and only
/// when a bearer was actually sent.
pub fn should_fall_back(err: &ApiError, bearer_attached: bool) -> bool {
    match err {
        ApiError::AuthRejected { message, .. } => bearer_attached && is_token_problem(message),
        _ => false,
    }
}

pub(crate) fn into_result(outcome: RequestOutcome) -> Result<Value, ApiError> {
    if outcome.ok {
        Ok(outcome.body)
    } else {
        Err(ApiError::from_outcome(&outcome))
    }
}
