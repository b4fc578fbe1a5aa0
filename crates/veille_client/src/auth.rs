use serde_json::{json, Value};
use veille_logging::veille_info;

use crate::client::into_result;
use crate::{ApiError, CallOptions, RequestClient};

/// How the backend accepted (or refused) the current caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Bearer,
    /// Accepted through transport-level credentials, no bearer held.
    Ambient,
    Anonymous,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub role: Option<String>,
    pub raw: Value,
}

impl Profile {
    pub fn from_body(raw: Value) -> Self {
        let role = raw.get("role").and_then(Value::as_str).map(ToOwned::to_owned);
        Self { role, raw }
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

impl RequestClient {
    /// Exchanges email and password for a token and stores it.
    ///
    /// Sent without bearer and without the fallback retry.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let url = self.url_for(&self.config().auth_root, "/login");
        let options = CallOptions::post().with_body(json!({ "email": email, "password": password }));
        let body = into_result(self.attempt(&url, &options, None).await?)?;

        let token = body
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::MalformedResponse("login response has no token".to_string()))?;
        self.store_credential(token)?;
        veille_info!("Logged in as {}", email);
        Ok(())
    }

    pub fn logout(&self) {
        self.discard_credential();
        veille_info!("Logged out");
    }

    pub async fn profile(&self) -> Result<Profile, ApiError> {
        let body = self.call_auth("/profil", CallOptions::get()).await?;
        Ok(Profile::from_body(body))
    }
}
