use std::sync::Arc;

use serde_json::Value;
use veille_core::{text, Notification, PollPolicy};
use veille_logging::{veille_info, veille_warn};

use crate::{
    ApiError, AuthMode, Coordinator, JobSupervisor, Navigation, Profile, RequestClient, Sleeper,
    SupervisionOutcome, SupervisorError,
};

pub const HOME_PATH: &str = "/offres";
pub const LOGIN_PATH: &str = "/connexion";

/// Who the backend thinks the caller is.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub mode: AuthMode,
    pub profile: Option<Profile>,
}

impl SessionView {
    fn anonymous() -> Self {
        Self {
            mode: AuthMode::Anonymous,
            profile: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(Profile::is_admin)
    }
}

/// The process-wide context shared by every dashboard operation.
pub struct Dashboard {
    client: Arc<RequestClient>,
    coordinator: Arc<Coordinator>,
    supervisor: JobSupervisor,
}

impl Dashboard {
    pub fn new(
        client: Arc<RequestClient>,
        coordinator: Arc<Coordinator>,
        sleeper: Arc<dyn Sleeper>,
        policy: PollPolicy,
    ) -> Self {
        let supervisor =
            JobSupervisor::new(Arc::clone(&client), Arc::clone(&coordinator), sleeper, policy);
        Self {
            client,
            coordinator,
            supervisor,
        }
    }

    pub fn client(&self) -> &RequestClient {
        &self.client
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn supervisor(&self) -> &JobSupervisor {
        &self.supervisor
    }

    /// Logs in and tells the caller where to go next.
    pub async fn login(&self, email: &str, password: &str) -> Result<Navigation, ApiError> {
        if email.trim().is_empty() || password.is_empty() {
            self.coordinator
                .notify(Notification::warning(text::LOGIN_FIELDS_REQUIRED));
            return Err(ApiError::MissingInput("email and password"));
        }

        let result = self
            .coordinator
            .with_span(Some(text::LOGIN_LOADING), self.client.login(email, password))
            .await;
        match result {
            Ok(()) => {
                self.coordinator
                    .notify(Notification::success(text::LOGIN_SUCCEEDED));
                Ok(Navigation::Redirect(HOME_PATH.to_string()))
            }
            Err(err) => {
                let message = if err.is_transport() {
                    text::login_transport_failed(&err.to_string())
                } else {
                    text::login_rejected(&err.to_string())
                };
                veille_warn!("Login failed for {}: {}", email, err);
                self.coordinator.notify(Notification::error(message));
                Err(err)
            }
        }
    }

    pub fn logout(&self) -> Navigation {
        self.client.logout();
        Navigation::Redirect(LOGIN_PATH.to_string())
    }

    /// Asks the backend for the caller's profile.
    ///
    /// A held credential that no longer yields a profile is discarded.
    pub async fn resolve_session(&self) -> SessionView {
        let had_credential = self.client.has_credential();
        match self.client.profile().await {
            Ok(profile) => {
                let mode = if self.client.has_credential() {
                    AuthMode::Bearer
                } else {
                    AuthMode::Ambient
                };
                veille_info!("Session resolved as {:?} (role {:?})", mode, profile.role);
                SessionView {
                    mode,
                    profile: Some(profile),
                }
            }
            Err(err) => {
                if had_credential {
                    veille_warn!("Profile lookup failed, logging out: {}", err);
                    self.client.logout();
                }
                SessionView::anonymous()
            }
        }
    }

    pub async fn run_one(&self, key: &str) -> Result<Value, SupervisorError> {
        self.supervisor.run_one(key).await
    }

    pub async fn run_all(&self) -> Result<SupervisionOutcome, SupervisorError> {
        self.supervisor.run_all().await
    }
}
