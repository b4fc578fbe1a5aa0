//! Veille client: authenticated requests, job supervision, and notifications.
mod auth;
mod client;
mod coordinator;
mod credential;
mod dashboard;
mod endpoints;
mod error;
mod supervisor;
mod transport;
mod types;

pub use auth::{AuthMode, Profile};
pub use client::{should_fall_back, ClientConfig, RequestClient};
pub use coordinator::{Coordinator, LogSink, NotificationSink, SpanGuard};
pub use credential::{CredentialStore, MemoryCredentialStore, CREDENTIAL_KEY};
pub use dashboard::{Dashboard, SessionView, HOME_PATH, LOGIN_PATH};
pub use error::{error_message, ApiError, StoreError};
pub use supervisor::{
    single_job_endpoint, JobSupervisor, Sleeper, SupervisionOutcome, SupervisorError,
    TokioSleeper, LAUNCH_ENDPOINT, STATUS_ENDPOINT,
};
pub use transport::{AmbientCredentials, ReqwestTransport, Transport, TransportSettings};
pub use types::{ApiRequest, CallOptions, Navigation, RequestOutcome};
