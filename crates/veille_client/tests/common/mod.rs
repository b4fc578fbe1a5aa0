#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use veille_client::{
    ClientConfig, Coordinator, CredentialStore, Dashboard, MemoryCredentialStore,
    NotificationSink, ReqwestTransport, RequestClient, Sleeper, TransportSettings,
    CREDENTIAL_KEY,
};
use veille_core::{Notification, NotificationKind, PollPolicy, Toast, ToastId};
use wiremock::{Match, MockServer, Request};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(veille_logging::initialize_for_tests);
}

#[derive(Default)]
pub struct RecordingSink {
    toasts: Mutex<Vec<Notification>>,
    loading: Mutex<Vec<(bool, String)>>,
    removed: Mutex<Vec<ToastId>>,
}

impl RecordingSink {
    pub fn toasts(&self) -> Vec<Notification> {
        self.toasts.lock().unwrap().clone()
    }

    pub fn toasts_of(&self, kind: NotificationKind) -> Vec<String> {
        self.toasts()
            .into_iter()
            .filter(|toast| toast.kind == kind)
            .map(|toast| toast.message)
            .collect()
    }

    pub fn removed(&self) -> Vec<ToastId> {
        self.removed.lock().unwrap().clone()
    }

    pub fn loading_changes(&self) -> Vec<(bool, String)> {
        self.loading.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn toast_shown(&self, toast: &Toast) {
        self.toasts.lock().unwrap().push(toast.notification.clone());
    }

    fn toast_removed(&self, id: ToastId) {
        self.removed.lock().unwrap().push(id);
    }

    fn loading_changed(&self, visible: bool, label: &str) {
        self.loading.lock().unwrap().push((visible, label.to_string()));
    }
}

/// Records requested waits and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}

/// Matches requests that carry no bearer token.
pub struct NoBearer;

impl Match for NoBearer {
    fn matches(&self, request: &Request) -> bool {
        !request
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("Bearer "))
    }
}

pub struct Harness {
    pub client: Arc<RequestClient>,
    pub store: Arc<MemoryCredentialStore>,
    pub coordinator: Arc<Coordinator>,
    pub sink: Arc<RecordingSink>,
    pub sleeper: Arc<RecordingSleeper>,
}

impl Harness {
    pub fn new(server: &MockServer, token: Option<&str>) -> Self {
        Self::with_settings(server, token, TransportSettings::default())
    }

    pub fn with_settings(
        server: &MockServer,
        token: Option<&str>,
        settings: TransportSettings,
    ) -> Self {
        init_logging();
        let store = Arc::new(match token {
            Some(token) => MemoryCredentialStore::with_token(token),
            None => MemoryCredentialStore::new(),
        });
        let transport = Arc::new(ReqwestTransport::new(settings).expect("transport"));
        let config = ClientConfig {
            base_url: server.uri(),
            ..ClientConfig::default()
        };
        let client = Arc::new(RequestClient::new(config, transport, store.clone()));
        let sink = Arc::new(RecordingSink::default());
        let coordinator = Arc::new(Coordinator::new(sink.clone()));
        Self {
            client,
            store,
            coordinator,
            sink,
            sleeper: Arc::new(RecordingSleeper::default()),
        }
    }

    pub fn dashboard(&self, policy: PollPolicy) -> Dashboard {
        Dashboard::new(
            self.client.clone(),
            self.coordinator.clone(),
            self.sleeper.clone(),
            policy,
        )
    }

    pub fn stored_token(&self) -> Option<String> {
        self.store.load(CREDENTIAL_KEY).unwrap()
    }
}
