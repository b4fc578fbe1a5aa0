mod common;

use pretty_assertions::assert_eq;
use serde_json::json;
use veille_client::{ApiError, AuthMode, Navigation, HOME_PATH, LOGIN_PATH};
use veille_core::{text, NotificationKind, PollPolicy};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{Harness, NoBearer};

#[tokio::test]
async fn login_then_resolve_session_as_admin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "fresh-token" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/profil"))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "email": "a@b.fr", "role": "admin" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server, None);
    let dashboard = harness.dashboard(PollPolicy::default());

    let next = dashboard.login("a@b.fr", "pw").await.unwrap();
    assert_eq!(next, Navigation::Redirect(HOME_PATH.to_string()));
    assert_eq!(harness.stored_token().as_deref(), Some("fresh-token"));

    let session = dashboard.resolve_session().await;
    assert_eq!(session.mode, AuthMode::Bearer);
    assert!(session.is_admin());

    assert_eq!(
        harness.sink.toasts_of(NotificationKind::Success),
        vec![text::LOGIN_SUCCEEDED.to_string()]
    );
    let changes = harness.sink.loading_changes();
    assert_eq!(changes.first(), Some(&(true, text::LOGIN_LOADING.to_string())));
    assert_eq!(changes.last().map(|change| change.0), Some(false));
}

#[tokio::test]
async fn login_requires_both_fields() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server, None);
    let dashboard = harness.dashboard(PollPolicy::default());

    let err = dashboard.login("", "pw").await.unwrap_err();
    assert!(matches!(err, ApiError::MissingInput(_)));
    assert_eq!(
        harness.sink.toasts_of(NotificationKind::Warning),
        vec![text::LOGIN_FIELDS_REQUIRED.to_string()]
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_login_shows_backend_message() {
    let server = MockServer::start().await;
    Mock::given(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "erreur": "Identifiants invalides" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server, None);
    let dashboard = harness.dashboard(PollPolicy::default());
    dashboard.login("a@b.fr", "wrong").await.unwrap_err();

    assert_eq!(
        harness.sink.toasts_of(NotificationKind::Error),
        vec![text::login_rejected("Identifiants invalides")]
    );
    assert!(!harness.client.has_credential());
    assert_eq!(harness.coordinator.loading_count(), 0);
}

#[tokio::test]
async fn rejected_credential_resolves_to_anonymous() {
    let server = MockServer::start().await;
    Mock::given(path("/auth/profil"))
        .and(NoBearer)
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "erreur": "Non authentifié" })))
        .mount(&server)
        .await;
    Mock::given(path("/auth/profil"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "erreur": "Token expiré" })))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, Some("expired"));
    let dashboard = harness.dashboard(PollPolicy::default());
    let session = dashboard.resolve_session().await;

    assert_eq!(session.mode, AuthMode::Anonymous);
    assert_eq!(session.profile, None);
    assert_eq!(harness.stored_token(), None);
}

#[tokio::test]
async fn logout_forgets_the_token_and_redirects() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server, Some("valid"));
    let dashboard = harness.dashboard(PollPolicy::default());

    assert_eq!(dashboard.logout(), Navigation::Redirect(LOGIN_PATH.to_string()));
    assert!(!harness.client.has_credential());
    assert_eq!(harness.stored_token(), None);
}
