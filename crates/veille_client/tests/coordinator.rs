mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use veille_client::Coordinator;
use veille_core::{Notification, DEFAULT_LOADING_LABEL, TOAST_DURATION};

use common::{init_logging, RecordingSink};

fn coordinator() -> (Coordinator, Arc<RecordingSink>) {
    init_logging();
    let sink = Arc::new(RecordingSink::default());
    (Coordinator::new(sink.clone()), sink)
}

#[tokio::test]
async fn span_closes_when_the_operation_fails() {
    let (coordinator, sink) = coordinator();
    let result: Result<(), &str> = coordinator
        .with_span(Some("Travail..."), async {
            Err("boom")
        })
        .await;

    assert!(result.is_err());
    assert_eq!(coordinator.loading_count(), 0);
    assert_eq!(
        sink.loading_changes(),
        vec![(true, "Travail...".to_string()), (false, "Travail...".to_string())]
    );
}

#[test]
fn indicator_stays_up_until_the_last_span_closes() {
    let (coordinator, sink) = coordinator();
    let outer = coordinator.begin_span(None);
    let inner = coordinator.begin_span(Some("Scraping en cours..."));
    assert_eq!(coordinator.loading_count(), 2);

    inner.end();
    assert!(coordinator.is_loading());
    assert_eq!(coordinator.loading_label(), "Scraping en cours...");
    outer.end();

    assert!(!coordinator.is_loading());
    assert_eq!(
        sink.loading_changes(),
        vec![
            (true, DEFAULT_LOADING_LABEL.to_string()),
            (true, "Scraping en cours...".to_string()),
            (false, "Scraping en cours...".to_string()),
        ]
    );
}

#[test]
fn force_reset_hides_the_indicator_once() {
    let (coordinator, sink) = coordinator();
    let first = coordinator.begin_span(None);
    let second = coordinator.begin_span(None);
    coordinator.force_reset();
    drop(first);
    drop(second);

    assert_eq!(coordinator.loading_count(), 0);
    let hidden = sink
        .loading_changes()
        .into_iter()
        .filter(|(visible, _)| !visible)
        .count();
    assert_eq!(hidden, 1);
}

#[test]
fn toasts_can_be_dismissed() {
    let (coordinator, sink) = coordinator();
    let first = coordinator.notify(Notification::info("un"));
    coordinator.notify(Notification::error("deux"));

    assert!(coordinator.dismiss(first));
    assert!(!coordinator.dismiss(first));
    let visible: Vec<String> = coordinator
        .visible_toasts()
        .into_iter()
        .map(|toast| toast.notification.message)
        .collect();
    assert_eq!(visible, vec!["deux".to_string()]);
    assert_eq!(sink.toasts().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn toast_removes_itself_after_its_display_time() {
    let (coordinator, sink) = coordinator();
    let id = coordinator.notify(Notification::info("x"));

    tokio::time::sleep(TOAST_DURATION - Duration::from_millis(100)).await;
    assert!(sink.removed().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(sink.removed(), vec![id]);
}

#[tokio::test(start_paused = true)]
async fn dismissed_toast_is_not_removed_twice() {
    let (coordinator, sink) = coordinator();
    let id = coordinator.notify(Notification::warning("y"));
    assert!(coordinator.dismiss(id));

    tokio::time::sleep(TOAST_DURATION * 2).await;
    assert_eq!(sink.removed(), vec![id]);
}
