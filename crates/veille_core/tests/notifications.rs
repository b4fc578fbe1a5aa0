use std::time::{Duration, Instant};

use veille_core::{
    LoadingIndicator, Notification, NotificationKind, ToastQueue, DEFAULT_LOADING_LABEL,
    TOAST_DURATION,
};

#[test]
fn nested_spans_keep_indicator_visible_until_last_end() {
    let mut loading = LoadingIndicator::new();
    assert!(!loading.is_visible());
    assert_eq!(loading.label(), DEFAULT_LOADING_LABEL);

    assert!(loading.begin(Some("Scraping global en cours...")));
    assert!(!loading.begin(None));
    assert_eq!(loading.label(), "Scraping global en cours...");

    assert!(!loading.end());
    assert!(loading.is_visible());
    assert!(loading.end());
    assert!(!loading.is_visible());
}

#[test]
fn counter_never_goes_negative() {
    let mut loading = LoadingIndicator::new();
    assert!(!loading.end());
    assert_eq!(loading.count(), 0);

    let steps = [true, false, false, true, true, false, false, false, true];
    for open in steps {
        if open {
            loading.begin(None);
        } else {
            loading.end();
        }
        assert_eq!(loading.is_visible(), loading.count() > 0);
    }
    assert_eq!(loading.count(), 1);
}

#[test]
fn reset_hides_regardless_of_open_spans() {
    let mut loading = LoadingIndicator::new();
    loading.begin(None);
    loading.begin(None);
    assert!(loading.reset());
    assert_eq!(loading.count(), 0);
    assert!(!loading.reset());
}

#[test]
fn toasts_expire_after_display_duration() {
    let start = Instant::now();
    let mut queue = ToastQueue::new();
    let first = queue.push(Notification::info("a"), start).id;
    let second = queue
        .push(Notification::info("a"), start + Duration::from_secs(1))
        .id;
    assert_ne!(first, second);
    assert_eq!(queue.len(), 2);

    assert!(queue.expire(start + Duration::from_secs(4)).is_empty());

    let expired = queue.expire(start + TOAST_DURATION);
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, first);
    assert_eq!(queue.visible()[0].id, second);

    let expired = queue.expire(start + Duration::from_secs(10));
    assert_eq!(expired.len(), 1);
    assert!(queue.is_empty());
}

#[test]
fn dismissal_removes_only_that_toast() {
    let now = Instant::now();
    let mut queue = ToastQueue::new();
    let warning = queue.push(Notification::warning("attention"), now).id;
    let error = queue.push(Notification::error("boom"), now).id;

    assert!(queue.dismiss(warning));
    assert!(!queue.dismiss(warning));
    assert_eq!(queue.visible().len(), 1);
    assert_eq!(queue.visible()[0].id, error);
    assert_eq!(queue.visible()[0].notification.kind, NotificationKind::Error);
    assert_eq!(NotificationKind::Error.title(), "Erreur");
}
