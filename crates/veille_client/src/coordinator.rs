use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

use veille_core::{LoadingIndicator, Notification, Toast, ToastId, ToastQueue, TOAST_DURATION};
use veille_logging::{veille_debug, veille_info};

/// Presentation side of the coordinator. Called outside the internal lock.
pub trait NotificationSink: Send + Sync {
    fn toast_shown(&self, toast: &Toast);

    fn toast_removed(&self, _id: ToastId) {}

    fn loading_changed(&self, visible: bool, label: &str);
}

/// Writes toasts and indicator changes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn toast_shown(&self, toast: &Toast) {
        veille_info!(
            "[{}] {}",
            toast.notification.kind.title(),
            toast.notification.message
        );
    }

    fn loading_changed(&self, visible: bool, label: &str) {
        veille_debug!("loading visible={} label={}", visible, label);
    }
}

#[derive(Debug, Default)]
struct CoordinatorState {
    loading: LoadingIndicator,
    toasts: ToastQueue,
}

/// Shared busy indicator and toast queue for every in-flight operation.
///
/// Spans are only opened through [`Coordinator::begin_span`] or
/// [`Coordinator::with_span`]; both close exactly once.
///
/// Inside a tokio runtime every toast removes itself after
/// [`TOAST_DURATION`]. Outside one, expiry happens on the next `notify` or
/// `visible_toasts` call.
pub struct Coordinator {
    state: Arc<Mutex<CoordinatorState>>,
    sink: Arc<dyn NotificationSink>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(Arc::new(LogSink))
    }
}

impl Coordinator {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            state: Arc::new(Mutex::new(CoordinatorState::default())),
            sink,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        lock_state(&self.state)
    }

    /// Opens a loading span that closes when the guard drops.
    pub fn begin_span(&self, message: Option<&str>) -> SpanGuard<'_> {
        let (became_visible, label) = {
            let mut state = self.lock();
            let became_visible = state.loading.begin(message);
            (became_visible, state.loading.label().to_string())
        };
        if became_visible || message.is_some() {
            self.sink.loading_changed(true, &label);
        }
        SpanGuard { coordinator: self }
    }

    /// Runs `operation` inside a span, closing it however the future ends.
    pub async fn with_span<F>(&self, message: Option<&str>, operation: F) -> F::Output
    where
        F: Future,
    {
        let _span = self.begin_span(message);
        operation.await
    }

    fn end_span(&self) {
        let (became_hidden, label) = {
            let mut state = self.lock();
            let became_hidden = state.loading.end();
            (became_hidden, state.loading.label().to_string())
        };
        if became_hidden {
            self.sink.loading_changed(false, &label);
        }
    }

    /// Drops every open span and hides the indicator.
    pub fn force_reset(&self) {
        let (was_visible, label) = {
            let mut state = self.lock();
            let was_visible = state.loading.reset();
            (was_visible, state.loading.label().to_string())
        };
        if was_visible {
            self.sink.loading_changed(false, &label);
        }
    }

    pub fn loading_count(&self) -> usize {
        self.lock().loading.count()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading.is_visible()
    }

    pub fn loading_label(&self) -> String {
        self.lock().loading.label().to_string()
    }

    pub fn notify(&self, notification: Notification) -> ToastId {
        self.expire_toasts();
        let toast = self
            .lock()
            .toasts
            .push(notification, Instant::now())
            .clone();
        self.sink.toast_shown(&toast);
        self.schedule_removal(toast.id);
        toast.id
    }

    pub fn dismiss(&self, id: ToastId) -> bool {
        dismiss_toast(&self.state, self.sink.as_ref(), id)
    }

    fn schedule_removal(&self, id: ToastId) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let state = Arc::downgrade(&self.state);
        let sink = Arc::clone(&self.sink);
        runtime.spawn(async move {
            tokio::time::sleep(TOAST_DURATION).await;
            expire_scheduled(&state, sink.as_ref(), id);
        });
    }

    /// Toasts still on display, oldest first.
    pub fn visible_toasts(&self) -> Vec<Toast> {
        self.expire_toasts();
        self.lock().toasts.visible().to_vec()
    }

    fn expire_toasts(&self) {
        let expired = self.lock().toasts.expire(Instant::now());
        for toast in expired {
            self.sink.toast_removed(toast.id);
        }
    }
}

fn lock_state(state: &Mutex<CoordinatorState>) -> MutexGuard<'_, CoordinatorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn dismiss_toast(state: &Mutex<CoordinatorState>, sink: &dyn NotificationSink, id: ToastId) -> bool {
    let removed = lock_state(state).toasts.dismiss(id);
    if removed {
        sink.toast_removed(id);
    }
    removed
}

/// Removes a toast whose display time ran out, unless it is already gone or
/// the coordinator was dropped.
fn expire_scheduled(state: &Weak<Mutex<CoordinatorState>>, sink: &dyn NotificationSink, id: ToastId) {
    if let Some(state) = state.upgrade() {
        if dismiss_toast(&state, sink, id) {
            veille_debug!("Toast {} expired", id);
        }
    }
}

/// An open loading span.
#[must_use = "the span closes as soon as the guard is dropped"]
pub struct SpanGuard<'a> {
    coordinator: &'a Coordinator,
}

impl SpanGuard<'_> {
    /// Closes the span now.
    pub fn end(self) {}
}

impl Drop for SpanGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.end_span();
    }
}
