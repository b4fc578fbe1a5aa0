use std::time::{Duration, Instant};

/// How long a toast stays up unless dismissed.
pub const TOAST_DURATION: Duration = Duration::from_millis(4500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn title(self) -> &'static str {
        match self {
            NotificationKind::Info => "Info",
            NotificationKind::Success => "Succès",
            NotificationKind::Warning => "Attention",
            NotificationKind::Error => "Erreur",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn new(message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Error)
    }
}

pub type ToastId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub notification: Notification,
    pub shown_at: Instant,
}

impl Toast {
    pub fn expires_at(&self) -> Instant {
        self.shown_at + TOAST_DURATION
    }
}

/// Stack of transient toasts, oldest first. No deduplication.
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    next_id: ToastId,
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification, now: Instant) -> &Toast {
        self.next_id += 1;
        let index = self.toasts.len();
        self.toasts.push(Toast {
            id: self.next_id,
            notification,
            shown_at: now,
        });
        &self.toasts[index]
    }

    /// User dismissal. Returns `false` if the toast was already gone.
    pub fn dismiss(&mut self, id: ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id != id);
        self.toasts.len() != before
    }

    /// Removes and returns every toast whose display time has elapsed.
    pub fn expire(&mut self, now: Instant) -> Vec<Toast> {
        let (expired, kept): (Vec<Toast>, Vec<Toast>) = self
            .toasts
            .drain(..)
            .partition(|toast| toast.expires_at() <= now);
        self.toasts = kept;
        expired
    }

    pub fn visible(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}
