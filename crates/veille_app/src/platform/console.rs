use chrono::Local;
use veille_client::NotificationSink;
use veille_core::{NotificationKind, Toast};
use veille_logging::veille_debug;

/// Prints toasts to the terminal as they are raised.
///
/// Errors and warnings go to stderr, the rest to stdout. Each time the
/// loading indicator appears or changes label, its label goes to stderr.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn toast_shown(&self, toast: &Toast) {
        let line = format!(
            "[{}] {}: {}",
            Local::now().format("%H:%M:%S"),
            toast.notification.kind.title(),
            toast.notification.message
        );
        match toast.notification.kind {
            NotificationKind::Error | NotificationKind::Warning => eprintln!("{line}"),
            NotificationKind::Info | NotificationKind::Success => println!("{line}"),
        }
    }

    fn loading_changed(&self, visible: bool, label: &str) {
        veille_debug!("loading visible={} label={}", visible, label);
        if visible {
            eprintln!("… {label}");
        }
    }
}
