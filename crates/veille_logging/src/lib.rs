#![deny(missing_docs)]
//! Shared logging utilities for the veille workspace.
//!
//! This crate provides the `veille_*` logging macros used by the client and
//! the CLI, a helper that keeps bearer tokens out of log lines, and a minimal
//! test initializer for the global logger.

/// Number of leading token characters kept by [`redact_token`].
const REDACT_KEEP: usize = 4;

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! veille_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! veille_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! veille_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! veille_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! veille_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Shortens a bearer token to a loggable prefix.
///
/// Tokens of four characters or fewer are fully masked.
pub fn redact_token(token: &str) -> String {
    let visible: String = token.chars().take(REDACT_KEEP).collect();
    if token.chars().count() <= REDACT_KEEP {
        "****".to_string()
    } else {
        format!("{visible}…")
    }
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::redact_token;

    #[test]
    fn short_tokens_are_fully_masked() {
        assert_eq!(redact_token(""), "****");
        assert_eq!(redact_token("abcd"), "****");
    }

    #[test]
    fn long_tokens_keep_a_prefix() {
        assert_eq!(redact_token("eyJhbGciOi"), "eyJh…");
    }
}
