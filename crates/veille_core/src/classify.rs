use crate::{text, Notification};

/// Substrings that mark an authentication rejection as a stale bearer token.
///
/// Matching is case-insensitive against the backend's human-readable message.
/// The backend exposes no structured error code, so this list is the whole
/// policy.
pub const TOKEN_PATTERNS: [&str; 3] = ["token", "non authent", "session"];

const ADMIN_PATTERNS: [&str; 3] = ["session expirée", "401", "permission"];

/// Whether an authentication-rejected message points at the bearer token.
pub fn is_token_problem(message: &str) -> bool {
    let lowered = message.to_lowercase();
    TOKEN_PATTERNS
        .iter()
        .any(|pattern| lowered.contains(pattern))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The caller must log in as an administrator.
    AdminRequired,
    Generic,
}

impl FailureClass {
    /// The toast shown for this class; `generic` is the operation's own text.
    pub fn notification(self, generic: &str) -> Notification {
        match self {
            FailureClass::AdminRequired => Notification::warning(text::ADMIN_REQUIRED),
            FailureClass::Generic => Notification::error(generic),
        }
    }
}

pub fn classify_failure(status: Option<u16>, message: &str) -> FailureClass {
    if matches!(status, Some(401 | 403)) {
        return FailureClass::AdminRequired;
    }
    let lowered = message.to_lowercase();
    if ADMIN_PATTERNS.iter().any(|pattern| lowered.contains(pattern)) {
        FailureClass::AdminRequired
    } else {
        FailureClass::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_patterns_match_backend_messages() {
        assert!(is_token_problem("Token invalide"));
        assert!(is_token_problem("Token expiré"));
        assert!(is_token_problem("Non authentifié"));
        assert!(is_token_problem("SESSION perdue"));
        assert!(!is_token_problem("Identifiants invalides"));
        assert!(!is_token_problem(""));
    }

    #[test]
    fn status_alone_marks_admin_required() {
        assert_eq!(classify_failure(Some(403), "Accès admin requis"), FailureClass::AdminRequired);
        assert_eq!(classify_failure(Some(401), ""), FailureClass::AdminRequired);
    }

    #[test]
    fn message_patterns_mark_admin_required() {
        assert_eq!(classify_failure(None, "Session expirée"), FailureClass::AdminRequired);
        assert_eq!(classify_failure(Some(500), "Erreur 401"), FailureClass::AdminRequired);
        assert_eq!(classify_failure(None, "no Permission"), FailureClass::AdminRequired);
        assert_eq!(classify_failure(Some(500), "boom"), FailureClass::Generic);
    }
}
