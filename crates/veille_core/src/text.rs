//! User-facing texts shown in toasts and loading labels.

use crate::JobTally;

pub const ALREADY_RUNNING: &str = "Un scraping global est déjà en cours...";
pub const ADMIN_REQUIRED: &str =
    "Connectez-vous en tant qu'administrateur pour lancer le scraping";
pub const ADMIN_ACCESS_REQUIRED: &str = "Accès admin requis";
pub const BULK_LOADING: &str = "Scraping global en cours...";
pub const BULK_FAILED: &str = "Erreur lors du scraping global";
pub const STATUS_UNAVAILABLE: &str = "Scraping: statut indisponible";
pub const SINGLE_LOADING: &str = "Scraping en cours...";
pub const SINGLE_STARTED: &str = "Scraping démarré";
pub const SINGLE_FAILED: &str = "Erreur lors de l'exécution du scraper";
pub const LOGIN_LOADING: &str = "Connexion...";
pub const LOGIN_FIELDS_REQUIRED: &str = "Email et mot de passe requis";
pub const LOGIN_SUCCEEDED: &str = "Connexion réussie";

pub fn job_failed(error: &str) -> String {
    format!("Erreur scraping: {error}")
}

pub fn bulk_summary(tally: JobTally) -> String {
    format!(
        "Scraping terminé: {} succès, {} erreurs. Certaines sources peuvent bloquer (403/404).",
        tally.succeeded, tally.failed
    )
}

pub fn login_rejected(message: &str) -> String {
    format!("Connexion échouée: {message}")
}

pub fn login_transport_failed(message: &str) -> String {
    format!("Erreur de connexion: {message}")
}
