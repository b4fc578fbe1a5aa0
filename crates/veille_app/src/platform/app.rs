use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use serde_json::{json, Value};
use veille_client::{
    AmbientCredentials, ApiError, AuthMode, CallOptions, Coordinator, Dashboard, Navigation,
    ReqwestTransport, RequestClient, SupervisionOutcome, SupervisorError, TokioSleeper,
    TransportSettings,
};
use veille_core::Notification;
use veille_logging::{veille_info, veille_warn};

use super::console::ConsoleSink;
use super::persistence::{load_config, AppConfig, FileCredentialStore, DEFAULT_CONFIG_FILENAME};
use crate::cli::{Cli, Command, KeywordsArgs, OffersArgs};

#[derive(Debug)]
pub enum CliError {
    Validation(String),
    Failure(anyhow::Error),
    /// Already shown to the user as a toast.
    Reported(anyhow::Error),
}

pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    fn reported(error: impl Into<anyhow::Error>) -> Self {
        Self::Reported(error.into())
    }

    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) | Self::Reported(_) => 3,
        }
    }

    pub fn already_reported(&self) -> bool {
        matches!(self, Self::Reported(_))
    }

    pub fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) | Self::Reported(error) => format!("{error:#}"),
        }
    }
}

pub async fn run(cli: Cli) -> CliResult<()> {
    let config = resolve_config(&cli)?;
    let settings = TransportSettings {
        connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        request_timeout: Duration::from_secs(config.request_timeout_secs),
        ambient: ambient_credentials(&cli)?,
    };
    let transport = ReqwestTransport::new(settings).map_err(CliError::failure)?;
    let store = FileCredentialStore::new(config.state_dir.clone());
    veille_info!("Backend {} (credentials in {:?})", config.base_url, store.path());

    let client = Arc::new(RequestClient::new(
        config.client_config(),
        Arc::new(transport),
        Arc::new(store),
    ));
    let coordinator = Arc::new(Coordinator::new(Arc::new(ConsoleSink)));
    let dashboard = Dashboard::new(
        client,
        coordinator,
        Arc::new(TokioSleeper),
        config.poll_policy(),
    );

    dispatch(&dashboard, cli.command).await
}

/// Config file first, then flags and env vars on top.
fn resolve_config(cli: &Cli) -> CliResult<AppConfig> {
    let (path, explicit) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILENAME), false),
    };
    let mut config = load_config(&path, explicit).map_err(CliError::failure)?;

    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(state_dir) = &cli.state_dir {
        config.state_dir = state_dir.clone();
    }
    if let Some(timeout) = cli.timeout {
        if timeout == 0 {
            return Err(CliError::validation("--timeout must be at least 1 second"));
        }
        config.request_timeout_secs = timeout;
    }
    if config.poll_ceiling == 0 {
        return Err(CliError::validation("poll_ceiling must be at least 1"));
    }
    Ok(config)
}

fn ambient_credentials(cli: &Cli) -> CliResult<Option<AmbientCredentials>> {
    match (&cli.ambient_user, &cli.ambient_password) {
        (Some(username), Some(password)) => Ok(Some(AmbientCredentials {
            username: username.clone(),
            password: password.clone(),
        })),
        (None, None) => Ok(None),
        _ => Err(CliError::validation(
            "--ambient-user and --ambient-password go together",
        )),
    }
}

async fn dispatch(dashboard: &Dashboard, command: Command) -> CliResult<()> {
    let client = dashboard.client();
    match command {
        Command::Login(args) => match dashboard.login(&args.email, &args.password).await {
            Ok(Navigation::Redirect(path)) => {
                veille_info!("Login done, next page {}", path);
                Ok(())
            }
            Err(err @ ApiError::MissingInput(_)) => Err(CliError::Validation(err.to_string())),
            Err(err) => Err(CliError::reported(err)),
        },
        Command::Logout => {
            let Navigation::Redirect(path) = dashboard.logout();
            veille_info!("Logged out, next page {}", path);
            Ok(())
        }
        Command::Whoami => {
            let session = dashboard.resolve_session().await;
            let mode = match session.mode {
                AuthMode::Bearer => "bearer",
                AuthMode::Ambient => "ambient",
                AuthMode::Anonymous => "anonymous",
            };
            let profile = session.profile.map(|profile| profile.raw);
            print_json(&json!({ "mode": mode, "profile": profile }))
        }
        Command::Run(args) => {
            let body = dashboard
                .run_one(&args.key)
                .await
                .map_err(CliError::reported)?;
            print_json(&body)
        }
        Command::RunAll => report_bulk(dashboard.run_all().await),
        Command::Get(args) => {
            fetch(dashboard, client.call(&args.endpoint, CallOptions::get())).await
        }
        Command::Offers(args) => offers(dashboard, args).await,
        Command::Search(args) => {
            fetch(dashboard, client.search_offers(&args.query, args.page)).await
        }
        Command::Keywords(args) => keywords(dashboard, args).await,
        Command::Sources => fetch(dashboard, client.list_sources()).await,
        Command::Stats => fetch(dashboard, client.stats()).await,
        Command::Status(args) if args.ai => fetch(dashboard, client.ai_status()).await,
        Command::Status(_) => fetch(dashboard, client.scheduler_status()).await,
    }
}

async fn offers(dashboard: &Dashboard, args: OffersArgs) -> CliResult<()> {
    let client = dashboard.client();
    if let Some(id) = args.id {
        return fetch(dashboard, client.offer(id)).await;
    }
    let filters: Vec<(&str, &str)> = args
        .filters
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    fetch(dashboard, client.list_offers(args.page, &filters)).await
}

async fn keywords(dashboard: &Dashboard, args: KeywordsArgs) -> CliResult<()> {
    let client = dashboard.client();
    match &args.add {
        Some(word) => fetch(dashboard, client.add_keyword(word, &args.category)).await,
        None => fetch(dashboard, client.list_keywords(args.page)).await,
    }
}

/// Runs a read call under the loading indicator and prints its body.
async fn fetch<F>(dashboard: &Dashboard, call: F) -> CliResult<()>
where
    F: Future<Output = Result<Value, ApiError>>,
{
    let coordinator = dashboard.coordinator();
    match coordinator.with_span(None, call).await {
        Ok(body) => print_json(&body),
        Err(err) => {
            coordinator.notify(Notification::error(err.to_string()));
            Err(CliError::reported(err))
        }
    }
}

fn report_bulk(result: Result<SupervisionOutcome, SupervisorError>) -> CliResult<()> {
    match result.map_err(CliError::reported)? {
        SupervisionOutcome::Completed { job, tally } => {
            veille_info!("Bulk job done: {} ok, {} failed", tally.succeeded, tally.failed);
            print_json(job.result.as_ref().unwrap_or(&Value::Null))
        }
        SupervisionOutcome::TimedOut {
            launch_response, ..
        } => {
            veille_warn!("Bulk job still running when polling stopped");
            print_json(&launch_response)
        }
        SupervisionOutcome::JobFailed { error, .. } => {
            Err(CliError::reported(anyhow!("bulk job failed: {error}")))
        }
        SupervisionOutcome::AlreadyRunning => {
            Err(CliError::reported(anyhow!("a bulk job is already running")))
        }
    }
}

fn print_json(value: &Value) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(CliError::failure)?;
    println!("{text}");
    Ok(())
}
