use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::platform::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(name = "veille", about = "Command-line client for the veille dashboard")]
pub struct Cli {
    /// Scheme and authority of the backend; overrides the config file.
    #[arg(long, global = true, env = "VEILLE_BASE_URL")]
    pub base_url: Option<String>,
    /// RON config file (defaults to ./veille.ron when present).
    #[arg(long, global = true, env = "VEILLE_CONFIG")]
    pub config: Option<PathBuf>,
    /// Directory holding the credential file.
    #[arg(long, global = true, env = "VEILLE_STATE_DIR")]
    pub state_dir: Option<PathBuf>,
    /// Per-request timeout in seconds.
    #[arg(long, global = true, env = "VEILLE_HTTP_TIMEOUT_SECS")]
    pub timeout: Option<u64>,
    /// Basic-auth user presented when no bearer token is sent.
    #[arg(long, global = true, env = "VEILLE_AMBIENT_USER")]
    pub ambient_user: Option<String>,
    #[arg(long, global = true, env = "VEILLE_AMBIENT_PASSWORD", hide_env_values = true)]
    pub ambient_password: Option<String>,
    #[arg(long, global = true, value_enum, default_value_t = LogDestination::File)]
    pub log: LogDestination,
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Exchange email and password for a bearer token.
    Login(LoginArgs),
    Logout,
    /// Show how the backend sees the current caller.
    Whoami,
    /// Run one scraper and wait for its answer.
    Run(RunArgs),
    /// Launch every scraper and follow the job until it ends.
    RunAll,
    /// GET any endpoint under the API root.
    Get(GetArgs),
    Offers(OffersArgs),
    Search(SearchArgs),
    Keywords(KeywordsArgs),
    Sources,
    Stats,
    Status(StatusArgs),
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long, env = "VEILLE_EMAIL", default_value = "")]
    pub email: String,
    #[arg(long, env = "VEILLE_PASSWORD", hide_env_values = true, default_value = "")]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(help = "Scraper key, e.g. indeed")]
    pub key: String,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    #[arg(help = "Endpoint path relative to the API root, e.g. /stats")]
    pub endpoint: String,
}

#[derive(Debug, Args)]
pub struct OffersArgs {
    /// Show a single offer.
    #[arg(long)]
    pub id: Option<u64>,
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Extra query filters as key=value.
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub query: String,
    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Debug, Args)]
pub struct KeywordsArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Add this keyword instead of listing (admin only).
    #[arg(long)]
    pub add: Option<String>,
    #[arg(long, requires = "add", default_value = "general")]
    pub category: String,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Show the AI service status instead of the scheduler's.
    #[arg(long)]
    pub ai: bool,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn offers_filters_parse_as_pairs() {
        let cli = Cli::try_parse_from([
            "veille",
            "offers",
            "--filter",
            "source=indeed",
            "--filter",
            "region=Bretagne",
        ])
        .unwrap();
        match cli.command {
            Command::Offers(args) => assert_eq!(
                args.filters,
                vec![
                    ("source".to_string(), "indeed".to_string()),
                    ("region".to_string(), "Bretagne".to_string()),
                ]
            ),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn malformed_filter_is_rejected() {
        assert!(Cli::try_parse_from(["veille", "offers", "--filter", "=x"]).is_err());
    }

    #[test]
    fn bulk_run_uses_kebab_case() {
        let cli = Cli::try_parse_from(["veille", "run-all", "--log", "terminal"]).unwrap();
        assert!(matches!(cli.command, Command::RunAll));
        assert_eq!(cli.log, LogDestination::Terminal);
    }
}
