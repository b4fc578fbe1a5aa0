mod cli;
mod platform;

use std::process;

use clap::Parser;
use log::LevelFilter;
use veille_logging::veille_error;

use cli::Cli;
use platform::{app, logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(cli.log, level);

    if let Err(err) = app::run(cli).await {
        let message = err.display_message();
        veille_error!("veille exited with an error: {}", message);
        if !err.already_reported() {
            eprintln!("error: {message}");
        }
        process::exit(err.exit_code());
    }
}
