//! gathercal CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use gathercal_client::cli::{Cli, Command, ConfigAction};
use gathercal_client::commands;
use gathercal_client::config::ClientConfig;
use gathercal_client::error::ClientResult;
use gathercal_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let loaded = load_config(&cli);

    let debug = cli.debug || loaded.as_ref().is_ok_and(|config| config.debug);
    let tracing = if debug {
        TracingConfig::cli_debug()
    } else if matches!(cli.command, Command::Serve) {
        TracingConfig::daemon()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    let result = match loaded {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> ClientResult<ClientConfig> {
    match cli.config {
        Some(ref path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    }
}

async fn run(cli: Cli, config: ClientConfig) -> ClientResult<()> {
    match cli.command {
        Command::Occurrences { rule, from, to } => commands::occurrences::run(&rule, from, to),
        Command::Expand { today } => commands::expand::run(&config, today).await,
        Command::Calendar { today, week, json } => {
            commands::calendar::run(&config, today, week, json).await
        }
        Command::Serve => commands::serve::run(&config).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, cli.config.as_deref()),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(cli.config.as_deref()),
        },
    }
}
