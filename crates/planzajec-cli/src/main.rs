//! planzajec CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use planzajec_cli::cli::{Cli, Command, ConfigAction};
use planzajec_cli::commands::{self, Session};
use planzajec_cli::config::ClientConfig;
use planzajec_cli::error::{ClientError, ClientResult};
use planzajec_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let tracing_config = if config.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: failed to initialize logging: {}", e);
    }

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    match run(cli, config, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(hint) = e.hint() {
                eprintln!("{}", hint);
            } else if !e.is_cancelled() {
                error!(error = %e, "Command failed");
                eprintln!("error: {}", e);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn load_config(cli: &Cli) -> ClientResult<ClientConfig> {
    let mut config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    }
    .map_err(ClientError::Config)?;
    config.apply_cli(cli);
    Ok(config)
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        debug!("Interrupted, cancelling upstream requests");
        cancel.cancel();
    }
}

async fn run(cli: Cli, config: ClientConfig, cancel: CancellationToken) -> ClientResult<()> {
    let format = config.export.format;

    let output = match cli.command {
        Command::Config { action } => {
            return match action {
                ConfigAction::Dump => commands::config::dump(&config),
                ConfigAction::Validate => commands::config::validate(&config),
                ConfigAction::Path => commands::config::path(),
            };
        }
        Command::Groupings => {
            let session = Session::from_config(&config, cancel)?;
            commands::groupings::run(&session, format).await?
        }
        Command::Headers {
            schedule_type,
            grouping,
        } => {
            let session = Session::from_config(&config, cancel)?;
            commands::headers::run(&session, schedule_type, &grouping, format).await?
        }
        Command::Schedule {
            schedule_type,
            ids,
            period,
        } => {
            let session = Session::from_config(&config, cancel)?;
            commands::schedule::run(
                &session,
                schedule_type,
                &ids,
                period,
                format,
                &config.export.export_options(),
            )
            .await?
        }
    };

    println!("{}", output);
    Ok(())
}
