use std::process::ExitCode;

use clap::Parser;

use livery_app::backend;
use livery_app::cli::{self, Cli, Command, CommandOutput, ErrorReport};
use livery_app::logging;
use livery_core::config::{Settings, StorageBackend, load_config};
use livery_db::db::migrations::run_pending_migrations;
use livery_service::ServiceResult;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let filter_handle = logging::init()?;
    let cli = Cli::parse();

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    logging::apply_level(&filter_handle, &config.logging.level);

    match cli.command {
        Command::Migrate => {
            let applied = migrate(&config).await?;
            println!("{}", serde_json::to_string_pretty(&applied)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Engine(command) => {
            let engine = backend::connect(&config).await?;
            report(cli::run(&engine, &command).await)
        }
    }
}

async fn migrate(config: &Settings) -> anyhow::Result<Vec<String>> {
    match config.database.backend {
        StorageBackend::Memory => {
            tracing::info!("In-memory store has no migrations to apply");
            Ok(Vec::new())
        }
        StorageBackend::Postgres => {
            let applied = run_pending_migrations(backend::database_url(config)?).await?;
            tracing::info!(count = applied.len(), "Migrations applied");
            Ok(applied)
        }
    }
}

fn report(result: ServiceResult<CommandOutput>) -> anyhow::Result<ExitCode> {
    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind(), "Command failed");
            let report = ErrorReport::from(&e);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::from(report.exit_code()))
        }
    }
}
