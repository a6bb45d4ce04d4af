use crate::{
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use commands::Commands;
use connectors::{
    export::ExportDirSource,
    sink::{NullSink, UpsertSink, WebhookSink},
};
use engine_core::{config::JobConfig, retry::RetryPolicy};
use engine_runtime::engine::{EngineOptions, TransferEngine};
use std::{path::Path, sync::Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(name = "syphon", version = "0.1.0", about = "Bulk table transfer tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let code = match run(cli.command).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::Failed
        }
    };
    std::process::exit(code.as_i32());
}

async fn run(command: Commands) -> Result<ExitCode, CliError> {
    match command {
        Commands::Transfer {
            config,
            tables,
            groups,
            workers,
            batch_size,
            dry_run,
            output,
        } => {
            let config = JobConfig::load(Path::new(&config)).await?;
            let workers = workers.unwrap_or(config.defaults.workers);
            let batch_size = batch_size.unwrap_or(config.defaults.batch_size);
            config.validate(workers, batch_size)?;
            let selected = config.select_tables(&tables, &groups)?;

            let source = Arc::new(ExportDirSource::new(
                config.source.export_dir.clone(),
                config.source.page_size,
            ));
            let sink: Arc<dyn UpsertSink> = if dry_run {
                info!("dry run: records will be scanned and decoded but not uploaded");
                Arc::new(NullSink)
            } else {
                let token = config.resolve_token()?;
                Arc::new(WebhookSink::new(
                    config.endpoint.url.clone(),
                    token,
                    config.timeout(),
                )?)
            };

            let coordinator = ShutdownCoordinator::new();
            coordinator.arm();

            let engine = TransferEngine::new(
                source,
                sink,
                config.mappings.clone(),
                RetryPolicy::new(config.defaults.retry_attempts, config.retry_delay()),
                EngineOptions {
                    workers,
                    batch_size,
                    dry_run,
                    stamp_metadata: config.defaults.stamp_source_metadata,
                },
                coordinator.token(),
            );

            let summary = engine.run(&selected).await;
            match output {
                Some(path) => output::write_report(&summary, path).await?,
                None => output::print_report(&summary)?,
            }

            Ok(coordinator.resolve_exit(&summary))
        }
        Commands::Tables { config } => {
            let config = JobConfig::load(Path::new(&config)).await?;
            let listing = serde_json::json!({
                "groups": config.groups,
                "mappings": config
                    .mappings
                    .iter()
                    .map(|(source, destination)| (source.clone(), destination.clone()))
                    .collect::<std::collections::BTreeMap<_, _>>(),
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
            Ok(ExitCode::Clean)
        }
    }
}
