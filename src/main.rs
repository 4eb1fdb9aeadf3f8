use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;

use assistbot::cli::{self, Cli, Commands};
use assistbot::core::{init_logger, log_startup_configuration, metrics, metrics_server, Config};
use assistbot::storage::open_repository;
use assistbot::telegram::{create_bot, schema, setup_bot_commands, skip_pending_updates, HandlerDeps, Router};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (configuration, logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    let config = Arc::new(Config::from_env()?);

    // Initialize logger (console + file)
    init_logger(&config.log_file_path, config.debug)?;

    match cli.command {
        Some(Commands::Run) | None => run_bot(config).await,
        Some(Commands::Migrate) => {
            let repo = open_repository(&config.database).await?;
            log::info!("Schema is up to date ({})", repo.backend());
            Ok(())
        }
        Some(Commands::Stats { json }) => {
            let repo = open_repository(&config.database).await?;
            println!("{}", cli::run_stats(repo.as_ref(), json).await?);
            Ok(())
        }
        Some(Commands::Export { output }) => {
            let repo = open_repository(&config.database).await?;
            let (path, count) = cli::run_export(repo.as_ref(), output.as_deref()).await?;
            println!("Exported {} contacts to {}", count, path.display());
            Ok(())
        }
    }
}

/// Starts long polling and blocks until Ctrl+C
async fn run_bot(config: Arc<Config>) -> Result<()> {
    log::info!("Starting bot...");
    log_startup_configuration(&config);

    // Initialize metrics registry
    metrics::init_metrics();

    let bot = create_bot(&config)?;

    // Set bot commands for the Telegram UI
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let repo = open_repository(&config.database).await?;

    // Start metrics HTTP server if enabled
    if config.metrics_enabled {
        let metrics_port = config.metrics_port;
        log::info!("Starting metrics server on port {}", metrics_port);
        tokio::spawn(async move {
            if let Err(e) = metrics_server::start_metrics_server(metrics_port).await {
                log::error!("Metrics server failed: {}", e);
            }
        });
    } else {
        log::info!("Metrics collection disabled (METRICS_ENABLED=false)");
    }

    let router = Arc::new(Router::new(repo, Arc::clone(&config)));
    let handler = schema(HandlerDeps::new(router));

    // Updates that arrived while the bot was down are not replayed
    if let Err(e) = skip_pending_updates(&bot).await {
        log::warn!("Failed to drop pending updates: {}", e);
    }

    log::info!("✅ Bot started, waiting for updates");

    Dispatcher::builder(bot, handler)
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
