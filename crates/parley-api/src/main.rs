//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, loads configuration, then either migrates the
//! database or starts the REST API server.

mod cli;
mod http;
mod state;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use clap_complete::generate;

use parley_infra::config::{gemini_api_key, load_config, load_dotenv, resolve_data_dir};
use parley_infra::sqlite::pool::{default_database_url, DatabasePool};
use parley_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};
use parley_types::config::AppConfig;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or config
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    // `.env` may carry RUST_LOG, so it is loaded before the subscriber
    let dotenv = load_dotenv();

    init_tracing(filter_for_verbosity(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    match dotenv {
        Ok(Some(path)) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Ok(None) => {}
        Err(err) => tracing::warn!("Failed to load .env: {err}"),
    }

    let data_dir = resolve_data_dir();
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let config = load_config(&data_dir).await;

    let result = run(cli.command, config, &data_dir).await;
    shutdown_tracing();
    result
}

async fn run(command: Commands, config: AppConfig, data_dir: &Path) -> anyhow::Result<()> {
    let database_url = config
        .database_url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir));

    match command {
        Commands::Migrate => {
            let pool = DatabasePool::new(&database_url)
                .await
                .context("failed to migrate database")?;
            pool.close().await;

            println!(
                "  {} Database schema is up to date",
                console::style("✓").green()
            );
        }

        Commands::Serve { port, host } => {
            let state = AppState::init(&database_url, &config.gemini, gemini_api_key())
                .await
                .context("failed to initialize application state")?;

            let host = host.unwrap_or(config.host);
            let port = port.unwrap_or(config.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;

            println!(
                "  {} Parley API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let db_pool = state.db_pool.clone();
            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            db_pool.close().await;
            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
