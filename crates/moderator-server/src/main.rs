use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod app;
mod routes;
#[cfg(test)]
mod test_support;

use app::{AppBootstrap, StartupOverrides, bootstrap};

#[derive(Parser)]
#[command(name = "stream-moderator")]
#[command(
    about = "Replays chat history through a toxicity classifier and broadcasts the moderated stream",
    long_about = None
)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, overrides `server.bind`
    #[arg(long)]
    bind: Option<String>,

    /// Chat history JSON file, overrides `replay.history_path`
    #[arg(long)]
    history: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[Bootstrap] Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("[Bootstrap] Shutdown requested");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let overrides = StartupOverrides {
        config_path: cli.config,
        bind: cli.bind,
        history_path: cli.history,
    };
    let AppBootstrap { app_state, bind } = bootstrap(&overrides)?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|e| anyhow!("Failed to bind {}: {}", bind, e))?;
    tracing::info!("[Bootstrap] Listening on http://{}", listener.local_addr()?);

    let engine = app_state.engine.clone();
    let shutdown = app_state.shutdown.clone();
    axum::serve(listener, routes::router(app_state))
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    engine.shutdown();
    tracing::info!("[Bootstrap] Server stopped");
    Ok(())
}
