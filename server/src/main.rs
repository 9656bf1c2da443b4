use anyhow::Context;
use clap::Parser;
use minesweeper_server::{config::Args, server::GameServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("🚀 Starting Minesweeper multiplayer server");

    let board = args
        .board_source()?
        .build()
        .context("failed to set up the board")?;

    let server = GameServer::bind(args.address(), board)
        .await
        .with_context(|| format!("failed to bind {}", args.address()))?;

    info!("📡 Accepting players on {}", server.local_addr()?);

    tokio::select! {
        result = server.serve() => result.context("accept loop stopped")?,
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
    }

    Ok(())
}
