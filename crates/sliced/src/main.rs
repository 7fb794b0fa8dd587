//! sliced — the SliceGrid daemon.
//!
//! Single binary that assembles the SliceGrid subsystems:
//! - State store (redb)
//! - Admission/preemption scheduler
//! - REST API
//!
//! # Usage
//!
//! ```text
//! sliced serve --port 8080 --data-dir /var/lib/slicegrid
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "sliced", about = "SliceGrid scheduling daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server and scheduler in one process.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Data directory for persistent state.
        #[arg(long, default_value = "/var/lib/slicegrid")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sliced=debug,slicegrid=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port, data_dir } => run_serve(port, data_dir).await,
    }
}

async fn run_serve(port: u16, data_dir: PathBuf) -> anyhow::Result<()> {
    info!("SliceGrid daemon starting");

    // Ensure data directory exists.
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("slicegrid.redb");

    let state = slicegrid_state::StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    let router = slicegrid_api::build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
    });

    server.await?;

    info!("SliceGrid daemon stopped");
    Ok(())
}
