//! WanderHer relay server
//!
//! Bridges `POST /api/chat` to the AI provider and streams the reply back as
//! `data:` events.

use std::path::PathBuf;

use clap::Parser;
use wanderher_core::Config;

mod error;
mod handlers;
mod logging;
mod routes;
mod server;
mod state;

#[derive(Parser)]
#[command(name = "wanderher-server")]
#[command(about = "Streaming relay between the WanderHer chat client and the AI provider")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not load config, using defaults");
            Config::new()
        }),
    };

    if let Some(host) = cli.host {
        config.host = Some(host);
    }
    if let Some(port) = cli.port {
        config.port = Some(port);
    }

    server::serve(config).await
}
