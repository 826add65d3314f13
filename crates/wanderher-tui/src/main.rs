use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use wanderher_core::{Config, RelayClient};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "wanderher")]
#[command(version, about = "Chat with the WanderHer travel assistant from your terminal")]
struct Cli {
    /// Path to the config file (defaults to <config dir>/wanderher/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the relay server
    #[arg(short, long)]
    relay_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The UI still works without a log file; the guard flushes logs on exit
    let (log_dir, _log_guard) = match logging::init() {
        Ok((dir, guard)) => (Some(dir), Some(guard)),
        Err(_) => (None, None),
    };

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not load config, using defaults");
            Config::new()
        }),
    };

    let relay_url = cli.relay_url.unwrap_or_else(|| config.relay_url());
    tracing::info!(relay = %relay_url, log_dir = ?log_dir, "Starting terminal client");

    let mut app = App::new(RelayClient::new(&relay_url));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    let tx = events.sender();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event, &tx),
            None => break,
        }
    }

    Ok(())
}
