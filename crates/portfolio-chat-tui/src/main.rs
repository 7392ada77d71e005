use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use portfolio_chat_core::{Announcer, CommandAnnouncer, Config, Hint, HttpChatClient, NullAnnouncer};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

const TICK_RATE: Duration = Duration::from_millis(300);

/// Chat with the portfolio assistant from your terminal.
#[derive(Parser)]
#[command(name = "portfolio-chat", version, about)]
struct Cli {
    /// Chat endpoint URL (overrides PORTFOLIO_CHAT_ENDPOINT and the config file)
    #[arg(long)]
    endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Don't speak the welcome phrase
    #[arg(long)]
    no_speech: bool,

    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective config file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = Config::config_dir().unwrap_or_else(|_| std::env::temp_dir().join("portfolio-chat"));
    let _log_guard = logging::init(&log_dir)?;

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .unwrap_or_else(|e| {
        warn!(error = %e, "unreadable config, using defaults");
        Config::new()
    });
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }

    if cli.init_config {
        if let Some(endpoint) = &cli.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        match &cli.config {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
        info!("config written");
        return Ok(());
    }

    let endpoint = cli.endpoint.clone().unwrap_or_else(|| config.endpoint());
    let client = HttpChatClient::new(&endpoint)
        .with_timeout(config.timeout())
        .with_max_retries(config.max_retries);
    info!(endpoint = %client.endpoint(), "starting chat widget");

    let announcer: Box<dyn Announcer> = if config.speech && !cli.no_speech {
        Box::new(CommandAnnouncer::detect())
    } else {
        Box::new(NullAnnouncer)
    };

    let mut app = App::new(&config, Arc::new(client), announcer);
    app.theme_store = cli.config.clone().or_else(|| Config::get_config_path().ok());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(TICK_RATE);
    events.schedule_hints(Hint::schedule());

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }

        app.poll_reply().await;
    }

    // Stop any speech still playing
    app.close_widget();
    Ok(())
}
