mod action;
mod app;
mod auth;
mod config;
mod error;
mod event;
mod github;
mod merge;
mod source;
mod state;
mod tui;
mod types;
mod ui;

use std::fs::OpenOptions;
use std::panic;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::config::Config;
use crate::event::Event;
use crate::github::GitHub;
use crate::tui::EventHandler;

/// Browse the open issues of a GitHub organization's repository
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Repository to open, as "owner/repo"
    path: Option<String>,

    /// GraphQL endpoint to query
    #[arg(long)]
    endpoint: Option<String>,
}

/// Log to a file under the cache dir since the TUI owns the terminal.
/// Falls back to stderr when the file cannot be opened.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_file = dirs::cache_dir()
        .map(|dir| dir.join("issuedeck"))
        .and_then(|dir| {
            std::fs::create_dir_all(&dir).ok()?;
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("issuedeck.log"))
                .ok()
        });

    match log_file {
        Some(file) => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init(),
        None => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();

    let config = Config::load().with_overrides(cli.path, cli.endpoint)?;
    let token = auth::load_token(&config)?;
    let github = GitHub::new(config.endpoint.clone(), token)?;

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let result = run(github, config.default_path).await;

    tui::restore()?;

    result
}

async fn run(github: GitHub, start_path: String) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = tui::init()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let mut app = App::new(Arc::new(github), start_path, action_tx.clone());

    let render_rate = Duration::from_millis(16);
    let mut events = EventHandler::new(render_rate);

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
