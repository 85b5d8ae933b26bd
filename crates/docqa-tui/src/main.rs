use anyhow::{Context, Result};
use docqa_core::{ApiClient, Config};
use tracing::info;

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let _log_guard = logging::init_tracing(config.log_level())?;

    // Resolved once and injected; nothing reads the environment after this
    let base_url = config.resolve_base_url();
    info!(%base_url, version = env!("CARGO_PKG_VERSION"), "starting docqa");

    let mut app = App::new(ApiClient::new(&base_url));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    info!("docqa exited");
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }

        app.poll_tasks().await;
    }
    Ok(())
}
