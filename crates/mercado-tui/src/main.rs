mod app;
mod handler;
mod tui;
mod ui;

use anyhow::Result;
use mercado_core::{LocalStore, Settings};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use tui::EventHandler;

/// The terminal owns stderr, so logs go to a daily file next to the
/// settings. Filter with `MERCADO_LOG` (default `info`).
fn init_logging() -> Result<WorkerGuard> {
    let log_dir = LocalStore::config_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "mercado.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env("MERCADO_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_logging()?;

    let store = LocalStore::open_default()?;
    tracing::info!(path = ?store.path(), "loaded local storage");
    let settings = Settings::load(store);

    let mut app = App::new(settings);
    if !app.settings.has_api_key() {
        app.notify(format!(
            "Sin API key de {}: pulsa K para añadirla ({})",
            app.settings.provider().display_name(),
            app.settings.provider().key_url()
        ));
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    if let Err(e) = &result {
        tracing::error!("exiting with error: {e:#}");
    }
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
