mod api_service;
mod app;
mod card;
mod config;
mod form;
mod journal_api;
mod journal_entry;
mod journal_state;
#[cfg(test)]
mod testing;
mod ui;

use api_service::ResilientFetch;
use app::App;
use color_eyre::eyre::{Result, WrapErr};
use config::Config;
use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use journal_api::JournalApi;
use std::{fs::File, sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ui::Tui;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::from_env()?;
    init_logging(&config)?;
    info!(api_url = %config.api_url, "starting simple_journal v{}", env!("CARGO_PKG_VERSION"));

    let fetch = ResilientFetch::over_http().wrap_err("failed to build HTTP client")?;
    let api = JournalApi::new(&config.api_url, fetch);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut app = App::new(api, tx);
    app.start_load();

    let mut tui = Tui::new()?;
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(200));

    while !app.should_quit() {
        tui.draw(&app)?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).wrap_err("failed to read terminal event"),
                None => break,
            },
            Some(outcome) = rx.recv() => app.apply(outcome),
            _ = ticker.tick() => app.tick(std::time::Instant::now()),
        }
    }

    info!("shutting down");
    Ok(())
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(config: &Config) -> Result<()> {
    let file = File::create(&config.log_file)
        .wrap_err_with(|| format!("failed to create log file {}", config.log_file.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), config.log_level))
        }))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
        .init();

    Ok(())
}
