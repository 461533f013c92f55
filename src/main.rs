mod app;
mod config;
mod detail_editor;
mod error;
mod logging;
mod model;
mod repository;
mod store;
#[cfg(test)]
mod testing;
mod theme;
mod tree_view;
mod ui;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{Event, EventStream, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, ExecutableCommand};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::app::App;
use crate::config::{Args, Settings};
use crate::repository::HttpMenuRepository;
use crate::store::{Store, StoreMsg};
use crate::theme::Theme;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(&args)?;
    logging::init(&settings.log_file)?;

    if Theme::from_name(&settings.theme).is_none() {
        let known: Vec<&str> = Theme::preset_names().collect();
        warn!(theme = %settings.theme, ?known, "unknown theme, using default");
    }

    let repo = HttpMenuRepository::new(settings.base_url.clone(), settings.request_timeout)
        .context("building HTTP client")?;
    info!(base_url = repo.base_url(), "starting menu admin");
    let (store, rx) = Store::new(Arc::new(repo));
    let mut app = App::new(store, &settings);
    run_app(&mut app, rx).await
}

async fn run_app(app: &mut App, rx: UnboundedReceiver<StoreMsg>) -> Result<()> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let result = event_loop(&mut terminal, app, rx).await;

    restore_terminal(&mut terminal)?;
    info!("menu admin stopped");
    result
}

async fn event_loop<B>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut rx: UnboundedReceiver<StoreMsg>,
) -> Result<()>
where
    B: ratatui::backend::Backend + Write,
{
    let mut events = EventStream::new();
    app.start();
    loop {
        terminal.draw(|frame| ui::render(frame, &*app))?;

        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).context("reading terminal events"),
                None => break,
            },
            Some(msg) = rx.recv() => app.handle_store_msg(msg),
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn restore_terminal<B>(terminal: &mut Terminal<B>) -> Result<()>
where
    B: ratatui::backend::Backend + Write,
{
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
