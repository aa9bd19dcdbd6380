//! Terminal front end.
//!
//! The UI thread owns every screen. Backend calls run as tokio tasks and
//! report back over an unbounded channel, tagged with the screen generation
//! that issued them.

mod app;
mod toast;
mod ui;

pub use app::{App, CatalogPane, Screen};
pub use toast::{Toasts, TOAST_TTL};

use std::io;
use std::time::{Duration, Instant};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::info;

use crate::api::ApiClient;
use crate::canvas::load_font;
use crate::config::Settings;
use crate::routes::Route;
use crate::services::{self, Request, Response};

const TICK_RATE: Duration = Duration::from_millis(100);

/// Spawns backend calls and routes their results back to the UI thread.
struct Dispatcher {
    api: ApiClient,
    handle: Handle,
    tx: UnboundedSender<(u64, Response)>,
}

impl Dispatcher {
    fn send(&self, generation: u64, request: Request) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let response = services::execute(&api, request).await;
            // The receiver only goes away when the UI is shutting down.
            let _ = tx.send((generation, response));
        });
    }
}

/// Run the terminal UI until the operator quits. Must be called from a thread
/// that may block, inside a tokio runtime.
pub fn run(settings: &Settings, api: ApiClient, start: Route) -> io::Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher {
        api,
        handle: Handle::current(),
        tx,
    };
    let mut app = App::new(settings, load_font(settings));
    app.navigate(start, Instant::now());

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut app, &dispatcher, rx);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    dispatcher: &Dispatcher,
    mut rx: UnboundedReceiver<(u64, Response)>,
) -> io::Result<()> {
    loop {
        for (generation, request) in app.take_outbox() {
            dispatcher.send(generation, request);
        }

        terminal.draw(|frame| ui::draw(frame, app))?;

        let now = Instant::now();
        if event::poll(app.poll_timeout(now, TICK_RATE))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.on_key(key, Instant::now());
                }
                _ => {}
            }
        }

        while let Ok((generation, response)) = rx.try_recv() {
            app.on_response(generation, response, Instant::now());
        }
        app.tick(Instant::now());

        if app.quit {
            info!("Leaving terminal UI");
            return Ok(());
        }
    }
}
