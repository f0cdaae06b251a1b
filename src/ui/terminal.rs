use std::io::{self, Stdout};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use tracing::{debug, info};

use crate::api::RecommendationApi;

use super::app::App;
use super::events::{AppEvent, Command};

/// How long to wait for input before redrawing for timers and completions.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Spin up the terminal backend, enter the dispatch loop, and keep processing
/// events until the user quits.
pub fn run_app(app: &mut App, api: Arc<dyn RecommendationApi>) -> Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode().context("failed to enable raw mode")?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;

    let result = event_loop(&mut terminal, app, api);

    cleanup_terminal(&mut terminal)?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    api: Arc<dyn RecommendationApi>,
) -> Result<()> {
    let (tx, rx): (Sender<AppEvent>, Receiver<AppEvent>) = mpsc::channel();
    let size = terminal.size().context("failed to read terminal size")?;
    app.set_viewport(Rect::new(0, 0, size.width, size.height));

    loop {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        let mut pending: Vec<AppEvent> = app
            .unseen_visible_cards()
            .into_iter()
            .map(AppEvent::IntersectionVisible)
            .collect();

        if event::poll(POLL_INTERVAL).context("event polling failed")? {
            if let Some(input) = translate(app, event::read().context("failed to read event")?) {
                pending.push(input);
            }
        }

        pending.extend(rx.try_iter());
        pending.push(AppEvent::Tick(Instant::now()));

        for event in pending {
            for command in app.handle_event(event)? {
                if command == Command::Quit {
                    info!("quit requested");
                    return Ok(());
                }
                spawn_command(Arc::clone(&api), tx.clone(), command);
            }
        }
    }
}

/// Map a raw terminal event onto an app event.
fn translate(app: &App, event: Event) -> Option<AppEvent> {
    match event {
        Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
            if key_event.modifiers.contains(KeyModifiers::CONTROL) {
                return match key_event.code {
                    KeyCode::Char('c') => Some(AppEvent::Quit),
                    KeyCode::Char('t') => Some(AppEvent::ToggleTheme),
                    KeyCode::Char('r') => Some(AppEvent::RandomSearch),
                    _ => None,
                };
            }
            app.map_key(key_event.code)
        }
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(AppEvent::Click {
                column: mouse.column,
                row: mouse.row,
            }),
            MouseEventKind::ScrollDown => Some(AppEvent::Navigate(1)),
            MouseEventKind::ScrollUp => Some(AppEvent::Navigate(-1)),
            _ => None,
        },
        Event::Resize(width, height) => Some(AppEvent::Resize(Rect::new(0, 0, width, height))),
        _ => None,
    }
}

/// Run a command on a worker thread. The worker only holds the API handle and
/// a sender; its result comes back through the channel as an event.
fn spawn_command(api: Arc<dyn RecommendationApi>, tx: Sender<AppEvent>, command: Command) {
    thread::spawn(move || {
        debug!(?command, "running command");
        if let Some(event) = command.execute(api.as_ref()) {
            // The receiver is gone only when the UI has already exited.
            let _ = tx.send(event);
        }
    });
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("failed to leave alternate screen")?;
    terminal
        .show_cursor()
        .context("failed to restore cursor visibility")
}
