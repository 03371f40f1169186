//! Terminal setup and the main event loop.

use std::io::{self, Stdout};

use anyhow::Result;
use aqualabel_session::Session;
use crossterm::event::{Event, EventStream, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use crate::app::AppState;
use crate::input::handle_key_event;
use crate::render::{draw_ui, raw_text_width};
use crate::worker::InferenceWorker;

type Tui = Terminal<CrosstermBackend<Stdout>>;

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the interactive screen until the user quits.
///
/// The camera is started straight away. The terminal is restored and the
/// camera released even when the loop fails.
pub async fn run(session: Session) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut state = AppState::new(session);

    let result = event_loop(&mut terminal, &mut state).await;

    state.session.shutdown().await;
    if let Err(e) = restore_terminal(&mut terminal) {
        warn!(error = %e, "Failed to restore terminal");
    }
    info!(session_id = %state.session.id(), "TUI closed");
    result
}

async fn event_loop(terminal: &mut Tui, state: &mut AppState) -> Result<()> {
    let (worker, mut completions) = InferenceWorker::channel();
    let mut events = EventStream::new();

    // Failure leaves a notice on screen; the user can retry with c.
    let _ = state.session.start_capture().await;

    while !state.should_quit {
        state.raw_width = raw_text_width(terminal.size()?);
        terminal.draw(|f| draw_ui(f, state))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if let Some(intent) = handle_key_event(key) {
                        state.dispatch(intent, &worker).await;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(completion) = completions.recv() => {
                state.apply_completion(completion);
            }
        }
    }
    Ok(())
}
