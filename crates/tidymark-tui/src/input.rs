//! Key handling for the review screen.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Exit};

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) {
    // Ctrl+C always cancels.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.exit = Some(Exit::Cancel);
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.exit = Some(Exit::Cancel),
        KeyCode::Enter => app.exit = Some(Exit::Submit),
        KeyCode::Up | KeyCode::Char('k') => app.cursor_up(),
        KeyCode::Down | KeyCode::Char('j') => app.cursor_down(),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => app.cycle_action(true),
        KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => app.cycle_action(false),
        _ => {}
    }
}
