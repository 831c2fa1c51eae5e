//! Full-screen batch review for tidymark, powered by ratatui + crossterm.
//!
//! [`TuiPresenter`] implements [`DecisionPresenter`]: each batch opens a
//! keyboard-driven list where every bookmark starts on its recommended
//! action and can be switched between KEEP, DELETE, and the suggested MOVE
//! or ARCHIVE. Enter applies every non-KEEP pick; `q`, Esc or Ctrl+C
//! cancels the run (after the pipeline checkpoints). A triggered
//! [`Interrupt`] closes the screen the same way; await
//! [`TuiPresenter::closed`] before writing to the terminal again.
//!
//! ```ignore
//! use tidymark_tui::TuiPresenter;
//!
//! let presenter = TuiPresenter::default().with_interrupt(interrupt.clone());
//! let orchestrator = CleanupOrchestrator::new(
//!     &source, &engine, &presenter, &ConsolePrompter, state, config,
//! );
//! ```

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{cursor, execute};
use ratatui::prelude::*;
use tokio::sync::Mutex;
use tidymark::error::Cancelled;
use tidymark::interrupt::Interrupt;
use tidymark::model::Approval;
use tidymark::ui::{BatchReview, DecisionPresenter, UiFuture};
use tracing::{debug, warn};

mod app;
mod input;
mod render;

pub use render::action_style;

use app::{App, Exit};
use input::handle_key_event;
use render::render;

/// Configuration for the review screen.
#[derive(Debug, Clone)]
pub struct TuiConfig {
    /// How long to wait for a key before redrawing.
    pub poll_interval: Duration,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Keyboard-driven [`DecisionPresenter`].
#[derive(Debug, Clone, Default)]
pub struct TuiPresenter {
    config: TuiConfig,
    interrupt: Interrupt,
    /// Held by the blocking review loop for as long as the terminal is in
    /// raw mode.
    screen: Arc<Mutex<()>>,
}

impl TuiPresenter {
    pub fn new(config: TuiConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Close any open review screen when `interrupt` fires.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Resolves once no review screen is open and the terminal is restored.
    pub async fn closed(&self) {
        let _screen = self.screen.lock().await;
    }
}

impl DecisionPresenter for TuiPresenter {
    fn present(&self, review: BatchReview) -> UiFuture<'_, Vec<Approval>> {
        let config = self.config.clone();
        let interrupt = self.interrupt.clone();
        let screen = Arc::clone(&self.screen);
        Box::pin(async move {
            let held = screen.lock_owned().await;
            let outcome = tokio::task::spawn_blocking(move || {
                let outcome = run_review(review, &config, &interrupt);
                drop(held);
                outcome
            })
            .await
            .map_err(|_| Cancelled)?;
            match outcome {
                Ok(Some(approvals)) => Ok(approvals),
                Ok(None) => Err(Cancelled),
                Err(e) => {
                    warn!("Review screen failed: {e}");
                    Err(Cancelled)
                }
            }
        })
    }
}

/// Restores the terminal when dropped, on success and on error.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
    }
}

/// Run the review screen for one batch (blocking).
///
/// Returns the approvals on Enter and `None` when the reviewer cancelled or
/// `interrupt` fired.
pub fn run_review(
    review: BatchReview,
    config: &TuiConfig,
    interrupt: &Interrupt,
) -> io::Result<Option<Vec<Approval>>> {
    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    let mut app = App::new(&review);

    loop {
        app.observe_interrupt(interrupt);
        match app.exit {
            Some(Exit::Submit) => {
                let approvals = app.approvals();
                debug!("Review submitted with {} approvals", approvals.len());
                return Ok(Some(approvals));
            }
            Some(Exit::Cancel) => return Ok(None),
            None => {}
        }

        terminal.draw(|frame| render(frame, &review, &mut app))?;

        if event::poll(config.poll_interval)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            handle_key_event(key, &mut app);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tui_config_default() {
        let config = TuiConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn closed_waits_for_the_open_screen() {
        let presenter = TuiPresenter::default();
        presenter.closed().await;

        let held = Arc::clone(&presenter.screen).lock_owned().await;
        let closed = presenter.closed();
        tokio::pin!(closed);
        assert!(
            tokio::time::timeout(Duration::from_millis(20), &mut closed)
                .await
                .is_err()
        );
        drop(held);
        tokio::time::timeout(Duration::from_secs(1), closed)
            .await
            .unwrap();
    }
}
