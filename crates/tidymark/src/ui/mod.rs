//! Human interaction seams.
//!
//! [`DecisionPresenter`] shows one batch with its recommendations and
//! returns the approved actions. [`Prompter`] covers every other question the
//! pipeline asks: resume, final confirmation, and break suggestions. Either
//! may return [`Cancelled`], which stops the run after a checkpoint.
//!
//! | Implementation | Crate | Use case |
//! |----------------|-------|----------|
//! | [`TextPresenter`] | `tidymark` | line-based review, non-tty stdin |
//! | `TuiPresenter` | `tidymark-tui` | full-screen keyboard review |
//! | [`ConsolePrompter`] | `tidymark` | stdin prompts for everything else |

pub mod text;

pub use text::{ConsolePrompter, TextPresenter};

use crate::error::Cancelled;
use crate::model::{Action, Approval, Bookmark, Decision};
use chrono::NaiveDateTime;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by presenter and prompter methods.
pub type UiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, Cancelled>> + Send + 'a>>;

// ── Batch review ───────────────────────────────────────────────────

/// One batch as shown to the reviewer. `decisions[i]` belongs to
/// `bookmarks[i]`.
#[derive(Debug, Clone)]
pub struct BatchReview {
    pub bookmarks: Vec<Bookmark>,
    pub decisions: Vec<Decision>,
    pub collection_name: String,
    /// e.g. `Batch 3`.
    pub batch_label: String,
}

impl BatchReview {
    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    /// Approve every recommendation accepted by `filter`. KEEP is never
    /// approved.
    pub fn approve_where(&self, filter: impl Fn(&Action) -> bool) -> Vec<Approval> {
        self.decisions
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.action.is_keep() && filter(&d.action))
            .map(|(i, d)| Approval::new(i, d.action.clone()))
            .collect()
    }

    /// Approve every non-KEEP recommendation.
    pub fn approve_all(&self) -> Vec<Approval> {
        self.approve_where(|_| true)
    }
}

/// Shows a batch and returns what the reviewer approved.
///
/// Returned approvals name batch positions; anything not returned stays
/// KEEP. An empty list skips the batch.
pub trait DecisionPresenter: Send + Sync {
    fn present(&self, review: BatchReview) -> UiFuture<'_, Vec<Approval>>;
}

// ── Prompts ────────────────────────────────────────────────────────

/// A saved session the reviewer may continue.
#[derive(Debug, Clone)]
pub struct ResumeOffer {
    pub collection_name: String,
    pub current_page: u32,
    pub processed_count: usize,
    pub last_updated: NaiveDateTime,
    /// The saved session was a dry run.
    pub recorded_dry_run: bool,
    /// This run is a dry run.
    pub dry_run: bool,
}

/// An approved action about to be applied, for the confirmation screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    pub title: String,
    pub action: Action,
}

/// Answer to a break suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakChoice {
    Continue,
    /// Wait for the reviewer, then continue.
    Pause,
    /// Stop now; progress is already saved.
    Quit,
}

/// Every question the pipeline asks besides batch review.
pub trait Prompter: Send + Sync {
    /// `true` to continue the saved session, `false` to start over.
    fn confirm_resume(&self, offer: ResumeOffer) -> UiFuture<'_, bool>;

    /// Last gate before mutating anything. `Err` cancels the run.
    fn confirm_actions(&self, planned: Vec<PlannedAction>) -> UiFuture<'_, ()>;

    fn suggest_break(&self, processed_this_run: usize) -> UiFuture<'_, BreakChoice>;

    /// Block until the reviewer is back from a break.
    fn wait_for_return(&self) -> UiFuture<'_, ()>;
}
