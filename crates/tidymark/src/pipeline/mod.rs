//! The resumable batch loop.
//!
//! [`CleanupOrchestrator::process`] runs one collection:
//!
//! ```text
//! resume decision
//!   └─ for each page (from the resume cursor)
//!        fetch ── empty ──────────────────────────► done, delete state
//!          │  ── failed ──────────────────────────► checkpoint, Stalled
//!          │  ── nothing unprocessed ─────────────► next page
//!          └─ for each batch of unprocessed bookmarks
//!               recommend → present → confirm → execute → checkpoint
//!               (break suggestion every `break_every` bookmarks)
//!        next page, or the same page again if bookmarks left it
//! ```
//!
//! Every wait on a collaborator races the [`Interrupt`]. Cancellation from
//! any source checkpoints the current page and returns
//! [`CleanupError::Cancelled`]; the durable record stays for `--resume`.

pub mod events;
pub mod execute;

pub use events::{
    CleanupEvent, CompositeEventHandler, EventHandler, FnEventHandler, LoggingHandler,
    NoopHandler,
};
pub use execute::{ExecutionOutcome, align_decisions, normalize_approvals};

use crate::error::{Cancelled, CleanupError};
use crate::interrupt::Interrupt;
use crate::model::{Bookmark, Collection, CollectionId};
use crate::recommend::RecommendationEngine;
use crate::session::{SessionState, SessionStats, StatsDelta};
use crate::source::BookmarkSource;
use crate::ui::{BatchReview, BreakChoice, DecisionPresenter, PlannedAction, Prompter, ResumeOffer};
use execute::{ExecutionTarget, apply_approvals};
use std::future::Future;

// ── Configuration ──────────────────────────────────────────────────

/// Run-wide knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Simulate mutations; statistics update as if they succeeded.
    pub dry_run: bool,
    /// A run stops after `page_limit + 1` fetches, counting every re-fetch
    /// of the same page.
    pub page_limit: u32,
    /// Offer a break each time this many more bookmarks were reviewed.
    /// Zero disables break suggestions.
    pub break_every: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            page_limit: 100,
            break_every: 25,
        }
    }
}

/// One collection to clean.
#[derive(Debug, Clone)]
pub struct CollectionJob {
    pub collection_id: CollectionId,
    pub collection_name: String,
    pub batch_size: usize,
    pub archive_collection_id: Option<CollectionId>,
    /// Move targets and prompt context.
    pub all_collections: Vec<Collection>,
    pub resume_from_state: bool,
}

impl CollectionJob {
    pub fn new(collection_id: CollectionId, collection_name: impl Into<String>) -> Self {
        Self {
            collection_id,
            collection_name: collection_name.into(),
            batch_size: 10,
            archive_collection_id: None,
            all_collections: Vec::new(),
            resume_from_state: true,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_archive(mut self, archive_collection_id: Option<CollectionId>) -> Self {
        self.archive_collection_id = archive_collection_id;
        self
    }

    pub fn with_collections(mut self, collections: Vec<Collection>) -> Self {
        self.all_collections = collections;
        self
    }

    pub fn with_resume(mut self, resume_from_state: bool) -> Self {
        self.resume_from_state = resume_from_state;
        self
    }
}

/// How a run that did not error ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every page was visited; the durable record was deleted.
    Completed {
        processed_this_run: usize,
        total_processed: usize,
    },
    /// The reviewer quit at a break suggestion. State is saved.
    Paused { processed_this_run: usize },
    /// A page could not be fetched. State is saved.
    Stalled { page: u32, error: String },
}

// ── Orchestrator ───────────────────────────────────────────────────

/// Drives one collection through recommend → present → confirm → execute
/// → checkpoint, batch by batch.
pub struct CleanupOrchestrator<'a> {
    source: &'a dyn BookmarkSource,
    engine: &'a dyn RecommendationEngine,
    presenter: &'a dyn DecisionPresenter,
    prompter: &'a dyn Prompter,
    state: SessionState,
    config: OrchestratorConfig,
    events: &'a dyn EventHandler,
    interrupt: Option<&'a Interrupt>,
}

/// Run-local counters.
struct RunProgress {
    processed_this_run: usize,
    batch_number: usize,
    fetches: u32,
}

impl<'a> CleanupOrchestrator<'a> {
    pub fn new(
        source: &'a dyn BookmarkSource,
        engine: &'a dyn RecommendationEngine,
        presenter: &'a dyn DecisionPresenter,
        prompter: &'a dyn Prompter,
        state: SessionState,
        config: OrchestratorConfig,
    ) -> Self {
        let state = state.with_dry_run(config.dry_run);
        Self {
            source,
            engine,
            presenter,
            prompter,
            state,
            config,
            events: &events::NoopHandler,
            interrupt: None,
        }
    }

    pub fn with_event_handler(mut self, handler: &'a dyn EventHandler) -> Self {
        self.events = handler;
        self
    }

    pub fn with_interrupt(mut self, interrupt: &'a Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    pub fn stats(&self) -> &SessionStats {
        self.state.stats()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }

    /// Clean `job`'s collection until it is exhausted, the reviewer stops,
    /// or a fetch fails.
    pub async fn process(&mut self, job: &CollectionJob) -> Result<RunOutcome, CleanupError> {
        let batch_size = job.batch_size.max(1);
        let mut page = self.begin(job).await?;
        let mut progress = RunProgress {
            processed_this_run: 0,
            batch_number: 0,
            fetches: 0,
        };

        loop {
            // `page` never exceeds the fetch count, so this bounds both.
            if progress.fetches > self.config.page_limit {
                self.emit(CleanupEvent::PageLimitReached {
                    limit: self.config.page_limit,
                });
                break;
            }
            progress.fetches += 1;

            let fetched = match self
                .guard(self.source.fetch_page(job.collection_id, page))
                .await
            {
                Err(Cancelled) => return Err(self.interrupted(job, page)),
                Ok(Err(error)) => {
                    self.checkpoint(job, page)?;
                    self.emit(CleanupEvent::FetchFailed { page, error: &error });
                    return Ok(RunOutcome::Stalled {
                        page,
                        error: error.to_string(),
                    });
                }
                Ok(Ok(items)) => items,
            };
            if fetched.is_empty() {
                break;
            }

            let pending: Vec<Bookmark> = fetched
                .iter()
                .filter(|b| !self.state.is_processed(b.id))
                .cloned()
                .collect();
            if pending.is_empty() {
                self.emit(CleanupEvent::PageSkipped {
                    page,
                    fetched: fetched.len(),
                });
                page += 1;
                continue;
            }

            let batches: Vec<&[Bookmark]> = pending.chunks(batch_size).collect();
            self.emit(CleanupEvent::PageStarted {
                page,
                fetched: fetched.len(),
                unprocessed: pending.len(),
                batches: batches.len(),
            });

            let mut removed_on_page = 0;
            for (i, batch) in batches.iter().enumerate() {
                progress.batch_number += 1;
                self.emit(CleanupEvent::BatchStarted {
                    batch: progress.batch_number,
                    page_batch: i + 1,
                    page_batches: batches.len(),
                    size: batch.len(),
                });
                removed_on_page += self
                    .run_batch(job, page, batch, progress.batch_number)
                    .await?;

                let before = progress.processed_this_run;
                progress.processed_this_run += batch.len();
                self.emit(CleanupEvent::Progress {
                    total_processed: self.state.processed_count(),
                    rate_per_min: self.state.rate_per_minute(),
                });

                let more_batches = i + 1 < batches.len();
                if more_batches
                    && crosses_multiple(before, progress.processed_this_run, self.config.break_every)
                    && self.offer_break(job, page, progress.processed_this_run).await?
                        == BreakChoice::Quit
                {
                    return Ok(RunOutcome::Paused {
                        processed_this_run: progress.processed_this_run,
                    });
                }
            }

            if removed_on_page > 0 {
                // Later bookmarks shifted into this page.
                self.emit(CleanupEvent::PageRefetch {
                    page,
                    removed: removed_on_page,
                });
            } else {
                page += 1;
            }
        }

        let state_removed = self.state.complete(job.collection_id, &job.collection_name);
        self.emit(CleanupEvent::Completed {
            processed_this_run: progress.processed_this_run,
            total_processed: self.state.processed_count(),
            state_removed,
        });
        Ok(RunOutcome::Completed {
            processed_this_run: progress.processed_this_run,
            total_processed: self.state.processed_count(),
        })
    }

    /// Load or reset state. Returns the page to start from.
    async fn begin(&mut self, job: &CollectionJob) -> Result<u32, CleanupError> {
        if job.resume_from_state
            && let Some(point) = self.state.load(job.collection_id, &job.collection_name)
        {
            let offer = ResumeOffer {
                collection_name: job.collection_name.clone(),
                current_page: point.current_page,
                processed_count: point.processed_count,
                last_updated: point.last_updated,
                recorded_dry_run: point.dry_run,
                dry_run: self.config.dry_run,
            };
            let resume = match self.guard(self.prompter.confirm_resume(offer)).await {
                Ok(Ok(resume)) => resume,
                _ => return Err(self.interrupted(job, point.current_page)),
            };
            if resume {
                self.emit(CleanupEvent::SessionResumed {
                    collection: &job.collection_name,
                    page: point.current_page,
                    processed: point.processed_count,
                });
                return Ok(point.current_page);
            }
            self.state.reset();
        } else if !job.resume_from_state {
            self.state.reset();
        }
        self.emit(CleanupEvent::FreshStart {
            collection: &job.collection_name,
        });
        Ok(0)
    }

    /// One recommend → present → confirm → execute → checkpoint cycle.
    /// Returns how many bookmarks left the collection.
    async fn run_batch(
        &mut self,
        job: &CollectionJob,
        page: u32,
        batch: &[Bookmark],
        batch_number: usize,
    ) -> Result<usize, CleanupError> {
        self.emit(CleanupEvent::AnalysisStarted {
            batch: batch_number,
            size: batch.len(),
        });
        let decisions = match self
            .guard(
                self.engine
                    .analyze_batch(batch, &job.all_collections, &job.collection_name),
            )
            .await
        {
            Ok(decisions) => align_decisions(decisions, batch.len()),
            Err(Cancelled) => return Err(self.interrupted(job, page)),
        };

        let review = BatchReview {
            bookmarks: batch.to_vec(),
            decisions,
            collection_name: job.collection_name.clone(),
            batch_label: format!("Batch {batch_number}"),
        };
        let approvals = match self.guard(self.presenter.present(review)).await {
            Ok(Ok(approvals)) => normalize_approvals(approvals, batch.len(), self.events),
            _ => return Err(self.interrupted(job, page)),
        };

        if !approvals.is_empty() {
            let planned = approvals
                .iter()
                .map(|a| PlannedAction {
                    title: batch[a.index].title.clone(),
                    action: a.action.clone(),
                })
                .collect();
            if !matches!(
                self.guard(self.prompter.confirm_actions(planned)).await,
                Ok(Ok(()))
            ) {
                return Err(self.interrupted(job, page));
            }
        }

        // From here on the batch is final, whatever the individual results.
        for bookmark in batch {
            self.state.mark_processed(bookmark.id);
        }

        let (delta, removed) = if approvals.is_empty() {
            self.emit(CleanupEvent::BatchSkipped { size: batch.len() });
            let delta = StatsDelta {
                skipped: batch.len() as u64,
                ..Default::default()
            };
            (delta, 0)
        } else {
            self.emit(CleanupEvent::ActionsExecuting {
                count: approvals.len(),
                dry_run: self.config.dry_run,
            });
            let target = ExecutionTarget {
                source: self.source,
                collections: &job.all_collections,
                current_collection_id: job.collection_id,
                archive_collection_id: job.archive_collection_id,
                dry_run: self.config.dry_run,
            };
            let outcome = apply_approvals(&target, batch, &approvals, self.events).await;
            let mut delta = outcome.delta;
            delta.kept += (batch.len() - approvals.len()) as u64;
            (delta, outcome.removed)
        };
        self.state.update_stats(&delta);
        self.checkpoint(job, page)?;
        Ok(removed)
    }

    async fn offer_break(
        &mut self,
        job: &CollectionJob,
        page: u32,
        processed_this_run: usize,
    ) -> Result<BreakChoice, CleanupError> {
        self.emit(CleanupEvent::BreakSuggested { processed_this_run });
        let choice = match self
            .guard(self.prompter.suggest_break(processed_this_run))
            .await
        {
            Ok(Ok(choice)) => choice,
            _ => return Err(self.interrupted(job, page)),
        };
        if choice == BreakChoice::Pause
            && !matches!(self.guard(self.prompter.wait_for_return()).await, Ok(Ok(())))
        {
            return Err(self.interrupted(job, page));
        }
        Ok(choice)
    }

    fn checkpoint(&mut self, job: &CollectionJob, page: u32) -> Result<(), CleanupError> {
        let path = self
            .state
            .checkpoint(job.collection_id, &job.collection_name, page)?;
        self.emit(CleanupEvent::Checkpointed { page, path: &path });
        Ok(())
    }

    /// Checkpoint after a cancellation and produce the error to return.
    fn interrupted(&mut self, job: &CollectionJob, page: u32) -> CleanupError {
        if let Err(e) = self.checkpoint(job, page) {
            return e;
        }
        self.emit(CleanupEvent::Interrupted { page });
        CleanupError::Cancelled
    }

    /// Await `fut` unless the interrupt fires first.
    async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Cancelled> {
        let Some(interrupt) = self.interrupt else {
            return Ok(fut.await);
        };
        if interrupt.is_triggered() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            _ = interrupt.triggered() => Err(Cancelled),
            out = fut => Ok(out),
        }
    }

    fn emit(&self, event: CleanupEvent<'_>) {
        self.events.on_event(&event);
    }
}

/// Whether going from `before` to `after` passes a multiple of `every`.
fn crosses_multiple(before: usize, after: usize, every: usize) -> bool {
    every > 0 && after / every > before / every
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_crossing() {
        assert!(crosses_multiple(20, 30, 25));
        assert!(crosses_multiple(15, 25, 25));
        assert!(!crosses_multiple(25, 30, 25));
        assert!(!crosses_multiple(0, 10, 25));
        assert!(!crosses_multiple(0, 100, 0));
    }

    #[test]
    fn default_config() {
        let config = OrchestratorConfig::default();
        assert!(!config.dry_run);
        assert_eq!(config.page_limit, 100);
        assert_eq!(config.break_every, 25);
    }
}
