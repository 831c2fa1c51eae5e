//! Lifecycle events emitted by the [`CleanupOrchestrator`](super::CleanupOrchestrator).
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | tests, silent runs |
//! | [`LoggingHandler`] | structured logging via `tracing` |
//! | [`FnEventHandler`] | quick closures |
//! | [`CompositeEventHandler`] | several handlers in order |
//! | Custom `impl EventHandler` | terminal progress output, metrics |

use crate::error::SourceError;
use crate::model::Action;
use std::path::Path;
use tracing::{debug, info, warn};

// ── Events ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum CleanupEvent<'a> {
    /// A saved session was accepted; the run continues at `page`.
    SessionResumed {
        collection: &'a str,
        page: u32,
        processed: usize,
    },
    /// No saved session, or the reviewer chose to start over.
    FreshStart { collection: &'a str },
    /// A page had unprocessed bookmarks.
    PageStarted {
        page: u32,
        fetched: usize,
        unprocessed: usize,
        batches: usize,
    },
    /// Every bookmark on the page was already processed.
    PageSkipped { page: u32, fetched: usize },
    /// The page lost bookmarks to deletes or moves and is read again.
    PageRefetch { page: u32, removed: usize },
    BatchStarted {
        /// Counted across the whole run, from 1.
        batch: usize,
        page_batch: usize,
        page_batches: usize,
        size: usize,
    },
    AnalysisStarted { batch: usize, size: usize },
    /// Nothing was approved; every bookmark in the batch counts as skipped.
    BatchSkipped { size: usize },
    /// An approval was dropped before execution.
    SelectionDiscarded { index: usize, reason: &'a str },
    ActionsExecuting { count: usize, dry_run: bool },
    ActionApplied {
        title: &'a str,
        action: &'a Action,
        dry_run: bool,
    },
    ActionFailed {
        title: &'a str,
        action: &'a Action,
        reason: &'a str,
    },
    Checkpointed { page: u32, path: &'a Path },
    Progress {
        total_processed: usize,
        rate_per_min: f64,
    },
    BreakSuggested { processed_this_run: usize },
    /// A page could not be fetched; the run stops with state kept.
    FetchFailed { page: u32, error: &'a SourceError },
    PageLimitReached { limit: u32 },
    /// All pages exhausted.
    Completed {
        processed_this_run: usize,
        total_processed: usize,
        state_removed: bool,
    },
    /// Cancelled by the reviewer or an interrupt, after checkpointing `page`.
    Interrupted { page: u32 },
}

/// Observer for orchestrator events.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &CleanupEvent<'_>) {
        let _ = event;
    }
}

/// Ignores every event.
pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// An event handler backed by a closure.
pub struct FnEventHandler<F>(F)
where
    F: Fn(&CleanupEvent<'_>) + Send + Sync;

impl<F> FnEventHandler<F>
where
    F: Fn(&CleanupEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&CleanupEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &CleanupEvent<'_>) {
        (self.0)(event)
    }
}

/// Dispatches each event to several handlers in registration order.
///
/// ```ignore
/// let handler = CompositeEventHandler::new()
///     .with(LoggingHandler)
///     .with_if(interactive, ConsoleHandler);
/// ```
pub struct CompositeEventHandler {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn with(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn with_if(self, condition: bool, handler: impl EventHandler + 'static) -> Self {
        if condition { self.with(handler) } else { self }
    }
}

impl Default for CompositeEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for CompositeEventHandler {
    fn on_event(&self, event: &CleanupEvent<'_>) {
        for handler in &self.handlers {
            handler.on_event(event);
        }
    }
}

/// Logs events through `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &CleanupEvent<'_>) {
        match event {
            CleanupEvent::SessionResumed {
                collection,
                page,
                processed,
            } => info!("Resuming {collection:?} at page {page} ({processed} processed)"),
            CleanupEvent::FreshStart { collection } => info!("Starting {collection:?} from page 0"),
            CleanupEvent::PageStarted {
                page,
                fetched,
                unprocessed,
                batches,
            } => info!("Page {page}: {unprocessed}/{fetched} unprocessed in {batches} batch(es)"),
            CleanupEvent::PageSkipped { page, fetched } => {
                debug!("Page {page}: all {fetched} bookmarks already processed")
            }
            CleanupEvent::PageRefetch { page, removed } => {
                debug!("Page {page}: {removed} bookmark(s) left the collection, reading it again")
            }
            CleanupEvent::BatchStarted {
                batch,
                page_batch,
                page_batches,
                size,
            } => debug!("Batch {batch} ({page_batch}/{page_batches} on page): {size} bookmarks"),
            CleanupEvent::AnalysisStarted { batch, size } => {
                debug!("Requesting recommendations for batch {batch} ({size} bookmarks)")
            }
            CleanupEvent::BatchSkipped { size } => info!("Batch skipped ({size} bookmarks)"),
            CleanupEvent::SelectionDiscarded { index, reason } => {
                warn!("Discarding approval for item {index}: {reason}")
            }
            CleanupEvent::ActionsExecuting { count, dry_run } => {
                info!("Executing {count} action(s){}", if *dry_run { " (dry run)" } else { "" })
            }
            CleanupEvent::ActionApplied {
                title,
                action,
                dry_run,
            } => info!(
                "{}{action}: {title}",
                if *dry_run { "[dry run] " } else { "" }
            ),
            CleanupEvent::ActionFailed {
                title,
                action,
                reason,
            } => warn!("{action} failed for {title:?}: {reason}"),
            CleanupEvent::Checkpointed { page, path } => {
                debug!("Checkpoint at page {page}: {}", path.display())
            }
            CleanupEvent::Progress {
                total_processed,
                rate_per_min,
            } => info!("Progress: {total_processed} processed ({rate_per_min:.1}/min)"),
            CleanupEvent::BreakSuggested { processed_this_run } => {
                debug!("Suggesting a break after {processed_this_run} bookmarks")
            }
            CleanupEvent::FetchFailed { page, error } => {
                warn!("Could not fetch page {page}: {error}; progress saved")
            }
            CleanupEvent::PageLimitReached { limit } => {
                warn!("Stopped at the page limit ({limit})")
            }
            CleanupEvent::Completed {
                processed_this_run,
                total_processed,
                state_removed,
            } => info!(
                "Collection done: {processed_this_run} this run, {total_processed} total (state removed: {state_removed})"
            ),
            CleanupEvent::Interrupted { page } => info!("Interrupted; progress saved at page {page}"),
        }
    }
}
