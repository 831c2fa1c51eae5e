//! Convenience re-exports for common `tidymark` types.
//!
//! ```ignore
//! use tidymark::prelude::*;
//! ```
//!
//! Covers wiring an orchestrator end to end: the production collaborators,
//! the collaborator traits, session state, and event handlers. Wire-level
//! and parsing helpers stay in their modules.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::error::{Cancelled, CleanupError, CompletionError, SourceError, StateError};
pub use crate::interrupt::Interrupt;
pub use crate::model::{
    Action, Approval, Bookmark, BookmarkId, Collection, CollectionId, Decision,
    find_collection_by_name,
};
pub use crate::{DEFAULT_MODEL, OpenRouterClient};

// ── Pipeline ────────────────────────────────────────────────────────
pub use crate::pipeline::{
    CleanupEvent, CleanupOrchestrator, CollectionJob, CompositeEventHandler, EventHandler,
    FnEventHandler, LoggingHandler, NoopHandler, OrchestratorConfig, RunOutcome,
};

// ── Collaborators ───────────────────────────────────────────────────
pub use crate::recommend::{ChatBackend, LlmRecommender, PromptTemplate, RecommendationEngine};
pub use crate::source::{BookmarkSource, RaindropClient};
pub use crate::ui::{
    BatchReview, BreakChoice, ConsolePrompter, DecisionPresenter, PlannedAction, Prompter,
    ResumeOffer, TextPresenter,
};

// ── Session ─────────────────────────────────────────────────────────
pub use crate::session::{SessionState, SessionStats, SessionStore, SessionSummary};
