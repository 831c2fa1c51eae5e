//! Per-bookmark recommendations.
//!
//! The pipeline only sees [`RecommendationEngine`]: a batch goes in, one
//! [`Decision`] per bookmark comes out, in order. Engines never fail; they
//! degrade to KEEP. [`LlmRecommender`] is the language-model engine, built
//! on a [`ChatBackend`] ([`OpenRouterClient`](crate::OpenRouterClient) in
//! production).

mod llm;
pub mod parse;
pub mod prompt;

pub use llm::{DEFAULT_MIN_INTERVAL, LlmRecommender};
pub use parse::parse_decisions;
pub use prompt::{PROMPT_FILE_ENV, PromptTemplate};

use crate::error::CompletionError;
use crate::model::{Bookmark, Collection, Decision};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`RecommendationEngine::analyze_batch`].
pub type RecommendFuture<'a> = Pin<Box<dyn Future<Output = Vec<Decision>> + Send + 'a>>;

/// Boxed future returned by [`ChatBackend::complete`].
pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>>;

/// Produces one decision per bookmark.
pub trait RecommendationEngine: Send + Sync {
    /// Recommend an action for each bookmark in `batch`, in the same order.
    ///
    /// `collections` lists every collection (valid move targets);
    /// `current_collection` is the name of the one being cleaned.
    fn analyze_batch<'a>(
        &'a self,
        batch: &'a [Bookmark],
        collections: &'a [Collection],
        current_collection: &'a str,
    ) -> RecommendFuture<'a>;
}

/// A single-prompt text completion service.
pub trait ChatBackend: Send + Sync {
    fn complete<'a>(&'a self, model: &'a str, prompt: &'a str) -> CompletionFuture<'a>;
}
