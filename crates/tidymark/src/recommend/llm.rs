//! Language-model recommendation engine.

use super::{ChatBackend, PromptTemplate, RecommendFuture, RecommendationEngine, parse_decisions};
use crate::model::{Bookmark, Collection, Decision};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Minimum spacing between two model calls.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Recommends actions by prompting a chat model and parsing its answer.
///
/// Calls are spaced at least [`DEFAULT_MIN_INTERVAL`] apart. Any backend
/// failure yields KEEP ("API error") for the whole batch.
pub struct LlmRecommender<B> {
    backend: B,
    model: String,
    template: PromptTemplate,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl<B: ChatBackend> LlmRecommender<B> {
    pub fn new(backend: B, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            template: PromptTemplate::default(),
            min_interval: DEFAULT_MIN_INTERVAL,
            last_call: Mutex::new(None),
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Wait until at least `min_interval` has passed since the previous call.
    async fn pace(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let since = prev.elapsed();
            if since < self.min_interval {
                let wait = self.min_interval - since;
                debug!("Rate limit: waiting {:.2}s before next model call", wait.as_secs_f64());
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn analyze(
        &self,
        batch: &[Bookmark],
        collections: &[Collection],
        current_collection: &str,
    ) -> Vec<Decision> {
        if batch.is_empty() {
            return Vec::new();
        }
        self.pace().await;

        let prompt = self.template.render(batch, collections, current_collection);
        match self.backend.complete(&self.model, &prompt).await {
            Ok(answer) => parse_decisions(&answer, batch.len()),
            Err(e) => {
                warn!("Recommendation call failed, keeping the whole batch: {e}");
                vec![Decision::keep("API error"); batch.len()]
            }
        }
    }
}

impl<B: ChatBackend> RecommendationEngine for LlmRecommender<B> {
    fn analyze_batch<'a>(
        &'a self,
        batch: &'a [Bookmark],
        collections: &'a [Collection],
        current_collection: &'a str,
    ) -> RecommendFuture<'a> {
        Box::pin(self.analyze(batch, collections, current_collection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompletionError;
    use crate::model::Action;
    use crate::recommend::CompletionFuture;
    use std::sync::Mutex as StdMutex;

    struct ScriptedBackend {
        answer: Option<String>,
        prompts: StdMutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn answering(answer: &str) -> Self {
            Self {
                answer: Some(answer.to_string()),
                prompts: StdMutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                answer: None,
                prompts: StdMutex::new(Vec::new()),
            }
        }
    }

    impl ChatBackend for ScriptedBackend {
        fn complete<'a>(&'a self, _model: &'a str, prompt: &'a str) -> CompletionFuture<'a> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let result = self.answer.clone().ok_or(CompletionError::Empty);
            Box::pin(async move { result })
        }
    }

    fn batch() -> Vec<Bookmark> {
        vec![Bookmark::new(1, "Old news"), Bookmark::new(2, "Zelda guide")]
    }

    #[tokio::test]
    async fn parses_model_answer() {
        let engine = LlmRecommender::new(
            ScriptedBackend::answering("1. DELETE - stale\n2. MOVE:Gaming - game guide"),
            "test-model",
        );
        let cols = vec![Collection::new(1, "Gaming", 0)];
        let decisions = engine.analyze_batch(&batch(), &cols, "Inbox").await;
        assert_eq!(decisions[0].action, Action::Delete);
        assert_eq!(decisions[1].action, Action::move_to("Gaming"));

        let prompts = engine.backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("[Zelda guide]"));
        assert!(prompts[0].contains("- Gaming (0 items)"));
    }

    #[tokio::test]
    async fn backend_failure_keeps_everything() {
        let engine = LlmRecommender::new(ScriptedBackend::failing(), "test-model");
        let decisions = engine.analyze_batch(&batch(), &[], "Inbox").await;
        assert_eq!(decisions, vec![Decision::keep("API error"); 2]);
    }

    #[tokio::test]
    async fn empty_batch_skips_the_call() {
        let engine = LlmRecommender::new(ScriptedBackend::failing(), "test-model");
        assert!(engine.analyze_batch(&[], &[], "Inbox").await.is_empty());
        assert!(engine.backend.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn consecutive_calls_are_spaced() {
        let engine = LlmRecommender::new(ScriptedBackend::answering("1. KEEP"), "m")
            .with_min_interval(Duration::from_millis(80));
        let one = vec![Bookmark::new(1, "a")];

        let start = Instant::now();
        engine.analyze_batch(&one, &[], "x").await;
        engine.analyze_batch(&one, &[], "x").await;
        assert!(start.elapsed() >= Duration::from_millis(80));
    }
}
