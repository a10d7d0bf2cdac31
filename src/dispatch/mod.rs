//! Request dispatcher: cache check, provider call, cache write.
//!
//! Both operations walk the same state machine:
//!
//! ```text
//! Idle ─► CacheCheck ─┬─► CacheHit ─► Done
//!                     └─► CacheMiss ─► ProviderCall ─► CacheWrite ─► Done
//!                              │             │
//!                              └─────────────┴─► Failed
//! ```
//!
//! `answer` never caches and goes `Idle ─► ProviderCall ─► Done | Failed`
//! (or straight to `Failed` when no provider can be selected).
//!
//! Side effects are fixed: one store write on a successful summarize miss,
//! none on a hit, none from `answer`, none on any failure.

mod builder;

pub use builder::{Colloquy, ColloquyBuilder};

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument, warn};

use crate::cache::{SummaryCache, cache_key};
use crate::prompt;
use crate::providers::ProviderSelector;
use crate::render::{ANSWER_ERROR_MESSAGE, PageRenderer, SUMMARY_ERROR_MESSAGE};
use crate::store::KeyValueStore;
use crate::telemetry;
use crate::types::{CredentialSet, RenderEvent};
use crate::{ColloquyError, Result};

/// Where a dispatch currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    CacheCheck,
    CacheHit,
    CacheMiss,
    ProviderCall,
    CacheWrite,
    Done,
    Failed,
}

impl DispatchState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: DispatchState) -> bool {
        use DispatchState::*;
        matches!(
            (self, next),
            (Idle, CacheCheck)
                | (Idle, ProviderCall)
                | (Idle, Failed)
                | (CacheCheck, CacheHit)
                | (CacheCheck, CacheMiss)
                | (CacheHit, Done)
                | (CacheMiss, ProviderCall)
                | (CacheMiss, Failed)
                | (ProviderCall, CacheWrite)
                | (ProviderCall, Done)
                | (ProviderCall, Failed)
                | (CacheWrite, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DispatchState::Done | DispatchState::Failed)
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchState::Idle => "idle",
            DispatchState::CacheCheck => "cache_check",
            DispatchState::CacheHit => "cache_hit",
            DispatchState::CacheMiss => "cache_miss",
            DispatchState::ProviderCall => "provider_call",
            DispatchState::CacheWrite => "cache_write",
            DispatchState::Done => "done",
            DispatchState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks one dispatch through [`DispatchState`], logging each step.
struct Progress {
    operation: &'static str,
    state: DispatchState,
}

impl Progress {
    fn start(operation: &'static str) -> Self {
        Self {
            operation,
            state: DispatchState::Idle,
        }
    }

    fn advance(&mut self, next: DispatchState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal dispatch transition {} -> {next}",
            self.state
        );
        debug!(operation = self.operation, from = %self.state, to = %next, "dispatch transition");
        self.state = next;
    }
}

/// Orchestrates summarize/answer requests.
///
/// One dispatcher per page context. It holds no per-request state, so
/// overlapping calls are allowed; a duplicate trigger simply issues a
/// duplicate provider call.
pub struct Dispatcher {
    store: Arc<dyn KeyValueStore>,
    cache: SummaryCache,
    selector: ProviderSelector,
    renderer: Arc<dyn PageRenderer>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        selector: ProviderSelector,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        Self {
            cache: SummaryCache::new(store.clone()),
            store,
            selector,
            renderer,
        }
    }

    /// The key-value store this dispatcher caches into.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn cache(&self) -> &SummaryCache {
        &self.cache
    }

    pub fn selector(&self) -> &ProviderSelector {
        &self.selector
    }

    pub fn renderer(&self) -> &Arc<dyn PageRenderer> {
        &self.renderer
    }

    /// Summarize a discussion, reusing a cached summary when one exists.
    ///
    /// On a miss the provider's text is stored under
    /// [`cache_key(url, model_id)`](crate::cache::cache_key) and returned
    /// unchanged. A failed cache write is logged and counted but does not
    /// fail the call.
    #[instrument(name = "dispatch.summarize", skip(self, credentials, discussion_text), fields(url = %url, model = %model_id))]
    pub async fn summarize(
        &self,
        url: &str,
        model_id: &str,
        credentials: &CredentialSet,
        discussion_text: &str,
    ) -> Result<String> {
        let mut progress = Progress::start("summarize");
        progress.advance(DispatchState::CacheCheck);

        let key = cache_key(url, model_id);
        if let Some(text) = self.cache.lookup(&key).await {
            progress.advance(DispatchState::CacheHit);
            self.renderer.render(RenderEvent::Summary(text.clone()));
            progress.advance(DispatchState::Done);
            return Ok(text);
        }

        progress.advance(DispatchState::CacheMiss);
        self.renderer.render(RenderEvent::LoadingStart);

        let prompt = prompt::summary_prompt(discussion_text);
        let text = match self
            .generate("summarize", model_id, credentials, &prompt, &mut progress)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                progress.advance(DispatchState::Failed);
                self.render_failure(SUMMARY_ERROR_MESSAGE);
                return Err(e);
            }
        };

        progress.advance(DispatchState::CacheWrite);
        if let Err(e) = self.cache.store(&key, &text).await {
            warn!(error = %e, key = %key, "failed to cache summary");
            metrics::counter!(telemetry::CACHE_WRITE_FAILURES_TOTAL).increment(1);
        }
        progress.advance(DispatchState::Done);

        self.renderer.render(RenderEvent::LoadingEnd);
        self.renderer.render(RenderEvent::Summary(text.clone()));
        Ok(text)
    }

    /// Answer a question about a discussion.
    ///
    /// Always calls the provider; answers are never cached.
    #[instrument(name = "dispatch.answer", skip(self, question, credentials, discussion_text), fields(model = %model_id))]
    pub async fn answer(
        &self,
        question: &str,
        model_id: &str,
        credentials: &CredentialSet,
        discussion_text: &str,
    ) -> Result<String> {
        let mut progress = Progress::start("answer");
        self.renderer.render(RenderEvent::LoadingStart);

        let prompt = prompt::answer_prompt(discussion_text, question);
        match self
            .generate("answer", model_id, credentials, &prompt, &mut progress)
            .await
        {
            Ok(text) => {
                progress.advance(DispatchState::Done);
                self.renderer.render(RenderEvent::LoadingEnd);
                self.renderer.render(RenderEvent::Answer(text.clone()));
                Ok(text)
            }
            Err(e) => {
                progress.advance(DispatchState::Failed);
                self.render_failure(ANSWER_ERROR_MESSAGE);
                Err(e)
            }
        }
    }

    /// Select a provider, submit the prompt, and record request metrics.
    ///
    /// Selection errors are returned as-is; anything that goes wrong once
    /// the provider has been called is a `GenerationFailed`.
    async fn generate(
        &self,
        operation: &'static str,
        model_id: &str,
        credentials: &CredentialSet,
        prompt: &str,
        progress: &mut Progress,
    ) -> Result<String> {
        let provider = self.selector.select(model_id, credentials)?;
        progress.advance(DispatchState::ProviderCall);

        let start = Instant::now();
        let result = match provider.complete(prompt).await {
            Ok(text) if text.trim().is_empty() => Err(ColloquyError::GenerationFailed(
                "provider returned an empty response".into(),
            )),
            Ok(text) => Ok(text),
            Err(e @ ColloquyError::GenerationFailed(_)) => Err(e),
            Err(e) => Err(ColloquyError::GenerationFailed(e.to_string())),
        };
        let elapsed = start.elapsed().as_secs_f64();

        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => provider.name().to_owned(),
            "operation" => operation,
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "provider" => provider.name().to_owned(),
            "operation" => operation,
        )
        .record(elapsed);

        if let Err(ref e) = result {
            warn!(provider = provider.name(), error = %e, "provider call failed");
        }
        result
    }

    fn render_failure(&self, message: &str) {
        self.renderer.render(RenderEvent::LoadingEnd);
        self.renderer.render(RenderEvent::Error(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::DispatchState::*;

    #[test]
    fn hit_path_is_legal() {
        assert!(Idle.can_transition_to(CacheCheck));
        assert!(CacheCheck.can_transition_to(CacheHit));
        assert!(CacheHit.can_transition_to(Done));
    }

    #[test]
    fn miss_path_is_legal() {
        assert!(CacheCheck.can_transition_to(CacheMiss));
        assert!(CacheMiss.can_transition_to(ProviderCall));
        assert!(ProviderCall.can_transition_to(CacheWrite));
        assert!(CacheWrite.can_transition_to(Done));
    }

    #[test]
    fn failure_only_before_cache_write() {
        assert!(ProviderCall.can_transition_to(Failed));
        assert!(CacheMiss.can_transition_to(Failed));
        assert!(!CacheWrite.can_transition_to(Failed));
        assert!(!CacheHit.can_transition_to(Failed));
    }

    #[test]
    fn terminal_states_have_no_successors() {
        for next in [Idle, CacheCheck, CacheHit, CacheMiss, ProviderCall, CacheWrite, Done, Failed] {
            assert!(!Done.can_transition_to(next));
            assert!(!Failed.can_transition_to(next));
        }
        assert!(Done.is_terminal() && Failed.is_terminal());
    }
}
