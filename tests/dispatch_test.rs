//! Dispatcher behaviour: cache hits, misses, failures and side effects.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use colloquy::providers::ProviderFactory;
use colloquy::store::keys;
use colloquy::{
    Colloquy, ColloquyError, CredentialSet, Dispatcher, KeyValueStore, MemoryStore,
    ProviderConfig, ProviderKind, RecordingRenderer, RenderEvent, Result, TextProvider,
    cache_key,
};

const URL: &str = "https://news.ycombinator.com/item?id=42";
const CLAUDE: &str = "claude-3-haiku-20240307";
const GPT: &str = "gpt-4o";

// ============================================================================
// Test doubles
// ============================================================================

/// Store that counts writes and can be told to reject them.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    sets: AtomicUsize,
    fail_sets: AtomicBool,
}

impl CountingStore {
    fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        self.inner.get(keys).await
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(ColloquyError::Storage("disk full".into()));
        }
        self.inner.set(items).await
    }
}

/// Provider that returns a canned reply and counts calls.
struct MockProvider {
    config: ProviderConfig,
    reply: std::result::Result<String, String>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TextProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.config.kind
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .map_err(ColloquyError::GenerationFailed)
    }
}

type Reply = std::result::Result<&'static str, &'static str>;

fn factory(reply: Reply, calls: Arc<AtomicUsize>) -> ProviderFactory {
    Arc::new(move |config: ProviderConfig| -> Arc<dyn TextProvider> {
        Arc::new(MockProvider {
            config,
            reply: reply.map(str::to_string).map_err(str::to_string),
            calls: calls.clone(),
        })
    })
}

struct Harness {
    dispatcher: Dispatcher,
    store: Arc<CountingStore>,
    renderer: Arc<RecordingRenderer>,
    calls: Arc<AtomicUsize>,
}

fn harness(reply: Reply) -> Harness {
    let store = Arc::new(CountingStore::default());
    let renderer = Arc::new(RecordingRenderer::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let factory = factory(reply, calls.clone());

    let dispatcher = Colloquy::builder()
        .without_default_providers()
        .provider("claude-", ProviderKind::Anthropic, factory.clone())
        .provider("gpt-", ProviderKind::OpenAi, factory)
        .store(store.clone())
        .renderer(renderer.clone())
        .build()
        .unwrap();

    Harness {
        dispatcher,
        store,
        renderer,
        calls,
    }
}

fn anthropic_key() -> CredentialSet {
    CredentialSet::new().with(ProviderKind::Anthropic, "sk-ant-test")
}

async fn cached_entries(store: &dyn KeyValueStore) -> Map<String, Value> {
    store
        .get(&[keys::SUMMARY_CACHE])
        .await
        .unwrap()
        .remove(keys::SUMMARY_CACHE)
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_default()
}

// ============================================================================
// summarize
// ============================================================================

#[tokio::test]
async fn cache_hit_skips_provider_and_store_write() {
    let h = harness(Ok("<ul><li>fresh</li></ul>"));
    h.store
        .inner
        .set(
            [(
                keys::SUMMARY_CACHE.to_string(),
                json!({ (cache_key(URL, CLAUDE)): "<ul><li>A</li></ul>" }),
            )]
            .into_iter()
            .collect(),
        )
        .await
        .unwrap();

    let text = h
        .dispatcher
        .summarize(URL, CLAUDE, &anthropic_key(), "thread text")
        .await
        .unwrap();

    assert_eq!(text, "<ul><li>A</li></ul>");
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.store.set_count(), 0);
    assert_eq!(
        h.renderer.events(),
        vec![RenderEvent::Summary("<ul><li>A</li></ul>".into())]
    );
}

#[tokio::test]
async fn cache_miss_calls_provider_once_and_stores_result() {
    let h = harness(Ok("<ol><li>B</li></ol>"));

    let text = h
        .dispatcher
        .summarize(URL, CLAUDE, &anthropic_key(), "thread text")
        .await
        .unwrap();

    assert_eq!(text, "<ol><li>B</li></ol>");
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.set_count(), 1);

    let entries = cached_entries(h.store.as_ref()).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[&cache_key(URL, CLAUDE)], json!("<ol><li>B</li></ol>"));

    assert_eq!(
        h.renderer.events(),
        vec![
            RenderEvent::LoadingStart,
            RenderEvent::LoadingEnd,
            RenderEvent::Summary("<ol><li>B</li></ol>".into()),
        ]
    );
}

#[tokio::test]
async fn second_summarize_is_served_from_cache() {
    let h = harness(Ok("summary"));
    let creds = anthropic_key();

    let first = h.dispatcher.summarize(URL, CLAUDE, &creds, "t").await.unwrap();
    let second = h.dispatcher.summarize(URL, CLAUDE, &creds, "t").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.set_count(), 1);
}

#[tokio::test]
async fn different_model_misses_the_cache() {
    let h = harness(Ok("summary"));
    let creds = anthropic_key().with(ProviderKind::OpenAi, "sk-openai");

    h.dispatcher.summarize(URL, CLAUDE, &creds, "t").await.unwrap();
    h.dispatcher.summarize(URL, GPT, &creds, "t").await.unwrap();

    assert_eq!(h.calls.load(Ordering::SeqCst), 2);
    assert_eq!(cached_entries(h.store.as_ref()).await.len(), 2);
}

#[tokio::test]
async fn missing_credential_fails_without_provider_call_or_write() {
    let h = harness(Ok("unused"));

    let err = h
        .dispatcher
        .summarize(URL, GPT, &anthropic_key(), "t")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ColloquyError::MissingCredential {
            provider: ProviderKind::OpenAi
        }
    ));
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.store.set_count(), 0);
    assert_eq!(
        h.renderer.events().last(),
        Some(&RenderEvent::Error(
            "An error occurred while summarizing the discussion.".into()
        ))
    );
}

#[tokio::test]
async fn unsupported_model_fails_before_any_call() {
    let h = harness(Ok("unused"));

    let err = h
        .dispatcher
        .summarize(URL, "llama-3", &anthropic_key(), "t")
        .await
        .unwrap_err();

    assert!(matches!(err, ColloquyError::UnsupportedModel(ref m) if m == "llama-3"));
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.store.set_count(), 0);
}

#[tokio::test]
async fn provider_failure_writes_nothing() {
    let h = harness(Err("rate limited"));

    let err = h
        .dispatcher
        .summarize(URL, CLAUDE, &anthropic_key(), "t")
        .await
        .unwrap_err();

    assert!(matches!(err, ColloquyError::GenerationFailed(_)));
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.set_count(), 0);
    assert_eq!(
        h.renderer.events(),
        vec![
            RenderEvent::LoadingStart,
            RenderEvent::LoadingEnd,
            RenderEvent::Error("An error occurred while summarizing the discussion.".into()),
        ]
    );
}

#[tokio::test]
async fn empty_provider_output_is_a_generation_failure() {
    let h = harness(Ok("   \n"));

    let err = h
        .dispatcher
        .summarize(URL, CLAUDE, &anthropic_key(), "t")
        .await
        .unwrap_err();

    assert!(matches!(err, ColloquyError::GenerationFailed(_)));
    assert_eq!(h.store.set_count(), 0);
}

#[tokio::test]
async fn failed_cache_write_still_returns_summary() {
    let h = harness(Ok("summary"));
    h.store.fail_sets.store(true, Ordering::SeqCst);

    let text = h
        .dispatcher
        .summarize(URL, CLAUDE, &anthropic_key(), "t")
        .await
        .unwrap();

    assert_eq!(text, "summary");
    assert_eq!(h.store.set_count(), 1);
    assert_eq!(
        h.renderer.events().last(),
        Some(&RenderEvent::Summary("summary".into()))
    );
}

// ============================================================================
// answer
// ============================================================================

#[tokio::test]
async fn answer_always_calls_provider_and_never_writes() {
    let h = harness(Ok("<p>Rust.</p>"));
    let creds = anthropic_key();

    for _ in 0..2 {
        let answer = h
            .dispatcher
            .answer("Which language wins?", CLAUDE, &creds, "t")
            .await
            .unwrap();
        assert_eq!(answer, "<p>Rust.</p>");
    }

    assert_eq!(h.calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.store.set_count(), 0);
    assert!(cached_entries(h.store.as_ref()).await.is_empty());
    assert_eq!(
        h.renderer.events()[..3],
        [
            RenderEvent::LoadingStart,
            RenderEvent::LoadingEnd,
            RenderEvent::Answer("<p>Rust.</p>".into()),
        ]
    );
}

#[tokio::test]
async fn answer_failure_renders_error() {
    let h = harness(Err("timeout"));

    let err = h
        .dispatcher
        .answer("why?", CLAUDE, &anthropic_key(), "t")
        .await
        .unwrap_err();

    assert!(matches!(err, ColloquyError::GenerationFailed(_)));
    assert_eq!(h.store.set_count(), 0);
    assert_eq!(
        h.renderer.events(),
        vec![
            RenderEvent::LoadingStart,
            RenderEvent::LoadingEnd,
            RenderEvent::Error("An error occurred while answering the question.".into()),
        ]
    );
}

#[tokio::test]
async fn answer_with_missing_credential_is_reported() {
    let h = harness(Ok("unused"));

    let err = h
        .dispatcher
        .answer("why?", GPT, &anthropic_key(), "t")
        .await
        .unwrap_err();

    assert!(err.is_selection_error());
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// builder
// ============================================================================

#[test]
fn builder_rejects_empty_provider_table() {
    let result = Colloquy::builder().without_default_providers().build();
    assert!(matches!(result, Err(ColloquyError::Configuration(_))));
}

#[test]
fn builder_rejects_zero_timeout() {
    let result = Colloquy::builder().timeout(0).build();
    assert!(matches!(result, Err(ColloquyError::Configuration(_))));
}

#[test]
fn builder_defaults_route_claude_and_gpt() {
    let dispatcher = Colloquy::builder().build().unwrap();
    let selector = dispatcher.selector();
    assert_eq!(selector.provider_for(CLAUDE).unwrap(), ProviderKind::Anthropic);
    assert_eq!(selector.provider_for(GPT).unwrap(), ProviderKind::OpenAi);
}
