//! Provider trait for prompt → text generation.
//!
//! A provider is bound to one model at construction time: the selector
//! decides provider family and model, the dispatcher only submits prompts.

use async_trait::async_trait;

use crate::Result;
use crate::types::ProviderKind;

/// A configured client for one provider family and one model.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Provider family serving this client.
    fn kind(&self) -> ProviderKind;

    /// Provider name for logging/debugging.
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    /// Exact model identifier requests are sent with.
    fn model(&self) -> &str;

    /// Submit a single-turn prompt and return the generated text.
    ///
    /// Failures (rejection, timeout, malformed output) are reported as
    /// [`GenerationFailed`](crate::ColloquyError::GenerationFailed).
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Everything a provider factory needs to build a client.
#[derive(Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Override the provider's API endpoint (proxies, testing).
    pub base_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
