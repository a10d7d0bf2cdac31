//! LLM crate wrapper implementing [`TextProvider`].
//!
//! [`LlmChatProvider`] stores its configuration and builds an llm provider
//! per request, so constructing one never fails and never touches the
//! network; backend or credential problems surface from
//! [`complete`](TextProvider::complete) as `GenerationFailed`.

use async_trait::async_trait;
use llm::LLMProvider;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use tracing::{info, instrument};

use super::traits::{ProviderConfig, TextProvider};
use crate::types::ProviderKind;
use crate::{ColloquyError, Result};

/// Output budget for a single summary or answer.
const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Chat-completion client for Anthropic and OpenAI models.
///
/// # Example
///
/// ```ignore
/// use colloquy::providers::{LlmChatProvider, ProviderConfig};
/// use colloquy::ProviderKind;
///
/// let provider = LlmChatProvider::new(ProviderConfig {
///     kind: ProviderKind::Anthropic,
///     api_key: "sk-ant-...".into(),
///     model: "claude-3-haiku-20240307".into(),
///     timeout_secs: 120,
///     base_url: None,
/// });
/// ```
pub struct LlmChatProvider {
    config: ProviderConfig,
}

impl LlmChatProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn backend(&self) -> LLMBackend {
        match self.config.kind {
            ProviderKind::Anthropic => LLMBackend::Anthropic,
            ProviderKind::OpenAi => LLMBackend::OpenAI,
        }
    }

    fn build_provider(&self) -> Result<Box<dyn LLMProvider>> {
        let mut builder = LLMBuilder::new()
            .backend(self.backend())
            .api_key(&self.config.api_key)
            .model(&self.config.model)
            .max_tokens(MAX_OUTPUT_TOKENS)
            .timeout_seconds(self.config.timeout_secs);

        if let Some(ref url) = self.config.base_url {
            builder = builder.base_url(url.clone());
        }

        builder
            .build()
            .map_err(|e| ColloquyError::GenerationFailed(e.to_string()))
    }
}

#[async_trait]
impl TextProvider for LlmChatProvider {
    fn kind(&self) -> ProviderKind {
        self.config.kind
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    #[instrument(name = "llm.complete", skip(self, prompt), fields(model = %self.config.model, provider = %self.config.kind))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let provider = self.build_provider()?;
        let messages = vec![ChatMessage::user().content(prompt).build()];

        info!(prompt_chars = prompt.len(), "submitting prompt");
        let response = provider
            .chat(&messages)
            .await
            .map_err(ColloquyError::from)?;

        response
            .text()
            .ok_or_else(|| ColloquyError::GenerationFailed("response carried no text".into()))
    }
}
