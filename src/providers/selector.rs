//! Model → provider selection.
//!
//! The [`ProviderSelector`] is a lookup table of model-identifier prefixes.
//! Each route names the provider family that owns the prefix and a factory
//! that turns a [`ProviderConfig`] into a client:
//!
//! ```text
//! "claude-3-haiku-20240307"
//!            │ longest matching prefix
//!            ▼
//!   ┌──────────────────────┐
//!   │ "claude-" → anthropic │ ──► credential present? ──► no: MissingCredential
//!   │ "gpt-"    → openai    │                          └► yes: factory(config)
//!   └──────────────────────┘
//!            │ no route
//!            ▼
//!     UnsupportedModel
//! ```
//!
//! New providers are added with [`ProviderSelector::register`]; call sites
//! never branch on model names themselves.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::llm_chat::LlmChatProvider;
use super::traits::{ProviderConfig, TextProvider};
use crate::types::{CredentialSet, ProviderKind};
use crate::{ColloquyError, Result};

/// Default provider timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Builds a client from a resolved configuration.
pub type ProviderFactory = Arc<dyn Fn(ProviderConfig) -> Arc<dyn TextProvider> + Send + Sync>;

struct Route {
    prefix: String,
    kind: ProviderKind,
    factory: ProviderFactory,
}

/// Registered prefix table mapping model identifiers to provider clients.
pub struct ProviderSelector {
    routes: Vec<Route>,
    timeout_secs: u64,
    base_urls: HashMap<ProviderKind, String>,
}

impl Default for ProviderSelector {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ProviderSelector {
    /// An empty table: every model is unsupported until routes are registered.
    pub fn empty() -> Self {
        Self {
            routes: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_urls: HashMap::new(),
        }
    }

    /// The standard table: `claude-` → Anthropic, `gpt-` → OpenAI.
    pub fn with_defaults() -> Self {
        let mut selector = Self::empty();
        selector.register("claude-", ProviderKind::Anthropic, llm_factory());
        selector.register("gpt-", ProviderKind::OpenAi, llm_factory());
        selector
    }

    /// Register (or replace) the route for `prefix`.
    pub fn register(
        &mut self,
        prefix: impl Into<String>,
        kind: ProviderKind,
        factory: ProviderFactory,
    ) {
        let prefix = prefix.into();
        self.routes.retain(|r| r.prefix != prefix);
        self.routes.push(Route {
            prefix,
            kind,
            factory,
        });
    }

    /// Set the timeout passed to every constructed client.
    pub fn set_timeout_secs(&mut self, secs: u64) {
        self.timeout_secs = secs;
    }

    /// Override the API endpoint for a provider family.
    pub fn set_base_url(&mut self, kind: ProviderKind, url: impl Into<String>) {
        self.base_urls.insert(kind, url.into());
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Registered prefixes, in registration order.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.prefix.as_str())
    }

    fn route(&self, model_id: &str) -> Option<&Route> {
        self.routes
            .iter()
            .filter(|r| model_id.starts_with(r.prefix.as_str()))
            .max_by_key(|r| r.prefix.len())
    }

    /// Which provider family owns `model_id`, without checking credentials.
    pub fn provider_for(&self, model_id: &str) -> Result<ProviderKind> {
        self.route(model_id)
            .map(|r| r.kind)
            .ok_or_else(|| ColloquyError::UnsupportedModel(model_id.to_string()))
    }

    /// Build a client for `model_id` using the matching credential.
    ///
    /// Fails with `UnsupportedModel` when no prefix matches and with
    /// `MissingCredential` when the owning provider has no key.
    pub fn select(
        &self,
        model_id: &str,
        credentials: &CredentialSet,
    ) -> Result<Arc<dyn TextProvider>> {
        let route = self
            .route(model_id)
            .ok_or_else(|| ColloquyError::UnsupportedModel(model_id.to_string()))?;

        let api_key = credentials
            .get(route.kind)
            .ok_or(ColloquyError::MissingCredential {
                provider: route.kind,
            })?;

        debug!(model = model_id, provider = %route.kind, prefix = %route.prefix, "provider selected");

        let config = ProviderConfig {
            kind: route.kind,
            api_key: api_key.to_string(),
            model: model_id.to_string(),
            timeout_secs: self.timeout_secs,
            base_url: self.base_urls.get(&route.kind).cloned(),
        };
        Ok((route.factory)(config))
    }
}

/// Factory producing [`LlmChatProvider`] clients.
pub fn llm_factory() -> ProviderFactory {
    Arc::new(|config: ProviderConfig| Arc::new(LlmChatProvider::new(config)) as Arc<dyn TextProvider>)
}
