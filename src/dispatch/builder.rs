//! Builder for configuring dispatcher instances

use std::sync::Arc;

use super::Dispatcher;
use crate::config::Config;
use crate::providers::{ProviderFactory, ProviderSelector};
use crate::render::{PageRenderer, TracingRenderer};
use crate::store::{FileStore, KeyValueStore, MemoryStore};
use crate::types::ProviderKind;
use crate::{ColloquyError, Result};

/// Main entry point for creating dispatcher instances.
pub struct Colloquy;

impl Colloquy {
    /// Create a new builder for configuring the dispatcher.
    pub fn builder() -> ColloquyBuilder {
        ColloquyBuilder::new()
    }
}

/// Builder for configuring dispatcher instances.
pub struct ColloquyBuilder {
    store: Option<Arc<dyn KeyValueStore>>,
    renderer: Option<Arc<dyn PageRenderer>>,
    timeout_secs: Option<u64>,
    anthropic_base_url: Option<String>,
    openai_base_url: Option<String>,
    default_providers: bool,
    extra_providers: Vec<(String, ProviderKind, ProviderFactory)>,
}

impl ColloquyBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            renderer: None,
            timeout_secs: None,
            anthropic_base_url: None,
            openai_base_url: None,
            default_providers: true,
            extra_providers: Vec::new(),
        }
    }

    /// Seed the builder from a loaded [`Config`].
    ///
    /// Uses a [`FileStore`] at the configured path; later calls override.
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new()
            .store(Arc::new(FileStore::new(config.storage.path())))
            .timeout(config.providers.timeout_secs);
        if let Some(url) = config.providers.base_url(ProviderKind::Anthropic) {
            builder = builder.anthropic_base_url(url);
        }
        if let Some(url) = config.providers.base_url(ProviderKind::OpenAi) {
            builder = builder.openai_base_url(url);
        }
        builder
    }

    /// Use this key-value store (default: a fresh [`MemoryStore`]).
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Send render events here (default: [`TracingRenderer`]).
    pub fn renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Set the provider timeout (seconds).
    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Point Anthropic clients at a different endpoint.
    pub fn anthropic_base_url(mut self, url: impl Into<String>) -> Self {
        self.anthropic_base_url = Some(url.into());
        self
    }

    /// Point OpenAI clients at a different endpoint.
    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai_base_url = Some(url.into());
        self
    }

    /// Register an additional model prefix.
    ///
    /// Registered after the defaults, so it replaces a default route with the
    /// same prefix.
    pub fn provider(
        mut self,
        prefix: impl Into<String>,
        kind: ProviderKind,
        factory: ProviderFactory,
    ) -> Self {
        self.extra_providers.push((prefix.into(), kind, factory));
        self
    }

    /// Start from an empty prefix table instead of `claude-`/`gpt-`.
    pub fn without_default_providers(mut self) -> Self {
        self.default_providers = false;
        self
    }

    /// Build the dispatcher.
    pub fn build(self) -> Result<Dispatcher> {
        let mut selector = if self.default_providers {
            ProviderSelector::with_defaults()
        } else {
            ProviderSelector::empty()
        };

        for (prefix, kind, factory) in self.extra_providers {
            selector.register(prefix, kind, factory);
        }

        if selector.prefixes().next().is_none() {
            return Err(ColloquyError::Configuration(
                "no model providers registered".to_string(),
            ));
        }

        if let Some(secs) = self.timeout_secs {
            if secs == 0 {
                return Err(ColloquyError::Configuration(
                    "provider timeout must be at least one second".to_string(),
                ));
            }
            selector.set_timeout_secs(secs);
        }
        if let Some(url) = self.anthropic_base_url {
            selector.set_base_url(ProviderKind::Anthropic, url);
        }
        if let Some(url) = self.openai_base_url {
            selector.set_base_url(ProviderKind::OpenAi, url);
        }

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let renderer = self
            .renderer
            .unwrap_or_else(|| Arc::new(TracingRenderer));

        Ok(Dispatcher::new(store, selector, renderer))
    }
}

impl Default for ColloquyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
