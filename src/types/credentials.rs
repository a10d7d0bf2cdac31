//! Provider families and per-provider credentials

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A provider family that can serve models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderKind {
    /// All known provider families.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Anthropic, ProviderKind::OpenAi];

    /// Stable lowercase name, used in logs, metrics labels and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
        }
    }

    /// Human-facing vendor name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::OpenAi => "OpenAI",
        }
    }

    /// Name of the model family this provider serves.
    pub fn model_family(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "Claude",
            ProviderKind::OpenAi => "GPT",
        }
    }

    /// Key-value store field holding this provider's API key.
    pub fn store_key(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => crate::store::keys::ANTHROPIC_API_KEY,
            ProviderKind::OpenAi => crate::store::keys::OPENAI_API_KEY,
        }
    }

    /// Environment variable consulted when no key is stored.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-provider API keys.
///
/// Supplied by the user and never generated here. Empty strings are treated
/// as absent, since a cleared form field is stored as `""`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    keys: HashMap<ProviderKind, String>,
}

impl CredentialSet {
    /// Create an empty credential set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, provider: ProviderKind, api_key: impl Into<String>) -> Self {
        self.insert(provider, api_key);
        self
    }

    /// Insert or overwrite the key for a provider.
    pub fn insert(&mut self, provider: ProviderKind, api_key: impl Into<String>) {
        self.keys.insert(provider, api_key.into());
    }

    /// The key for a provider, if present and non-empty.
    pub fn get(&self, provider: ProviderKind) -> Option<&str> {
        self.keys
            .get(&provider)
            .map(String::as_str)
            .filter(|k| !k.is_empty())
    }

    /// Whether a usable key exists for the provider.
    pub fn contains(&self, provider: ProviderKind) -> bool {
        self.get(provider).is_some()
    }

    /// True when no provider has a usable key.
    pub fn is_empty(&self) -> bool {
        ProviderKind::ALL.iter().all(|p| !self.contains(*p))
    }

    /// Fill providers that have no usable key from `other`.
    pub fn merge_missing(&mut self, other: &CredentialSet) {
        for provider in ProviderKind::ALL {
            if !self.contains(provider)
                && let Some(key) = other.get(provider)
            {
                self.insert(provider, key);
            }
        }
    }

    /// Keys read from the providers' environment variables.
    pub fn from_env() -> Self {
        let mut set = Self::new();
        for provider in ProviderKind::ALL {
            if let Ok(key) = std::env::var(provider.env_var()) {
                set.insert(provider, key);
            }
        }
        set
    }
}

// Secrets stay out of logs.
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present: Vec<&str> = ProviderKind::ALL
            .iter()
            .filter(|p| self.contains(**p))
            .map(|p| p.as_str())
            .collect();
        f.debug_struct("CredentialSet")
            .field("providers", &present)
            .finish()
    }
}
