//! Stored credentials and model selection.
//!
//! This is the controller side of the store: it reads and writes the API
//! keys and `selectedModel`, and wipes the summary cache whenever the model
//! changes. Keys are shown back to the user masked; submitting a masked
//! value unchanged leaves the stored key alone.

use std::fmt;

use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use crate::Result;
use crate::store::{KeyValueStore, keys};
use crate::types::{CredentialSet, ProviderKind};

/// Persisted settings as read from the store.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub selected_model: Option<String>,
}

impl Settings {
    /// Read the credential and model fields.
    pub async fn load(store: &dyn KeyValueStore) -> Result<Self> {
        let values = store
            .get(&[
                keys::ANTHROPIC_API_KEY,
                keys::OPENAI_API_KEY,
                keys::SELECTED_MODEL,
            ])
            .await?;
        Ok(Self {
            anthropic_api_key: string_field(&values, keys::ANTHROPIC_API_KEY),
            openai_api_key: string_field(&values, keys::OPENAI_API_KEY),
            selected_model: string_field(&values, keys::SELECTED_MODEL),
        })
    }

    /// The stored key for a provider, if any.
    pub fn api_key(&self, provider: ProviderKind) -> Option<&str> {
        match provider {
            ProviderKind::Anthropic => self.anthropic_api_key.as_deref(),
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
        }
    }

    pub fn credentials(&self) -> CredentialSet {
        let mut creds = CredentialSet::new();
        for provider in ProviderKind::ALL {
            if let Some(key) = self.api_key(provider) {
                creds.insert(provider, key);
            }
        }
        creds
    }

    /// The stored model, or `default` when none has been saved.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.selected_model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(default)
    }

    /// Copy with every key replaced by its mask, for display.
    pub fn masked(&self) -> Settings {
        Settings {
            anthropic_api_key: self.anthropic_api_key.as_deref().map(mask_api_key),
            openai_api_key: self.openai_api_key.as_deref().map(mask_api_key),
            selected_model: self.selected_model.clone(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = self.masked();
        f.debug_struct("Settings")
            .field("anthropic_api_key", &masked.anthropic_api_key)
            .field("openai_api_key", &masked.openai_api_key)
            .field("selected_model", &self.selected_model)
            .finish()
    }
}

fn string_field(values: &Map<String, Value>, key: &str) -> Option<String> {
    values.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// One `*` per character of the key.
pub fn mask_api_key(key: &str) -> String {
    "*".repeat(key.chars().count())
}

/// Whether a submitted value is a mask rather than a real key.
pub fn is_masked(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c == '*')
}

/// Values submitted from the settings form.
///
/// `None` leaves a key untouched, as does a value made only of `*`.
/// `Some("")` clears it.
#[derive(Clone, Default)]
pub struct SettingsUpdate {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub selected_model: String,
}

impl SettingsUpdate {
    pub fn new(selected_model: impl Into<String>) -> Self {
        Self {
            selected_model: selected_model.into(),
            ..Self::default()
        }
    }

    pub fn api_key(mut self, provider: ProviderKind, key: impl Into<String>) -> Self {
        let key = Some(key.into());
        match provider {
            ProviderKind::Anthropic => self.anthropic_api_key = key,
            ProviderKind::OpenAi => self.openai_api_key = key,
        }
        self
    }

    fn submitted(&self, provider: ProviderKind) -> Option<&str> {
        let value = match provider {
            ProviderKind::Anthropic => self.anthropic_api_key.as_deref(),
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
        };
        value.filter(|v| !is_masked(v))
    }
}

/// What [`save`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    /// The model changed, so every cached summary was dropped.
    pub cache_invalidated: bool,
}

/// Persist a settings update in a single store write.
///
/// A model change resets `summaryCache` to `{}` as part of the same write.
#[instrument(skip_all, fields(model = %update.selected_model))]
pub async fn save(store: &dyn KeyValueStore, update: &SettingsUpdate) -> Result<SaveOutcome> {
    let previous_model = store.get_string(keys::SELECTED_MODEL).await?;

    let mut items = Map::new();
    for provider in ProviderKind::ALL {
        if let Some(key) = update.submitted(provider) {
            items.insert(provider.store_key().to_string(), Value::from(key));
        }
    }
    items.insert(
        keys::SELECTED_MODEL.to_string(),
        Value::from(update.selected_model.as_str()),
    );

    let cache_invalidated = previous_model.as_deref() != Some(update.selected_model.as_str());
    if cache_invalidated {
        items.insert(keys::SUMMARY_CACHE.to_string(), json!({}));
    }

    store.set(items).await?;
    debug!(cache_invalidated, "settings saved");
    Ok(SaveOutcome { cache_invalidated })
}

/// Remember the most recent result and the question that produced it.
///
/// A summary has no question: `None` clears `lastQuestion`, so the pair read
/// back by [`last_exchange`] always belongs together.
pub async fn record_exchange(
    store: &dyn KeyValueStore,
    question: Option<&str>,
    result: &str,
) -> Result<()> {
    let mut items = Map::new();
    items.insert(keys::LAST_RESULT.to_string(), Value::from(result));
    items.insert(
        keys::LAST_QUESTION.to_string(),
        question.map_or(Value::Null, Value::from),
    );
    store.set(items).await
}

/// The recorded question and result, for redisplay.
pub async fn last_exchange(store: &dyn KeyValueStore) -> Result<(Option<String>, Option<String>)> {
    let values = store.get(&[keys::LAST_QUESTION, keys::LAST_RESULT]).await?;
    Ok((
        string_field(&values, keys::LAST_QUESTION),
        string_field(&values, keys::LAST_RESULT),
    ))
}
