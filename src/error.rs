//! Colloquy error types

use crate::types::ProviderKind;

/// Colloquy error types
///
/// Every variant is scoped to the single request that produced it; none is
/// retried by this crate and none leaves the dispatcher unusable.
#[derive(Debug, thiserror::Error)]
pub enum ColloquyError {
    // Selection errors
    /// The selected model needs a credential that is not configured.
    #[error("{} API key is required for {} models", .provider.display_name(), .provider.model_family())]
    MissingCredential { provider: ProviderKind },

    /// No registered provider prefix matches the model identifier.
    #[error("unsupported model: {0}")]
    UnsupportedModel(String),

    // Provider errors
    /// The provider rejected the request, timed out, or returned unusable output.
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    // Transport errors
    /// A request could not be delivered to (or answered by) the page context.
    #[error("communication failure: {0}")]
    CommunicationFailure(String),

    // Storage / data errors
    #[error("storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ColloquyError {
    /// Whether this error came from choosing a provider rather than calling one.
    pub fn is_selection_error(&self) -> bool {
        matches!(
            self,
            ColloquyError::MissingCredential { .. } | ColloquyError::UnsupportedModel(_)
        )
    }
}

impl From<llm::error::LLMError> for ColloquyError {
    fn from(err: llm::error::LLMError) -> Self {
        ColloquyError::GenerationFailed(err.to_string())
    }
}

/// Result type alias for Colloquy operations
pub type Result<T> = std::result::Result<T, ColloquyError>;
