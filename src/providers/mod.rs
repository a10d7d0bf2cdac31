//! Provider clients and model → provider selection.
//!
//! - [`traits`]: the [`TextProvider`] trait every client implements.
//! - [`llm_chat`]: clients over the llm crate's Anthropic/OpenAI backends.
//! - [`selector`]: the prefix table that picks a client for a model.

pub mod llm_chat;
pub mod selector;
pub mod traits;

pub use llm_chat::LlmChatProvider;
pub use selector::{DEFAULT_TIMEOUT_SECS, ProviderFactory, ProviderSelector, llm_factory};
pub use traits::{ProviderConfig, TextProvider};
