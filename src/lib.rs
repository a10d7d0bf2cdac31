//! Colloquy - cached LLM summaries and Q&A for discussion threads
//!
//! Given the visible text of a link-aggregator discussion page, this crate
//! produces an HTML summary of the thread (cached per page and model) or an
//! answer to a free-form question about it (never cached). Generation is
//! delegated to whichever provider owns the selected model: `claude-*`
//! models go to Anthropic, `gpt-*` models to OpenAI.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use colloquy::{Colloquy, CredentialSet, MemoryStore, ProviderKind};
//!
//! #[tokio::main]
//! async fn main() -> colloquy::Result<()> {
//!     let dispatcher = Colloquy::builder()
//!         .store(Arc::new(MemoryStore::new()))
//!         .build()?;
//!
//!     let credentials = CredentialSet::new().with(ProviderKind::Anthropic, "sk-ant-...");
//!     let summary = dispatcher
//!         .summarize(
//!             "https://news.ycombinator.com/item?id=1",
//!             "claude-3-haiku-20240307",
//!             &credentials,
//!             "visible text of the thread",
//!         )
//!         .await?;
//!
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```
//!
//! A second call with the same URL and model is served from the cache.
//!
//! # Page contexts
//!
//! [`PageContext`] wraps a dispatcher for a single page and speaks the
//! JSON [`Request`]/[`Response`] protocol. [`PageContext::spawn`] runs it on
//! its own task behind a [`PageChannel`].

pub mod cache;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod page;
pub mod prompt;
pub mod providers;
pub mod render;
pub mod settings;
pub mod store;
pub mod telemetry;
pub mod types;

/// Messages exchanged between a caller and a page context.
pub mod protocol {
    pub use crate::context::PageChannel;
    pub use crate::types::{Request, Response};
}

// Re-export main types at crate root
pub use cache::{SummaryCache, cache_key};
pub use config::Config;
pub use context::{PageChannel, PageContext};
pub use dispatch::{Colloquy, ColloquyBuilder, DispatchState, Dispatcher};
pub use error::{ColloquyError, Result};
pub use page::{PageFetcher, is_discussion_page};
pub use providers::{ProviderConfig, ProviderSelector, TextProvider};
pub use render::{PageRenderer, RecordingRenderer, TracingRenderer};
pub use settings::{SaveOutcome, Settings, SettingsUpdate};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use types::{CredentialSet, Page, ProviderKind, RenderEvent, Request, Response};
