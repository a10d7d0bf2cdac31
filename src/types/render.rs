//! Events handed to the page renderer

use serde::{Deserialize, Serialize};

/// One update for the page renderer.
///
/// The renderer owns all presentation; the dispatcher only says what
/// happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum RenderEvent {
    LoadingStart,
    LoadingEnd,
    Summary(String),
    Answer(String),
    Error(String),
}
