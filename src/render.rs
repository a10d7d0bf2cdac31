//! Page renderer seam.
//!
//! The dispatcher reports progress as [`RenderEvent`]s; what a renderer does
//! with them (DOM insertion, terminal output, nothing) is its own business.

use std::sync::Mutex;

use tracing::{debug, warn};

use crate::types::RenderEvent;

/// User-facing message when summarization fails.
pub const SUMMARY_ERROR_MESSAGE: &str = "An error occurred while summarizing the discussion.";

/// User-facing message when answering a question fails.
pub const ANSWER_ERROR_MESSAGE: &str = "An error occurred while answering the question.";

/// User-facing message when no API key is configured at all.
pub const MISSING_KEY_MESSAGE: &str = "Please set your API key in the extension popup.";

/// User-facing message for an empty question.
pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a question.";

/// Receives render events from the dispatcher.
pub trait PageRenderer: Send + Sync {
    fn render(&self, event: RenderEvent);
}

/// Renderer that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRenderer;

impl PageRenderer for TracingRenderer {
    fn render(&self, event: RenderEvent) {
        match event {
            RenderEvent::Error(message) => warn!(message = %message, "render error"),
            RenderEvent::Summary(text) => debug!(chars = text.len(), "render summary"),
            RenderEvent::Answer(text) => debug!(chars = text.len(), "render answer"),
            RenderEvent::LoadingStart => debug!("render loading start"),
            RenderEvent::LoadingEnd => debug!("render loading end"),
        }
    }
}

/// Renderer that records every event, in order.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<RenderEvent>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far.
    pub fn events(&self) -> Vec<RenderEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl PageRenderer for RecordingRenderer {
    fn render(&self, event: RenderEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
