//! Request/response shapes exchanged with the page context.
//!
//! On the wire these are the JSON objects the controller and the page
//! context already agree on:
//!
//! ```text
//! {"action": "summarize"}            -> {"summary": "..."} | {"error": "..."}
//! {"action": "ask", "question": "…"} -> {"answer": "..."}  | {"error": "..."}
//! ```

use serde::{Deserialize, Serialize};

/// A request sent to the page context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Request {
    Summarize,
    Ask { question: String },
}

/// The page context's reply to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Summary(String),
    Answer(String),
    Error(String),
}

impl Response {
    /// The carried text, whichever variant this is.
    pub fn text(&self) -> &str {
        match self {
            Response::Summary(s) | Response::Answer(s) | Response::Error(s) => s,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}
