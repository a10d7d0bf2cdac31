//! Discussion page content

use serde::{Deserialize, Serialize};

/// A discussion page as seen at request time.
///
/// The text is recomputed for every request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub text: String,
}

impl Page {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }
}
