//! Discussion pages: recognising them and reading their visible text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::Url;
use tracing::{debug, instrument};

use crate::types::Page;
use crate::{ColloquyError, Result};

/// Whether `url` points at a discussion thread (`/item?id=...`).
///
/// Unparseable URLs are not discussion pages.
pub fn is_discussion_page(url: &str) -> bool {
    match Url::parse(url.trim()) {
        Ok(parsed) => {
            parsed.path() == "/item" && parsed.query().is_some_and(|q| q.contains("id="))
        }
        Err(_) => false,
    }
}

/// Fetches a page over HTTP and extracts its visible text.
#[derive(Debug, Clone, Default)]
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured HTTP client (proxies, timeouts, user agent).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// GET `url` and return its text content.
    ///
    /// Transport errors and non-2xx statuses are `CommunicationFailure`.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Page> {
        let response = self.client.get(url).send().await.map_err(|e| {
            ColloquyError::CommunicationFailure(format!("failed to fetch {url}: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ColloquyError::CommunicationFailure(format!(
                "fetching {url} returned HTTP {status}"
            )));
        }

        let body = response.text().await.map_err(|e| {
            ColloquyError::CommunicationFailure(format!("failed to read body of {url}: {e}"))
        })?;

        let text = html_to_text(&body);
        debug!(html_bytes = body.len(), text_chars = text.len(), "page fetched");
        Ok(Page::new(url, text))
    }
}

static SCRIPT_STYLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?(?:</script\s*>|$)|<style\b[^>]*>.*?(?:</style\s*>|$)")
        .expect("valid script/style regex")
});

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?(?:-->|$)").expect("valid comment regex"));

// Block boundaries separate words in rendered text; inline tags do not.
static BLOCK_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)</?(?:address|article|aside|blockquote|br|dd|div|dl|dt|footer|form|h[1-6]|header|hr|li|main|nav|ol|p|pre|section|table|td|th|tr|ul)\b[^<>]*>",
    )
    .expect("valid block tag regex")
});

// A tag starts with a name, so a bare `<` in text is left alone. An
// unterminated tag at the end of the document is dropped.
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[/!]?[A-Za-z][^<>]*(?:>|$)").expect("valid tag regex"));

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("valid entity regex")
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Reduce an HTML document to its visible text.
///
/// Drops tags, comments, and the bodies of `<script>`/`<style>`, decodes the
/// common entities and collapses runs of whitespace into single spaces.
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_STYLE_RE.replace_all(html, " ");
    let text = COMMENT_RE.replace_all(&text, "");
    let text = BLOCK_TAG_RE.replace_all(&text, " ");
    let text = TAG_RE.replace_all(&text, "");
    let text = ENTITY_RE.replace_all(&text, |caps: &Captures<'_>| match decode_entity(&caps[1]) {
        Some(c) => c.to_string(),
        None => caps[0].to_string(),
    });
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
