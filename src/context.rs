//! Page context: the per-page request handler and its message channel.
//!
//! A [`PageContext`] owns one discussion page and answers [`Request`]s about
//! it. [`PageContext::spawn`] moves it onto a task and hands back a
//! [`PageChannel`]; each call to [`PageChannel::request`] sends one request
//! and waits for its reply on a dedicated oneshot.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::config::DEFAULT_MODEL;
use crate::dispatch::Dispatcher;
use crate::page::is_discussion_page;
use crate::render::{EMPTY_QUESTION_MESSAGE, MISSING_KEY_MESSAGE};
use crate::settings::Settings;
use crate::types::{CredentialSet, Page, Request, Response};
use crate::{ColloquyError, Result};

const CHANNEL_CAPACITY: usize = 16;

type Envelope = (Request, oneshot::Sender<Response>);

/// Handles requests for a single discussion page.
pub struct PageContext {
    page: Page,
    dispatcher: Arc<Dispatcher>,
    default_model: String,
    fallback_credentials: CredentialSet,
}

impl PageContext {
    pub fn new(page: Page, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            page,
            dispatcher,
            default_model: DEFAULT_MODEL.to_string(),
            fallback_credentials: CredentialSet::new(),
        }
    }

    /// Model used when the store has no `selectedModel`.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Keys used for providers the store has none for (e.g. from the environment).
    pub fn with_fallback_credentials(mut self, credentials: CredentialSet) -> Self {
        self.fallback_credentials = credentials;
        self
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    async fn current_settings(&self) -> Result<(CredentialSet, String)> {
        let settings = Settings::load(self.dispatcher.store().as_ref()).await?;
        let mut credentials = settings.credentials();
        credentials.merge_missing(&self.fallback_credentials);
        let model = settings.model_or(&self.default_model).to_string();
        Ok((credentials, model))
    }

    /// Summarize automatically when the page is a discussion and a key exists.
    ///
    /// Returns `Ok(None)` when nothing was attempted.
    #[instrument(skip(self), fields(url = %self.page.url))]
    pub async fn on_load(&self) -> Result<Option<String>> {
        if !is_discussion_page(&self.page.url) {
            debug!("not a discussion page");
            return Ok(None);
        }

        let (credentials, model) = self.current_settings().await?;
        if credentials.is_empty() {
            debug!("no API key stored, skipping auto-summary");
            return Ok(None);
        }

        self.dispatcher
            .summarize(&self.page.url, &model, &credentials, &self.page.text)
            .await
            .map(Some)
    }

    /// Answer one request.
    ///
    /// Never fails: every error becomes a [`Response::Error`] carrying the
    /// underlying message.
    #[instrument(skip(self, request), fields(url = %self.page.url))]
    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::Summarize => self.handle_summarize().await,
            Request::Ask { question } => self.handle_ask(&question).await,
        }
    }

    async fn handle_summarize(&self) -> Response {
        let (credentials, model) = match self.current_settings().await {
            Ok(settings) => settings,
            Err(e) => return Response::Error(e.to_string()),
        };
        match self
            .dispatcher
            .summarize(&self.page.url, &model, &credentials, &self.page.text)
            .await
        {
            Ok(summary) => Response::Summary(summary),
            Err(e) => Response::Error(e.to_string()),
        }
    }

    async fn handle_ask(&self, question: &str) -> Response {
        if question.trim().is_empty() {
            return Response::Error(EMPTY_QUESTION_MESSAGE.to_string());
        }
        let (credentials, model) = match self.current_settings().await {
            Ok(settings) => settings,
            Err(e) => return Response::Error(e.to_string()),
        };
        if credentials.is_empty() {
            return Response::Error(MISSING_KEY_MESSAGE.to_string());
        }
        match self
            .dispatcher
            .answer(question, &model, &credentials, &self.page.text)
            .await
        {
            Ok(answer) => Response::Answer(answer),
            Err(e) => Response::Error(e.to_string()),
        }
    }

    /// Move the context onto a task that serves requests one at a time.
    ///
    /// The task ends once every [`PageChannel`] clone has been dropped.
    pub fn spawn(self) -> (PageChannel, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Envelope>(CHANNEL_CAPACITY);
        let handle = tokio::spawn(async move {
            while let Some((request, reply)) = rx.recv().await {
                let response = self.handle(request).await;
                if reply.send(response).is_err() {
                    debug!("requester went away before the reply was sent");
                }
            }
            debug!(url = %self.page.url, "page channel closed");
        });
        (PageChannel { tx }, handle)
    }
}

/// Sending half of a spawned [`PageContext`].
#[derive(Clone)]
pub struct PageChannel {
    tx: mpsc::Sender<Envelope>,
}

impl PageChannel {
    /// Deliver a request and wait for its reply.
    ///
    /// A context that is gone, or that drops the request unanswered, is a
    /// `CommunicationFailure`. Nothing is retried.
    pub async fn request(&self, request: Request) -> Result<Response> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send((request, reply_tx)).await.map_err(|_| {
            ColloquyError::CommunicationFailure("page context is not reachable".to_string())
        })?;
        reply_rx.await.map_err(|_| {
            ColloquyError::CommunicationFailure(
                "page context closed without replying".to_string(),
            )
        })
    }

    /// Whether the receiving context has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
