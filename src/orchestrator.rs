//! Runtime for a [`QuerySession`].
//!
//! One worker task owns the session and is the only place it is mutated.
//! User intents arrive over a bounded channel, network completions over an
//! unbounded one; both are handled strictly one at a time. Requests run on
//! their own tasks under a deadline and report back as completions. The
//! latest [`ViewState`] is published on a watch channel.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::Instrument;
use uuid::Uuid;

use crate::backend::{CourseBackend, with_deadline};
use crate::config::{ClientConfig, INTENT_CHANNEL_CAPACITY};
use crate::error::Operation;
use crate::filters::ResultFilters;
use crate::session::view::ViewState;
use crate::session::{Completion, Effect, Intent, QuerySession};

/// Entry point for starting a session worker
pub struct Orchestrator;

impl Orchestrator {
    /// Spawn the worker on the current tokio runtime. The session mounts
    /// immediately, which requests catalog page 1.
    pub fn spawn<B: CourseBackend>(backend: B, config: ClientConfig) -> OrchestratorHandle {
        let session = QuerySession::new(&config);
        let (intent_tx, intent_rx) = mpsc::channel(INTENT_CHANNEL_CAPACITY);
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(session.view());
        let session_id = Uuid::new_v4();

        let worker = Worker {
            session_id,
            backend: Arc::new(backend),
            request_timeout: config.request_timeout,
            session,
            view_tx,
            done_tx,
            suggest_task: None,
            search_task: None,
        };
        let span = tracing::info_span!("session", id = %session_id);
        let task = tokio::spawn(worker.run(intent_rx, done_rx).instrument(span));

        tracing::info!("Started query session {}", session_id);

        OrchestratorHandle {
            session_id,
            intent_tx,
            view_rx,
            task,
        }
    }
}

/// Client side of a running session
#[derive(Debug)]
pub struct OrchestratorHandle {
    session_id: Uuid,
    intent_tx: mpsc::Sender<Intent>,
    view_rx: watch::Receiver<ViewState>,
    task: JoinHandle<()>,
}

impl OrchestratorHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    async fn send(&self, intent: Intent) -> Result<()> {
        self.intent_tx
            .send(intent)
            .await
            .map_err(|_| anyhow!("Query session {} has shut down", self.session_id))
    }

    pub async fn set_query(&self, text: impl Into<String>) -> Result<()> {
        self.send(Intent::SetQuery(text.into())).await
    }

    pub async fn submit(&self) -> Result<()> {
        self.send(Intent::Submit).await
    }

    /// Replace the query with `text` and submit it without looking up suggestions
    pub async fn submit_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(Intent::SubmitText(text.into())).await
    }

    pub async fn accept_suggestion(&self, index: usize) -> Result<()> {
        self.send(Intent::AcceptSuggestion(index)).await
    }

    pub async fn accept_correction(&self) -> Result<()> {
        self.send(Intent::AcceptCorrection).await
    }

    pub async fn dismiss_suggestions(&self) -> Result<()> {
        self.send(Intent::DismissSuggestions).await
    }

    pub async fn retry(&self) -> Result<()> {
        self.send(Intent::Retry).await
    }

    pub async fn next_page(&self) -> Result<()> {
        self.send(Intent::NextPage).await
    }

    pub async fn prev_page(&self) -> Result<()> {
        self.send(Intent::PrevPage).await
    }

    pub async fn go_to_page(&self, page: u32) -> Result<()> {
        self.send(Intent::GoToPage(page)).await
    }

    pub async fn set_filters(&self, filters: ResultFilters) -> Result<()> {
        self.send(Intent::SetFilters(filters)).await
    }

    /// The most recently published view
    pub fn view(&self) -> ViewState {
        self.view_rx.borrow().clone()
    }

    /// A receiver that observes every published view
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view_rx.clone()
    }

    /// Wait until the published view satisfies `predicate`
    pub async fn wait_until<F>(&self, timeout: Duration, predicate: F) -> Result<ViewState>
    where
        F: FnMut(&ViewState) -> bool,
    {
        let mut rx = self.view_rx.clone();
        let view = tokio::time::timeout(timeout, rx.wait_for(predicate))
            .await
            .with_context(|| format!("View did not settle within {timeout:?}"))?
            .map_err(|_| anyhow!("Query session {} has shut down", self.session_id))?;
        Ok(view.clone())
    }

    /// Stop the worker and wait for it to exit
    pub async fn shutdown(self) -> Result<()> {
        let OrchestratorHandle {
            session_id,
            intent_tx,
            task,
            ..
        } = self;
        drop(intent_tx);
        task.await
            .with_context(|| format!("Query session {session_id} worker panicked"))?;
        tracing::info!("Stopped query session {}", session_id);
        Ok(())
    }
}

struct Worker<B> {
    session_id: Uuid,
    backend: Arc<B>,
    request_timeout: Duration,
    session: QuerySession,
    view_tx: watch::Sender<ViewState>,
    done_tx: mpsc::UnboundedSender<Completion>,
    suggest_task: Option<AbortHandle>,
    search_task: Option<AbortHandle>,
}

impl<B: CourseBackend> Worker<B> {
    async fn run(
        mut self,
        mut intent_rx: mpsc::Receiver<Intent>,
        mut done_rx: mpsc::UnboundedReceiver<Completion>,
    ) {
        let effects = self.session.apply(Intent::Mount);
        self.run_effects(effects);
        self.publish();

        loop {
            let effects = tokio::select! {
                intent = intent_rx.recv() => match intent {
                    Some(intent) => {
                        tracing::debug!(intent = intent.discriminant(), "Handling intent");
                        self.session.apply(intent)
                    }
                    None => break,
                },
                Some(done) = done_rx.recv() => {
                    tracing::debug!(completion = done.discriminant(), "Handling completion");
                    self.session.complete(done)
                }
            };
            self.run_effects(effects);
            self.publish();
        }

        for handle in [self.suggest_task.take(), self.search_task.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
        tracing::debug!("Session {} worker exiting", self.session_id);
    }

    fn publish(&self) {
        let view = self.session.view();
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                tracing::debug!("View -> {}", view.name());
                *current = view;
                true
            }
        });
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.dispatch(effect);
        }
    }

    fn dispatch(&mut self, effect: Effect) {
        let backend = Arc::clone(&self.backend);
        let done = self.done_tx.clone();
        let limit = self.request_timeout;

        match effect {
            Effect::Suggest { seq, word } => {
                tracing::debug!("Requesting suggestions for '{}' (seq {})", word, seq);
                let handle = tokio::spawn(async move {
                    let result =
                        with_deadline(Operation::Suggest, limit, backend.suggest(&word)).await;
                    let _ = done.send(Completion::Suggestions { seq, result });
                });
                // A superseded lookup can only ever be discarded
                if let Some(previous) = self.suggest_task.replace(handle.abort_handle()) {
                    previous.abort();
                }
            }
            Effect::Validate { seq, word } => {
                tracing::debug!("Validating spelling of '{}' (seq {})", word, seq);
                tokio::spawn(async move {
                    let result =
                        with_deadline(Operation::Validate, limit, backend.validate_spelling(&word))
                            .await;
                    let _ = done.send(Completion::Validation { seq, result });
                });
            }
            Effect::Search { seq, text } => {
                tracing::debug!("Searching for '{}' (seq {})", text, seq);
                let handle = tokio::spawn(async move {
                    let result = with_deadline(Operation::Search, limit, backend.search(&text)).await;
                    let _ = done.send(Completion::Search { seq, result });
                });
                if let Some(previous) = self.search_task.replace(handle.abort_handle()) {
                    previous.abort();
                }
            }
            Effect::RecordUsage { word } => {
                tokio::spawn(async move {
                    match with_deadline(Operation::RecordUsage, limit, backend.record_usage(&word))
                        .await
                    {
                        Ok(()) => tracing::debug!("Recorded usage of '{}'", word),
                        Err(e) => tracing::warn!("Could not record usage of '{}': {}", word, e),
                    }
                });
            }
            Effect::FetchPage { page, size } => {
                tracing::debug!("Fetching catalog page {} (size {})", page, size);
                tokio::spawn(async move {
                    let result =
                        with_deadline(Operation::CatalogPage, limit, backend.catalog_page(page, size))
                            .await;
                    let _ = done.send(Completion::Page { page, result });
                });
            }
        }
    }
}
