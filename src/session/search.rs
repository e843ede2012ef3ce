//! Search execution for validated queries.

use crate::error::BackendError;
use crate::model::{Course, SearchOutcome};
use crate::session::query::{QueryStore, Seq};

/// A search request the orchestrator should send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub seq: Seq,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct SearchExecutor {
    pending: Option<SearchRequest>,
    outcome: Option<SearchOutcome>,
}

impl SearchExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a search. The caller also fires a usage record for the same text;
    /// that side effect never flows back here.
    pub fn execute(&mut self, seq: Seq, text: impl Into<String>) -> SearchRequest {
        let request = SearchRequest {
            seq,
            text: text.into(),
        };
        self.pending = Some(request.clone());
        request
    }

    /// Apply a search response. Returns `false` when it was discarded.
    pub fn receive(
        &mut self,
        seq: Seq,
        result: Result<Vec<Course>, BackendError>,
        store: &QueryStore,
    ) -> bool {
        let text = match &self.pending {
            Some(pending) if pending.seq == seq && store.is_current(seq) => pending.text.clone(),
            _ => {
                tracing::debug!(
                    "Discarding stale search results (seq {}, current {})",
                    seq,
                    store.seq()
                );
                return false;
            }
        };
        self.pending = None;

        self.outcome = Some(match result {
            Ok(courses) => {
                tracing::debug!("Search for '{}' found {} courses", text, courses.len());
                SearchOutcome::found(text, courses)
            }
            Err(e) => {
                tracing::warn!("Search for '{}' failed: {}", text, e);
                SearchOutcome::failed(text)
            }
        });
        true
    }

    /// The latest outcome, only if it was produced for `query`
    pub fn outcome_for(&self, query: &str) -> Option<&SearchOutcome> {
        self.outcome.as_ref().filter(|o| o.snapshot == query)
    }

    /// Text to search again when the last attempt for `query` failed
    pub fn retry_target(&self, query: &str) -> Option<&str> {
        self.outcome_for(query)
            .filter(|o| o.failed)
            .map(|o| o.snapshot.as_str())
    }

    /// Drop the in-flight request; its response would be stale anyway
    pub fn abandon_pending(&mut self) {
        self.pending = None;
    }

    pub fn reset(&mut self) {
        self.pending = None;
        self.outcome = None;
    }
}
