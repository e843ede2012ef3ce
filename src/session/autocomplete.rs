//! Suggestion lookup driven by query edits.
//!
//! A request is tagged with the sequence number of the edit that issued it.
//! Responses are applied only while that tag is still the store's current one,
//! so out-of-order arrivals during fast typing never reach the view.

use crate::config::{MAX_VISIBLE_SUGGESTIONS, MIN_SUGGEST_LEN};
use crate::error::BackendError;
use crate::session::query::{QueryStore, Seq};

/// A suggestion request the orchestrator should send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestRequest {
    pub seq: Seq,
    pub word: String,
}

#[derive(Debug, Clone, Default)]
pub struct AutocompleteCoordinator {
    suggestions: Vec<String>,
    visible: bool,
    in_flight: Option<Seq>,
}

impl AutocompleteCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn in_flight(&self) -> Option<Seq> {
        self.in_flight
    }

    /// Hide and forget everything, including the outstanding request
    pub fn clear(&mut self) {
        self.suggestions.clear();
        self.visible = false;
        self.in_flight = None;
    }

    /// Hide the list (e.g. the input lost focus) without touching the query
    pub fn dismiss(&mut self) {
        self.visible = false;
    }

    /// React to a query edit; returns the request to issue, if any.
    ///
    /// The list shown for the previous text is hidden at once; nothing is
    /// visible again until the new request answers.
    pub fn on_query_change(&mut self, store: &QueryStore) -> Option<SuggestRequest> {
        self.clear();
        if store.len_chars() < MIN_SUGGEST_LEN || store.is_suppressed() {
            return None;
        }

        self.in_flight = Some(store.seq());
        Some(SuggestRequest {
            seq: store.seq(),
            word: store.text().to_string(),
        })
    }

    /// Apply a suggestion response. Returns `false` when it was discarded.
    pub fn receive(
        &mut self,
        seq: Seq,
        result: Result<Vec<String>, BackendError>,
        store: &QueryStore,
    ) -> bool {
        if !store.is_current(seq) || store.is_suppressed() || self.in_flight != Some(seq) {
            tracing::debug!(
                "Discarding stale suggestions (seq {}, current {})",
                seq,
                store.seq()
            );
            return false;
        }
        self.in_flight = None;

        match result {
            Ok(mut suggestions) => {
                suggestions.retain(|s| !s.trim().is_empty());
                suggestions.truncate(MAX_VISIBLE_SUGGESTIONS);
                self.suggestions = suggestions;
                self.visible = true;
            }
            Err(e) => {
                tracing::warn!("Suggestion lookup failed, hiding suggestions: {}", e);
                self.suggestions.clear();
                self.visible = false;
            }
        }
        true
    }

    /// Take the suggestion at `index` for submission, clearing the list.
    /// A hidden list cannot be picked from.
    pub fn accept(&mut self, index: usize) -> Option<String> {
        if !self.visible {
            return None;
        }
        let accepted = self.suggestions.get(index).cloned()?;
        self.clear();
        Some(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Operation;

    fn typed(text: &str) -> QueryStore {
        let mut store = QueryStore::new();
        store.set_query(text);
        store
    }

    #[test]
    fn test_short_query_issues_nothing() {
        let mut coordinator = AutocompleteCoordinator::new();
        assert_eq!(coordinator.on_query_change(&typed("p")), None);
        assert_eq!(coordinator.on_query_change(&typed("")), None);
        assert!(!coordinator.is_visible());
    }

    #[test]
    fn test_two_chars_issue_request() {
        let mut coordinator = AutocompleteCoordinator::new();
        let store = typed("py");
        let request = coordinator.on_query_change(&store).unwrap();
        assert_eq!(request.word, "py");
        assert_eq!(request.seq, store.seq());
    }

    #[test]
    fn test_suppressed_query_issues_nothing() {
        let mut coordinator = AutocompleteCoordinator::new();
        let mut store = typed("python");
        store.commit();
        assert_eq!(coordinator.on_query_change(&store), None);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut coordinator = AutocompleteCoordinator::new();
        let mut store = QueryStore::new();
        store.set_query("py");
        let old = coordinator.on_query_change(&store).unwrap();
        store.set_query("pyt");
        coordinator.on_query_change(&store).unwrap();

        assert!(!coordinator.receive(old.seq, Ok(vec!["python".into()]), &store));
        assert!(coordinator.suggestions().is_empty());
    }

    #[test]
    fn test_current_response_is_applied_and_capped() {
        let mut coordinator = AutocompleteCoordinator::new();
        let store = typed("py");
        let request = coordinator.on_query_change(&store).unwrap();
        let many: Vec<String> = (0..8).map(|i| format!("python {i}")).collect();

        assert!(coordinator.receive(request.seq, Ok(many), &store));
        assert!(coordinator.is_visible());
        assert_eq!(coordinator.suggestions().len(), MAX_VISIBLE_SUGGESTIONS);
    }

    #[test]
    fn test_failure_degrades_silently() {
        let mut coordinator = AutocompleteCoordinator::new();
        let store = typed("py");
        let request = coordinator.on_query_change(&store).unwrap();
        let err = BackendError::Status {
            operation: Operation::Suggest,
            status: 500,
        };

        assert!(coordinator.receive(request.seq, Err(err), &store));
        assert!(!coordinator.is_visible());
        assert!(coordinator.suggestions().is_empty());
    }

    #[test]
    fn test_accept_clears_list() {
        let mut coordinator = AutocompleteCoordinator::new();
        let store = typed("py");
        let request = coordinator.on_query_change(&store).unwrap();
        coordinator.receive(request.seq, Ok(vec!["python".into(), "pytorch".into()]), &store);

        assert_eq!(coordinator.accept(1).as_deref(), Some("pytorch"));
        assert!(!coordinator.is_visible());
        assert!(coordinator.suggestions().is_empty());
        assert_eq!(coordinator.accept(0), None);
    }

    #[test]
    fn test_new_request_hides_previous_list() {
        let mut coordinator = AutocompleteCoordinator::new();
        let mut store = typed("py");
        let request = coordinator.on_query_change(&store).unwrap();
        coordinator.receive(request.seq, Ok(vec!["python".into()]), &store);
        assert!(coordinator.is_visible());

        store.set_query("java");
        assert!(coordinator.on_query_change(&store).is_some());
        assert!(!coordinator.is_visible());
        assert!(coordinator.suggestions().is_empty());
        assert_eq!(coordinator.accept(0), None);
    }

    #[test]
    fn test_dismissed_list_cannot_be_accepted() {
        let mut coordinator = AutocompleteCoordinator::new();
        let store = typed("py");
        let request = coordinator.on_query_change(&store).unwrap();
        coordinator.receive(request.seq, Ok(vec!["python".into()]), &store);

        coordinator.dismiss();
        assert_eq!(coordinator.accept(0), None);
    }
}
