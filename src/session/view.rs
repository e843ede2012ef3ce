//! The single renderable state derived from all session components.

use serde::Serialize;

use crate::filters::ResultFilters;
use crate::model::Course;
use crate::session::autocomplete::AutocompleteCoordinator;
use crate::session::pagination::PaginationController;
use crate::session::query::QueryStore;
use crate::session::search::SearchExecutor;
use crate::session::spellcheck::{GatePhase, SpellCheckGate};

/// Exactly one of these is shown at any time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    Idle,
    AutocompleteVisible {
        suggestions: Vec<String>,
    },
    Loading {
        query: String,
    },
    CorrectionNeeded {
        original: String,
        suggestion: String,
    },
    Blocked {
        query: String,
        reason: String,
    },
    ResultsReady {
        query: String,
        /// Courses left after filtering
        courses: Vec<Course>,
        /// Courses the backend returned before filtering
        total: usize,
        /// The search failed; offer to run it again
        retryable: bool,
    },
    DefaultListing {
        page: u32,
        items: Vec<Course>,
    },
}

impl ViewState {
    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::AutocompleteVisible { .. } => "autocomplete_visible",
            ViewState::Loading { .. } => "loading",
            ViewState::CorrectionNeeded { .. } => "correction_needed",
            ViewState::Blocked { .. } => "blocked",
            ViewState::ResultsReady { .. } => "results_ready",
            ViewState::DefaultListing { .. } => "default_listing",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading { .. })
    }
}

/// Borrowed view of every component the composition reads
pub struct ViewInputs<'a> {
    pub query: &'a QueryStore,
    pub autocomplete: &'a AutocompleteCoordinator,
    pub gate: &'a SpellCheckGate,
    pub search: &'a SearchExecutor,
    pub pagination: &'a PaginationController,
    pub filters: &'a ResultFilters,
}

/// Pure precedence rules; the components normally keep these mutually
/// exclusive, the order only matters if they ever disagree.
pub fn compose(inputs: &ViewInputs<'_>) -> ViewState {
    let query = inputs.query.text();

    if query.is_empty() {
        let page = inputs.pagination.page();
        return ViewState::DefaultListing {
            page: page.number,
            items: page.items.clone(),
        };
    }

    if inputs.gate.is_validating() || inputs.search.is_pending() {
        return ViewState::Loading {
            query: query.to_string(),
        };
    }

    match inputs.gate.phase() {
        GatePhase::CorrectionNeeded {
            original,
            suggestion,
        } => {
            return ViewState::CorrectionNeeded {
                original: original.clone(),
                suggestion: suggestion.clone(),
            };
        }
        GatePhase::Blocked { text, reason } => {
            return ViewState::Blocked {
                query: text.clone(),
                reason: reason.clone(),
            };
        }
        GatePhase::Idle | GatePhase::Validating { .. } => {}
    }

    let autocomplete = inputs.autocomplete;
    if autocomplete.is_visible() && !autocomplete.suggestions().is_empty() {
        return ViewState::AutocompleteVisible {
            suggestions: autocomplete.suggestions().to_vec(),
        };
    }

    if let Some(outcome) = inputs.search.outcome_for(query) {
        return ViewState::ResultsReady {
            query: outcome.snapshot.clone(),
            courses: inputs.filters.apply(&outcome.courses),
            total: outcome.courses.len(),
            retryable: outcome.failed,
        };
    }

    ViewState::Idle
}
