//! # Query session
//!
//! The orchestration state machine behind the search box. [`QuerySession`]
//! owns every component and is mutated only through named actions. Each
//! action returns the [`Effect`]s (network requests) to run; their results
//! come back as [`Completion`]s. Nothing here touches the network, so every
//! interleaving of responses can be replayed deterministically.

pub mod autocomplete;
pub mod pagination;
pub mod query;
pub mod search;
pub mod spellcheck;
pub mod view;

use crate::config::ClientConfig;
use crate::error::BackendError;
use crate::filters::ResultFilters;
use crate::model::{Course, SpellCheck};

use autocomplete::AutocompleteCoordinator;
use pagination::{PageRequest, PaginationController};
use query::{QueryStore, Seq};
use search::SearchExecutor;
use spellcheck::{GateDecision, SpellCheckGate};
use view::{ViewInputs, ViewState};

/// A user-initiated action
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Mount,
    SetQuery(String),
    Submit,
    /// Replace the query and submit it in one step, without a suggestion lookup
    SubmitText(String),
    AcceptSuggestion(usize),
    AcceptCorrection,
    DismissSuggestions,
    Retry,
    NextPage,
    PrevPage,
    GoToPage(u32),
    SetFilters(ResultFilters),
}

impl Intent {
    pub fn discriminant(&self) -> &'static str {
        use Intent::*;
        match self {
            Mount => "Mount",
            SetQuery(..) => "SetQuery",
            Submit => "Submit",
            SubmitText(..) => "SubmitText",
            AcceptSuggestion(..) => "AcceptSuggestion",
            AcceptCorrection => "AcceptCorrection",
            DismissSuggestions => "DismissSuggestions",
            Retry => "Retry",
            NextPage => "NextPage",
            PrevPage => "PrevPage",
            GoToPage(..) => "GoToPage",
            SetFilters(..) => "SetFilters",
        }
    }
}

/// A network request that finished (or failed, or timed out)
#[derive(Debug)]
pub enum Completion {
    Suggestions {
        seq: Seq,
        result: Result<Vec<String>, BackendError>,
    },
    Validation {
        seq: Seq,
        result: Result<SpellCheck, BackendError>,
    },
    Search {
        seq: Seq,
        result: Result<Vec<Course>, BackendError>,
    },
    Page {
        page: u32,
        result: Result<Vec<Course>, BackendError>,
    },
}

impl Completion {
    pub fn discriminant(&self) -> &'static str {
        match self {
            Completion::Suggestions { .. } => "Suggestions",
            Completion::Validation { .. } => "Validation",
            Completion::Search { .. } => "Search",
            Completion::Page { .. } => "Page",
        }
    }
}

/// A request the session wants performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Suggest { seq: Seq, word: String },
    Validate { seq: Seq, word: String },
    Search { seq: Seq, text: String },
    /// Fire-and-forget; its outcome never comes back to the session
    RecordUsage { word: String },
    FetchPage { page: u32, size: u32 },
}

impl From<PageRequest> for Effect {
    fn from(request: PageRequest) -> Self {
        Effect::FetchPage {
            page: request.page,
            size: request.size,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuerySession {
    query: QueryStore,
    autocomplete: AutocompleteCoordinator,
    gate: SpellCheckGate,
    search: SearchExecutor,
    pagination: PaginationController,
    filters: ResultFilters,
}

impl QuerySession {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            query: QueryStore::new(),
            autocomplete: AutocompleteCoordinator::new(),
            gate: SpellCheckGate::new(config.spell_failure_policy),
            search: SearchExecutor::new(),
            pagination: PaginationController::new(config.page_size),
            filters: ResultFilters::default(),
        }
    }

    pub fn query(&self) -> &QueryStore {
        &self.query
    }

    pub fn filters(&self) -> &ResultFilters {
        &self.filters
    }

    pub fn pagination(&self) -> &PaginationController {
        &self.pagination
    }

    pub fn view(&self) -> ViewState {
        view::compose(&ViewInputs {
            query: &self.query,
            autocomplete: &self.autocomplete,
            gate: &self.gate,
            search: &self.search,
            pagination: &self.pagination,
            filters: &self.filters,
        })
    }

    /// Dispatch a user intent to its named action
    pub fn apply(&mut self, intent: Intent) -> Vec<Effect> {
        match intent {
            Intent::Mount => self.mount(),
            Intent::SetQuery(text) => self.set_query(text),
            Intent::Submit => self.submit(),
            Intent::SubmitText(text) => self.submit_text(text),
            Intent::AcceptSuggestion(index) => self.accept_suggestion(index),
            Intent::AcceptCorrection => self.accept_correction(),
            Intent::DismissSuggestions => {
                self.autocomplete.dismiss();
                Vec::new()
            }
            Intent::Retry => self.retry(),
            Intent::NextPage => self.next_page(),
            Intent::PrevPage => self.prev_page(),
            Intent::GoToPage(page) => self.change_page(page),
            Intent::SetFilters(filters) => {
                self.filters = filters;
                Vec::new()
            }
        }
    }

    /// Route a finished request to the component that issued it
    pub fn complete(&mut self, completion: Completion) -> Vec<Effect> {
        match completion {
            Completion::Suggestions { seq, result } => {
                self.receive_suggestions(seq, result);
                Vec::new()
            }
            Completion::Validation { seq, result } => self.receive_validation(seq, result),
            Completion::Search { seq, result } => {
                self.receive_search(seq, result);
                Vec::new()
            }
            Completion::Page { page, result } => {
                self.receive_page(page, result);
                Vec::new()
            }
        }
    }

    /// Initial catalog load
    pub fn mount(&mut self) -> Vec<Effect> {
        if !self.query.is_empty() {
            return Vec::new();
        }
        vec![self.pagination.reset_to_first().into()]
    }

    pub fn set_query(&mut self, text: impl Into<String>) -> Vec<Effect> {
        let change = self.query.set_query(text);

        // Anything in flight for the previous seq can no longer be applied
        self.gate.abandon_pending();
        self.search.abandon_pending();
        if change.changed {
            self.gate.reset();
        }

        if change.became_empty {
            self.autocomplete.clear();
            self.gate.reset();
            self.search.reset();
            return vec![self.pagination.reset_to_first().into()];
        }

        self.autocomplete
            .on_query_change(&self.query)
            .map(|request| Effect::Suggest {
                seq: request.seq,
                word: request.word,
            })
            .into_iter()
            .collect()
    }

    /// Explicit submission of the current text
    pub fn submit(&mut self) -> Vec<Effect> {
        let text = self.query.text().to_string();
        self.submit_text(text)
    }

    /// Submit `text`, replacing the query first if it differs. Whitespace-only
    /// text is ignored.
    pub fn submit_text(&mut self, text: impl Into<String>) -> Vec<Effect> {
        let text = text.into();
        if text.trim().is_empty() {
            return Vec::new();
        }

        if text != self.query.text() {
            self.query.set_query(text.clone());
        }
        let seq = self.query.commit();

        self.autocomplete.clear();
        self.search.abandon_pending();
        let request = self.gate.begin(seq, text);
        vec![Effect::Validate {
            seq: request.seq,
            word: request.word,
        }]
    }

    pub fn accept_suggestion(&mut self, index: usize) -> Vec<Effect> {
        match self.autocomplete.accept(index) {
            Some(text) => self.submit_text(text),
            None => Vec::new(),
        }
    }

    /// Re-run the whole gate with the offered correction
    pub fn accept_correction(&mut self) -> Vec<Effect> {
        match self.gate.accept_correction() {
            Some(text) => self.submit_text(text),
            None => Vec::new(),
        }
    }

    /// Search again after a failed search, or re-submit after a blocked one
    pub fn retry(&mut self) -> Vec<Effect> {
        if let Some(text) = self.gate.blocked_text().map(str::to_string) {
            return self.submit_text(text);
        }
        match self.search.retry_target(self.query.text()).map(str::to_string) {
            Some(text) => self.start_search(self.query.seq(), text),
            None => Vec::new(),
        }
    }

    pub fn receive_suggestions(&mut self, seq: Seq, result: Result<Vec<String>, BackendError>) {
        self.autocomplete.receive(seq, result, &self.query);
    }

    pub fn receive_validation(
        &mut self,
        seq: Seq,
        result: Result<SpellCheck, BackendError>,
    ) -> Vec<Effect> {
        match self.gate.receive(seq, result, &self.query) {
            GateDecision::Proceed { seq, text } => self.start_search(seq, text),
            GateDecision::Correction { .. } | GateDecision::Blocked | GateDecision::Stale => {
                Vec::new()
            }
        }
    }

    pub fn receive_search(&mut self, seq: Seq, result: Result<Vec<Course>, BackendError>) {
        self.search.receive(seq, result, &self.query);
    }

    pub fn receive_page(&mut self, page: u32, result: Result<Vec<Course>, BackendError>) {
        self.pagination.receive(page, result);
    }

    /// Jump to `page`; paging only happens while the query is empty
    pub fn change_page(&mut self, page: u32) -> Vec<Effect> {
        if !self.query.is_empty() {
            return Vec::new();
        }
        vec![self.pagination.go_to_page(page).into()]
    }

    pub fn next_page(&mut self) -> Vec<Effect> {
        if !self.query.is_empty() {
            return Vec::new();
        }
        vec![self.pagination.next().into()]
    }

    pub fn prev_page(&mut self) -> Vec<Effect> {
        if !self.query.is_empty() {
            return Vec::new();
        }
        self.pagination.prev().map(Effect::from).into_iter().collect()
    }

    fn start_search(&mut self, seq: Seq, text: String) -> Vec<Effect> {
        let request = self.search.execute(seq, text);
        vec![
            Effect::Search {
                seq: request.seq,
                text: request.text.clone(),
            },
            Effect::RecordUsage { word: request.text },
        ]
    }
}
