//! # Client Configuration Module
//!
//! Tuning constants for the query session and the runtime configuration
//! handed to the orchestrator and the HTTP backend.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Minimum query length (in characters) before suggestions are requested
pub const MIN_SUGGEST_LEN: usize = 2;

/// Maximum number of suggestions kept for display
pub const MAX_VISIBLE_SUGGESTIONS: usize = 5;

/// Default number of courses per catalog page
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Default bound on every backend round-trip
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Default backend base URL
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Capacity of the intent channel between handles and the worker
pub const INTENT_CHANNEL_CAPACITY: usize = 64;

/// What the spell-check gate does when the validation request itself fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellFailurePolicy {
    /// Treat the query as correctly spelled and search anyway
    #[default]
    FailOpen,
    /// Block the search and show the failure with a retry affordance
    FailClosed,
}

impl SpellFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpellFailurePolicy::FailOpen => "fail_open",
            SpellFailurePolicy::FailClosed => "fail_closed",
        }
    }
}

/// Runtime configuration for a query session
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
    /// Upper bound on each request before it degrades like a network failure
    pub request_timeout: Duration,
    /// Number of courses per catalog page
    pub page_size: u32,
    /// Behaviour when spelling validation cannot be reached
    pub spell_failure_policy: SpellFailurePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
            spell_failure_policy: SpellFailurePolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Page size is clamped to at least one course
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_spell_failure_policy(mut self, policy: SpellFailurePolicy) -> Self {
        self.spell_failure_policy = policy;
        self
    }
}
