//! Backend failure taxonomy
//!
//! Every variant is recoverable: session components degrade locally on any of
//! them and never let one escape into the view.

use std::time::Duration;

use thiserror::Error;

/// The backend round-trips the client performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Suggest,
    Validate,
    Search,
    RecordUsage,
    CatalogPage,
    Trending,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Suggest => "suggest",
            Operation::Validate => "validate_spelling",
            Operation::Search => "search",
            Operation::RecordUsage => "record_usage",
            Operation::CatalogPage => "catalog_page",
            Operation::Trending => "trending",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} returned HTTP {status}")]
    Status { operation: Operation, status: u16 },

    #[error("{operation} returned a malformed body: {detail}")]
    Malformed { operation: Operation, detail: String },

    #[error("{operation} did not answer within {after:?}")]
    Timeout { operation: Operation, after: Duration },

    #[error("{operation} is unavailable: {reason}")]
    Unavailable { operation: Operation, reason: String },
}

impl BackendError {
    pub fn operation(&self) -> Operation {
        match self {
            BackendError::Transport { operation, .. }
            | BackendError::Status { operation, .. }
            | BackendError::Malformed { operation, .. }
            | BackendError::Timeout { operation, .. }
            | BackendError::Unavailable { operation, .. } => *operation,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Timeout { .. })
    }
}
