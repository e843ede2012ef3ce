//! Backend collaborator contract
//!
//! The session never talks to the network directly. It emits effects which the
//! orchestrator turns into calls on a [`CourseBackend`]. [`HttpBackend`] is the
//! production implementation; tests plug in scripted backends.

pub mod http;
pub mod wire;

use std::future::Future;
use std::time::Duration;

use crate::error::{BackendError, Operation};
use crate::model::{Course, SpellCheck, TrendingSearch};

pub use http::HttpBackend;

/// The round-trips the client depends on
pub trait CourseBackend: Send + Sync + 'static {
    /// Completions for a partially typed word
    fn suggest(&self, word: &str)
    -> impl Future<Output = Result<Vec<String>, BackendError>> + Send;

    /// Spelling verdict for a submitted query
    fn validate_spelling(
        &self,
        word: &str,
    ) -> impl Future<Output = Result<SpellCheck, BackendError>> + Send;

    /// Courses matching a validated query
    fn search(&self, text: &str) -> impl Future<Output = Result<Vec<Course>, BackendError>> + Send;

    /// Usage-frequency bookkeeping; the response carries no data
    fn record_usage(&self, word: &str) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// One page of the default catalog, `page` starting at 1
    fn catalog_page(
        &self,
        page: u32,
        size: u32,
    ) -> impl Future<Output = Result<Vec<Course>, BackendError>> + Send;

    /// Keywords by how often they were searched, most searched first
    fn trending(&self) -> impl Future<Output = Result<Vec<TrendingSearch>, BackendError>> + Send;
}

/// Bounds `request` by `limit`, turning an elapsed deadline into [`BackendError::Timeout`]
pub async fn with_deadline<T, F>(
    operation: Operation,
    limit: Duration,
    request: F,
) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    match tokio::time::timeout(limit, request).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout {
            operation,
            after: limit,
        }),
    }
}
