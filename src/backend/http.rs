//! HTTP/JSON implementation of [`CourseBackend`]

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::backend::CourseBackend;
use crate::backend::wire::{
    CatalogResponse, SearchRequest, SearchResponse, SpellCheckResponse, SuggestResponse,
    TrendingResponse, WordRequest,
};
use crate::config::ClientConfig;
use crate::error::{BackendError, Operation};
use crate::model::{Course, SpellCheck, TrendingSearch, rank_trending};

const SUGGEST_PATH: &str = "/autocomplete";
const SPELLCHECK_PATH: &str = "/spellcheck";
const SEARCH_PATH: &str = "/search";
const RECORD_USAGE_PATH: &str = "/frequency";
const CATALOG_PATH: &str = "/courses";
const TRENDING_PATH: &str = "/courses/search-frequency";

/// Talks to the course backend over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend rooted at `config.base_url`
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Self::build_http_client(config)?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build the HTTP client with proper configuration
    fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client> {
        let user_agent = Self::format_user_agent();

        tracing::info!("Creating HTTP client with User-Agent: {}", user_agent);

        // The orchestrator applies its own deadline; this one only stops leaked sockets.
        reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(config.request_timeout * 2)
            .build()
            .context("Failed to create HTTP client")
    }

    fn format_user_agent() -> String {
        format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, R>(&self, operation: Operation, path: &str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!("POST {} ({})", url, operation);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| BackendError::Transport { operation, source })?;

        Self::decode(operation, response).await
    }

    async fn decode<R: DeserializeOwned>(
        operation: Operation,
        response: reqwest::Response,
    ) -> Result<R, BackendError> {
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                operation,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| BackendError::Transport { operation, source })?;

        serde_json::from_slice(&bytes).map_err(|e| BackendError::Malformed {
            operation,
            detail: e.to_string(),
        })
    }
}

impl CourseBackend for HttpBackend {
    async fn suggest(&self, word: &str) -> Result<Vec<String>, BackendError> {
        let response: SuggestResponse = self
            .post_json(Operation::Suggest, SUGGEST_PATH, &WordRequest { word })
            .await?;
        Ok(response.completions)
    }

    async fn validate_spelling(&self, word: &str) -> Result<SpellCheck, BackendError> {
        let response: SpellCheckResponse = self
            .post_json(Operation::Validate, SPELLCHECK_PATH, &WordRequest { word })
            .await?;
        Ok(response.into())
    }

    async fn search(&self, text: &str) -> Result<Vec<Course>, BackendError> {
        let response: SearchResponse = self
            .post_json(Operation::Search, SEARCH_PATH, &SearchRequest { search: text })
            .await?;
        Ok(response.courses_found.into_iter().map(Course::from).collect())
    }

    async fn record_usage(&self, word: &str) -> Result<(), BackendError> {
        let operation = Operation::RecordUsage;
        let url = self.url(RECORD_USAGE_PATH);
        tracing::debug!("POST {} ({})", url, operation);

        // The acknowledgement body is ignored.
        let response = self
            .client
            .post(&url)
            .json(&WordRequest { word })
            .send()
            .await
            .map_err(|source| BackendError::Transport { operation, source })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Status {
                operation,
                status: response.status().as_u16(),
            })
        }
    }

    async fn catalog_page(&self, page: u32, size: u32) -> Result<Vec<Course>, BackendError> {
        let operation = Operation::CatalogPage;
        let url = self.url(CATALOG_PATH);
        tracing::debug!("GET {}?page={}&size={}", url, page, size);

        let response = self
            .client
            .get(&url)
            .query(&[("page", page), ("size", size)])
            .send()
            .await
            .map_err(|source| BackendError::Transport { operation, source })?;

        let body: CatalogResponse = Self::decode(operation, response).await?;
        Ok(body.courses.into_iter().map(Course::from).collect())
    }

    async fn trending(&self) -> Result<Vec<TrendingSearch>, BackendError> {
        let operation = Operation::Trending;
        let url = self.url(TRENDING_PATH);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| BackendError::Transport { operation, source })?;

        let body: TrendingResponse = Self::decode(operation, response).await?;
        Ok(rank_trending(
            body.trending_searches
                .into_iter()
                .map(TrendingSearch::from)
                .collect(),
        ))
    }
}
