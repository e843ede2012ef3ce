//! JSON request/response bodies exchanged with the course backend.
//!
//! Field names here are the contract; everything is mapped into
//! [`crate::model`] types before it reaches the session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Course, Price, SpellCheck, TrendingSearch};
use crate::util::deserialize_spelling_verdict;

/// Body of the suggest, spellcheck and record-usage requests
#[derive(Debug, Serialize)]
pub struct WordRequest<'a> {
    pub word: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub search: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SuggestResponse {
    #[serde(default)]
    pub completions: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellCheckResponse {
    #[serde(deserialize_with = "deserialize_spelling_verdict")]
    pub spelt_correctly: bool,
    #[serde(default)]
    pub corrected_word: Option<String>,
}

impl From<SpellCheckResponse> for SpellCheck {
    fn from(response: SpellCheckResponse) -> Self {
        let suggestion = response
            .corrected_word
            .map(|word| word.trim().to_string())
            .filter(|word| !word.is_empty());
        SpellCheck {
            is_correct: response.spelt_correctly,
            suggestion,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub courses_found: Vec<WireCourse>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub courses: Vec<WireCourse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingResponse {
    #[serde(default)]
    pub trending_searches: Vec<WireTrending>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTrending {
    pub keyword: String,
    #[serde(default)]
    pub search_count: u64,
    #[serde(default)]
    pub last_searched: Option<String>,
}

impl From<WireTrending> for TrendingSearch {
    fn from(wire: WireTrending) -> Self {
        TrendingSearch {
            keyword: wire.keyword.trim().to_string(),
            search_count: wire.search_count,
            last_searched: non_empty(wire.last_searched),
        }
    }
}

/// A course as the backend sends it. Older backends only carry
/// `university`/`type` instead of `platform`/`instructor`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCourse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<WireCourse> for Course {
    fn from(wire: WireCourse) -> Self {
        let title = non_empty(wire.title).unwrap_or_default();
        let url = non_empty(wire.url).or(non_empty(wire.link));
        let university = non_empty(wire.university);

        let platform = non_empty(wire.platform)
            .or_else(|| university.clone())
            .or(non_empty(wire.kind))
            .unwrap_or_else(|| "Unknown".to_string());
        let instructor = non_empty(wire.instructor)
            .or(university)
            .unwrap_or_else(|| "Unknown".to_string());

        let id = match wire.id {
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => url.clone().unwrap_or_else(|| title.clone()),
        };

        Course {
            id,
            title,
            platform,
            instructor,
            rating: wire.rating,
            price: wire.price,
            url,
            category: non_empty(wire.category).unwrap_or_else(|| "General".to_string()),
            details: wire.extra,
        }
    }
}
