//! Domain types shared by the session, the backend and the console.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A course summary as consumed by the query session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub instructor: String,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub category: String,
    /// Descriptive fields passed through for display only
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
}

impl Course {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_rating(mut self, rating: f32) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    /// A course is free when its price says so; an unknown price is not free
    pub fn is_free(&self) -> bool {
        self.price.as_ref().is_some_and(Price::is_free)
    }
}

/// Course price: backends send either an amount or a label such as `"Free"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(f64),
    Label(String),
}

impl Price {
    pub fn is_free(&self) -> bool {
        match self {
            Price::Amount(amount) => *amount <= 0.0,
            Price::Label(label) => label.trim().eq_ignore_ascii_case("free"),
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Price::Amount(amount) => write!(f, "${amount:.2}"),
            Price::Label(label) => f.write_str(label),
        }
    }
}

/// Verdict of the spelling validator for one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpellCheck {
    pub is_correct: bool,
    pub suggestion: Option<String>,
}

impl SpellCheck {
    pub fn correct() -> Self {
        Self {
            is_correct: true,
            suggestion: None,
        }
    }

    pub fn misspelled(suggestion: impl Into<String>) -> Self {
        Self {
            is_correct: false,
            suggestion: Some(suggestion.into()),
        }
    }
}

/// Courses found for a query, stamped with the query text that produced them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub snapshot: String,
    pub courses: Vec<Course>,
    /// Set when the search itself failed; the view offers a retry
    pub failed: bool,
}

impl SearchOutcome {
    pub fn found(snapshot: impl Into<String>, courses: Vec<Course>) -> Self {
        Self {
            snapshot: snapshot.into(),
            courses,
            failed: false,
        }
    }

    pub fn failed(snapshot: impl Into<String>) -> Self {
        Self {
            snapshot: snapshot.into(),
            courses: Vec::new(),
            failed: true,
        }
    }
}

/// One page of the default catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogPage {
    pub number: u32,
    pub size: u32,
    pub items: Vec<Course>,
}

impl CatalogPage {
    pub fn empty(number: u32, size: u32) -> Self {
        Self {
            number: number.max(1),
            size,
            items: Vec::new(),
        }
    }
}

/// How often a keyword has been searched, as reported by the usage counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendingSearch {
    pub keyword: String,
    pub search_count: u64,
    pub last_searched: Option<String>,
}

/// Most searched first; ties keep the backend's order
pub fn rank_trending(mut searches: Vec<TrendingSearch>) -> Vec<TrendingSearch> {
    searches.retain(|s| !s.keyword.trim().is_empty());
    searches.sort_by(|a, b| b.search_count.cmp(&a.search_count));
    searches
}
