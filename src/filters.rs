//! Client-side narrowing of search results.
//!
//! Filters never trigger a new search; they only change which of the
//! courses in a `ResultsReady` view are shown.

use serde::{Deserialize, Serialize};

use crate::model::Course;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceFilter {
    #[default]
    All,
    Free,
    Paid,
}

impl std::str::FromStr for PriceFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "any" => Ok(PriceFilter::All),
            "free" => Ok(PriceFilter::Free),
            "paid" => Ok(PriceFilter::Paid),
            other => anyhow::bail!("Unknown price filter '{}': expected all, free or paid", other),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultFilters {
    /// Accepted platforms; empty accepts every platform
    #[serde(default)]
    pub platforms: Vec<String>,
    /// Required category; `None` accepts every category
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: PriceFilter,
    /// Courses without a rating never pass a rating filter
    #[serde(default)]
    pub min_rating: Option<f32>,
}

impl ResultFilters {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Add `platform` if absent, remove it if present
    pub fn toggle_platform(&mut self, platform: &str) {
        if let Some(pos) = self
            .platforms
            .iter()
            .position(|p| p.eq_ignore_ascii_case(platform))
        {
            self.platforms.remove(pos);
        } else {
            self.platforms.push(platform.to_string());
        }
    }

    pub fn matches(&self, course: &Course) -> bool {
        if !self.platforms.is_empty()
            && !self
                .platforms
                .iter()
                .any(|p| p.eq_ignore_ascii_case(&course.platform))
        {
            return false;
        }

        if let Some(category) = &self.category
            && !category.eq_ignore_ascii_case(&course.category)
        {
            return false;
        }

        match self.price {
            PriceFilter::All => {}
            PriceFilter::Free if !course.is_free() => return false,
            PriceFilter::Paid if course.is_free() => return false,
            _ => {}
        }

        if let Some(min) = self.min_rating {
            match course.rating {
                Some(rating) if rating >= min => {}
                _ => return false,
            }
        }

        true
    }

    pub fn apply(&self, courses: &[Course]) -> Vec<Course> {
        courses.iter().filter(|c| self.matches(c)).cloned().collect()
    }
}
