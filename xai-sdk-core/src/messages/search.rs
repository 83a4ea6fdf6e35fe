//! Live search parameters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::XaiError;

wire_enum! {
    /// When the model should search.
    pub enum SearchMode {
        /// Unset.
        #[default]
        Invalid = 0 => "INVALID_SEARCH_MODE",
        /// Never search.
        Off = 1 => "OFF_SEARCH_MODE",
        /// Always search.
        On = 2 => "ON_SEARCH_MODE",
        /// The model decides.
        Auto = 3 => "AUTO_SEARCH_MODE",
    }
}

impl FromStr for SearchMode {
    type Err = XaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            other => Self::from_str_name(other.to_ascii_uppercase().as_str())
                .ok_or_else(|| XaiError::validation(format!("unknown search mode `{s}`"))),
        }
    }
}

/// Web source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSource {
    /// ISO alpha-2 country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Sites never searched.
    pub excluded_websites: Vec<String>,
    /// Sites searched exclusively.
    pub allowed_websites: Vec<String>,
    /// Filter unsafe content.
    pub safe_search: bool,
}

/// News source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSource {
    /// ISO alpha-2 country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Sites never searched.
    pub excluded_websites: Vec<String>,
    /// Filter unsafe content.
    pub safe_search: bool,
}

/// X source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XSource {
    /// Handles searched exclusively.
    pub included_x_handles: Vec<String>,
    /// Handles never searched.
    pub excluded_x_handles: Vec<String>,
    /// Minimum favorites per post.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_favorite_count: Option<i32>,
    /// Minimum views per post.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_view_count: Option<i32>,
}

/// RSS source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RssSource {
    /// Feed URLs.
    pub links: Vec<String>,
}

/// A data source for live search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// The web.
    Web(WebSource),
    /// News sites.
    News(NewsSource),
    /// X posts.
    X(XSource),
    /// RSS feeds.
    Rss(RssSource),
}

/// Live search configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParameters {
    /// When to search.
    pub mode: SearchMode,
    /// Where to search. Empty means the server defaults.
    pub sources: Vec<Source>,
    /// Earliest result date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<DateTime<Utc>>,
    /// Latest result date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<DateTime<Utc>>,
    /// Return citations for the sources used.
    pub return_citations: bool,
    /// Cap on results considered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_search_results: Option<i32>,
}

impl SearchParameters {
    /// Search parameters with the given mode.
    pub fn new(mode: SearchMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Add a source.
    #[must_use]
    pub fn with_source(mut self, source: Source) -> Self {
        self.sources.push(source);
        self
    }

    /// Restrict results to a date range.
    #[must_use]
    pub fn with_date_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.from_date = from;
        self.to_date = to;
        self
    }

    /// Ask for citations.
    #[must_use]
    pub fn with_citations(mut self, enabled: bool) -> Self {
        self.return_citations = enabled;
        self
    }

    /// Cap the number of results.
    #[must_use]
    pub fn with_max_results(mut self, max: i32) -> Self {
        self.max_search_results = Some(max);
        self
    }
}
