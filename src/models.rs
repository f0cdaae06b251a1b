//! Data types exchanged with the recommendation service plus the small pieces
//! of client state the UI persists. Records coming off the wire are treated as
//! read-only views: the UI renders them but never writes them back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

/// Result count used when the user leaves the count field blank.
pub const DEFAULT_COUNT: u32 = 10;
/// Upper bound the recommendation endpoint accepts for `count`.
pub const MAX_COUNT: u32 = 20;
/// Longest title the recommendation endpoint accepts.
pub const MAX_TITLE_LEN: usize = 100;

/// A single search submission. Built fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationQuery {
    pub title: String,
    pub count: u32,
}

impl RecommendationQuery {
    pub fn new(title: impl Into<String>, count: u32) -> Self {
        Self {
            title: title.into(),
            count,
        }
    }
}

/// One manga entry as returned by the service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecommendationRecord {
    pub title: String,
    /// Similarity score. Nominally in `[0, 1]`, though boosted scores from the
    /// service can exceed 1.
    pub score: f64,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    /// The service sends `""` when it has no image; that is folded into `None`.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub image_url: Option<String>,
}

/// Body of a successful `/recommend/` call. A missing or `null` list reads
/// the same as an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub recommendations: Vec<RecommendationRecord>,
}

/// Body of a successful `/recommend/fetch` call.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchResponse {
    pub message: String,
}

/// Outcome of a recommendation request that reached the server and was not a
/// failure. A 404 is a normal "nothing matched" answer rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendOutcome {
    Found(Vec<RecommendationRecord>),
    NotFound,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|url| !url.trim().is_empty()))
}

/// Light or dark color scheme, persisted under a fixed preference key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemePreference {
    Dark,
    #[default]
    Light,
}

impl ThemePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Dark => "dark",
            ThemePreference::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemePreference::Dark => ThemePreference::Light,
            ThemePreference::Light => ThemePreference::Dark,
        }
    }

    /// Glyph shown on the theme toggle: a sun offers the way out of dark mode,
    /// a moon the way into it.
    pub fn toggle_icon(self) -> &'static str {
        match self {
            ThemePreference::Dark => "☀",
            ThemePreference::Light => "☾",
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemePreference {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "dark" => Ok(ThemePreference::Dark),
            "light" => Ok(ThemePreference::Light),
            other => Err(format!("unknown theme preference `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_defaults_missing_tag_lists_and_blank_image() {
        let record: RecommendationRecord =
            serde_json::from_str(r#"{"title":"Bleach","score":0.42,"image_url":""}"#).unwrap();
        assert!(record.genres.is_empty());
        assert!(record.themes.is_empty());
        assert_eq!(record.image_url, None);
    }

    #[test]
    fn record_requires_title_and_score() {
        assert!(serde_json::from_str::<RecommendationRecord>(r#"{"score":0.5}"#).is_err());
        assert!(serde_json::from_str::<RecommendationRecord>(r#"{"title":"Berserk"}"#).is_err());
    }

    #[test]
    fn response_without_list_is_empty() {
        let body: RecommendationResponse = serde_json::from_str("{}").unwrap();
        assert!(body.recommendations.is_empty());

        let body: RecommendationResponse =
            serde_json::from_str(r#"{"recommendations":null}"#).unwrap();
        assert!(body.recommendations.is_empty());
    }

    #[test]
    fn theme_round_trips_through_storage_text() {
        for theme in [ThemePreference::Dark, ThemePreference::Light] {
            assert_eq!(theme.as_str().parse::<ThemePreference>(), Ok(theme));
        }
        assert!("sepia".parse::<ThemePreference>().is_err());
    }
}
