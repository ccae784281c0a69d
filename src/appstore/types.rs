//! Type definitions for the App Store module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One normalized customer review.
///
/// Field names on the wire follow the public report format, so the body is
/// serialized as `review` and the author as `userName`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Review {
    pub id: String,
    pub title: String,
    #[serde(rename = "review")]
    pub body: String,
    pub rating: u8,
    pub date: String,
    #[serde(rename = "userName")]
    pub author: String,
}

/// The reviews gathered for a single request.
pub type ReviewSample = Vec<Review>;

impl Review {
    /// Maps one raw feed entry into a review.
    ///
    /// Missing sub-fields become empty strings; a missing, non-numeric or
    /// out-of-range rating becomes `0`. Nothing here fails.
    pub fn from_feed_entry(entry: &Value) -> Self {
        Self {
            id: label(entry, &["id"]).to_string(),
            title: label(entry, &["title"]).to_string(),
            body: label(entry, &["content"]).to_string(),
            rating: parse_rating(entry),
            date: label(entry, &["updated"]).to_string(),
            author: label(entry, &["author", "name"]).to_string(),
        }
    }
}

/// Walks `path` and returns the `label` string found there, or "".
fn label<'a>(entry: &'a Value, path: &[&str]) -> &'a str {
    let mut node = entry;
    for key in path {
        match node.get(key) {
            Some(next) => node = next,
            None => return "",
        }
    }
    node.get("label").and_then(Value::as_str).unwrap_or("")
}

fn parse_rating(entry: &Value) -> u8 {
    let raw = entry.get("im:rating").and_then(|r| r.get("label"));
    let rating = match raw {
        Some(Value::String(s)) => s.trim().parse::<u8>().ok(),
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        _ => None,
    };
    rating.filter(|r| (1..=5).contains(r)).unwrap_or(0)
}

/// Result of fetching one feed page.
///
/// Transport and parse failures are reported through `is_error` rather than
/// as an `Err`, so the caller can stop paging without unwinding.
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    pub entries: Vec<Value>,
    pub is_error: bool,
}

impl FeedPage {
    pub fn with_entries(entries: Vec<Value>) -> Self {
        Self {
            entries,
            is_error: false,
        }
    }

    pub fn failed() -> Self {
        Self {
            entries: Vec::new(),
            is_error: true,
        }
    }
}

/// A store that can name an application and serve its review feed.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Returns the best-matching store identifier for `app_name`, or `None`.
    async fn resolve_app_id(&self, app_name: &str, country: &str) -> Option<String>;

    /// Fetches one page (1-based) of raw feed entries.
    async fn fetch_page(&self, app_id: &str, country: &str, page: u32) -> FeedPage;
}

/// Search endpoint payload.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(rename = "resultCount", default)]
    pub result_count: i64,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResult {
    #[serde(rename = "trackId", default)]
    pub track_id: Option<Value>,
}

impl SearchResponse {
    /// The top result's identifier, when the search found anything.
    pub fn top_track_id(&self) -> Option<String> {
        if self.result_count <= 0 {
            return None;
        }
        match self.results.first()?.track_id.as_ref()? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }
}

/// Customer-review feed payload.
#[derive(Debug, Deserialize)]
pub(crate) struct FeedDocument {
    #[serde(default)]
    pub feed: Option<FeedBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedBody {
    #[serde(default)]
    pub entry: Option<OneOrMany>,
}

/// The feed collapses a one-entry page into a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    Many(Vec<Value>),
    One(Value),
}

impl FeedDocument {
    pub fn into_entries(self) -> Vec<Value> {
        match self.feed.and_then(|f| f.entry) {
            Some(OneOrMany::Many(entries)) => entries,
            Some(OneOrMany::One(entry)) => vec![entry],
            None => Vec::new(),
        }
    }
}
