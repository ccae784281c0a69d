//! HTTP access to the store search endpoint and the customer-review feed.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use super::types::{FeedDocument, FeedPage, ReviewSource, SearchResponse};
use crate::TARGET_WEB_REQUEST;

const SEARCH_ENTITY: &str = "software";
const SEARCH_LIMIT: &str = "1";

#[derive(Clone, Debug)]
pub struct AppStoreClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AppStoreClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .gzip(true)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::default())
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self { http, base_url })
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn feed_url(&self, app_id: &str, country: &str, page: u32) -> Result<Url> {
        let page = format!("page={}", page);
        let id = format!("id={}", app_id);
        self.endpoint(&[
            country,
            "rss",
            "customerreviews",
            &page,
            &id,
            "sortBy=mostRecent",
            "json",
        ])
    }

    fn search_url(&self, app_name: &str, country: &str) -> Result<Url> {
        let mut url = self.endpoint(&["search"])?;
        url.query_pairs_mut()
            .append_pair("term", app_name)
            .append_pair("country", country)
            .append_pair("entity", SEARCH_ENTITY)
            .append_pair("limit", SEARCH_LIMIT);
        Ok(url)
    }

    /// Issues a GET and decodes the JSON body, failing on non-2xx statuses.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(target: TARGET_WEB_REQUEST, "GET {}", url);
        let response = self
            .http
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;

        if !status.is_success() {
            let preview: String = body.chars().take(200).collect();
            return Err(anyhow!(
                "Non-success status {} from {}: {}",
                status,
                url,
                preview
            ));
        }

        serde_json::from_str(&body).with_context(|| format!("Error parsing JSON from {}", url))
    }
}

#[async_trait]
impl ReviewSource for AppStoreClient {
    async fn resolve_app_id(&self, app_name: &str, country: &str) -> Option<String> {
        let url = match self.search_url(app_name, country) {
            Ok(url) => url,
            Err(err) => {
                error!(target: TARGET_WEB_REQUEST, "Error building search URL for '{}': {:#}", app_name, err);
                return None;
            }
        };

        match self.get_json::<SearchResponse>(url).await {
            Ok(search) => {
                let app_id = search.top_track_id();
                if app_id.is_none() {
                    warn!(target: TARGET_WEB_REQUEST, "No app found for '{}' in '{}'", app_name, country);
                }
                app_id
            }
            Err(err) => {
                error!(target: TARGET_WEB_REQUEST, "Error searching app ID for '{}': {:#}", app_name, err);
                None
            }
        }
    }

    async fn fetch_page(&self, app_id: &str, country: &str, page: u32) -> FeedPage {
        let url = match self.feed_url(app_id, country, page) {
            Ok(url) => url,
            Err(err) => {
                error!(target: TARGET_WEB_REQUEST, "Error building feed URL for app {}: {:#}", app_id, err);
                return FeedPage::failed();
            }
        };

        match self.get_json::<FeedDocument>(url).await {
            Ok(document) => {
                let entries = document.into_entries();
                debug!(target: TARGET_WEB_REQUEST, "Fetched page {} for app {} with {} entries", page, app_id, entries.len());
                FeedPage::with_entries(entries)
            }
            Err(err) => {
                error!(target: TARGET_WEB_REQUEST, "Error fetching reviews page {} for app {}: {:#}", page, app_id, err);
                FeedPage::failed()
            }
        }
    }
}
