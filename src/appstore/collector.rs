//! Pagination and sampling policy for assembling a review sample.

use rand::seq::index;
use rand::Rng;
use tracing::{debug, info, warn};

use super::types::{Review, ReviewSample, ReviewSource};
use super::{DEFAULT_MAX_PAGES, DEFAULT_OVERSAMPLING_FACTOR};
use crate::TARGET_WEB_REQUEST;

/// Limits applied while paging through a review feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPolicy {
    /// Highest page number that will be requested.
    pub max_pages: u32,
    /// The pool target is `requested_count * oversampling_factor`.
    pub oversampling_factor: usize,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            oversampling_factor: DEFAULT_OVERSAMPLING_FACTOR,
        }
    }
}

/// Assembles a bounded, representative review sample for one request.
///
/// The random source is owned by the collector so tests can pass a seeded
/// generator and get reproducible samples.
pub struct ReviewCollector<'a, S: ReviewSource + ?Sized, R: Rng> {
    source: &'a S,
    rng: R,
    policy: SamplingPolicy,
}

impl<'a, S: ReviewSource + ?Sized, R: Rng> ReviewCollector<'a, S, R> {
    pub fn new(source: &'a S, rng: R) -> Self {
        Self {
            source,
            rng,
            policy: SamplingPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SamplingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Collects at most `requested_count` reviews for the app.
    ///
    /// When `app_id` is absent it is resolved from `app_name`; an unresolvable
    /// name yields an empty sample. Pages are fetched one at a time until the
    /// pool target is reached, a page is empty or fails, or the page ceiling
    /// is passed. A pool larger than `requested_count` is sampled uniformly
    /// without replacement; otherwise it is returned as-is, in feed order.
    pub async fn collect(
        &mut self,
        app_name: &str,
        app_id: Option<&str>,
        country: &str,
        requested_count: usize,
    ) -> ReviewSample {
        let app_id = match app_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => match self.source.resolve_app_id(app_name, country).await {
                Some(id) => id,
                None => {
                    warn!(target: TARGET_WEB_REQUEST, "Could not find App ID for {}", app_name);
                    return Vec::new();
                }
            },
        };

        let target_pool = requested_count.saturating_mul(self.policy.oversampling_factor);
        let mut pool: Vec<Review> = Vec::new();
        let mut page = 1;

        while pool.len() < target_pool && page <= self.policy.max_pages {
            let fetched = self.source.fetch_page(&app_id, country, page).await;
            if fetched.is_error {
                warn!(target: TARGET_WEB_REQUEST, "Stopping pagination for app {} after error on page {}", app_id, page);
                break;
            }
            if fetched.entries.is_empty() {
                debug!(target: TARGET_WEB_REQUEST, "Feed for app {} exhausted at page {}", app_id, page);
                break;
            }

            pool.extend(fetched.entries.iter().map(Review::from_feed_entry));
            page += 1;
        }

        info!(
            target: TARGET_WEB_REQUEST,
            "Collected {} reviews for app {} ({}) from {} pages",
            pool.len(),
            app_id,
            country,
            page - 1
        );

        if pool.len() > requested_count {
            let picked = index::sample(&mut self.rng, pool.len(), requested_count);
            return picked.into_iter().map(|i| pool[i].clone()).collect();
        }

        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appstore::FeedPage;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::{json, Value};
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// In-memory store: `pages[i]` answers page `i + 1`; pages past the end
    /// either come back empty or, with `endless`, repeat the last page.
    struct FakeSource {
        app_id: Option<String>,
        pages: Vec<FeedPage>,
        endless: bool,
        requested_pages: Mutex<Vec<u32>>,
        resolve_calls: Mutex<usize>,
    }

    impl FakeSource {
        fn new(pages: Vec<FeedPage>) -> Self {
            Self {
                app_id: Some("100".to_string()),
                pages,
                endless: false,
                requested_pages: Mutex::new(Vec::new()),
                resolve_calls: Mutex::new(0),
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested_pages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReviewSource for FakeSource {
        async fn resolve_app_id(&self, _app_name: &str, _country: &str) -> Option<String> {
            *self.resolve_calls.lock().unwrap() += 1;
            self.app_id.clone()
        }

        async fn fetch_page(&self, _app_id: &str, _country: &str, page: u32) -> FeedPage {
            self.requested_pages.lock().unwrap().push(page);
            let idx = (page - 1) as usize;
            match self.pages.get(idx) {
                Some(p) => p.clone(),
                None if self.endless => self.pages.last().cloned().unwrap_or_default(),
                None => FeedPage::default(),
            }
        }
    }

    fn page_of(start: usize, len: usize) -> FeedPage {
        let entries: Vec<Value> = (start..start + len)
            .map(|i| json!({"id": {"label": i.to_string()}, "im:rating": {"label": "4"}}))
            .collect();
        FeedPage::with_entries(entries)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[tokio::test]
    async fn unresolvable_app_yields_empty_sample() {
        let mut source = FakeSource::new(vec![page_of(0, 10)]);
        source.app_id = None;
        let sample = ReviewCollector::new(&source, rng())
            .collect("nothing", None, "us", 5)
            .await;
        assert!(sample.is_empty());
        assert!(source.requested().is_empty());
    }

    #[tokio::test]
    async fn explicit_app_id_skips_resolution() {
        let source = FakeSource::new(vec![page_of(0, 3)]);
        let sample = ReviewCollector::new(&source, rng())
            .collect("ignored", Some("555"), "us", 10)
            .await;
        assert_eq!(sample.len(), 3);
        assert_eq!(*source.resolve_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn small_pool_is_returned_unchanged_in_order() {
        let source = FakeSource::new(vec![page_of(0, 3), page_of(3, 2)]);
        let sample = ReviewCollector::new(&source, rng())
            .collect("app", None, "us", 10)
            .await;
        let ids: Vec<&str> = sample.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4"]);
        assert_eq!(source.requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn pool_exactly_matching_count_keeps_feed_order() {
        let source = FakeSource::new(vec![page_of(0, 5), page_of(5, 5)]);
        let sample = ReviewCollector::new(&source, rng())
            .collect("app", None, "us", 10)
            .await;
        let ids: Vec<String> = sample.into_iter().map(|r| r.id).collect();
        let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
        assert_eq!(source.requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn stops_once_target_pool_is_reached() {
        let source = FakeSource::new(vec![page_of(0, 50), page_of(50, 50), page_of(100, 50)]);
        let sample = ReviewCollector::new(&source, rng())
            .collect("app", None, "us", 40)
            .await;
        // 80 wanted, so page 2 completes the pool and page 3 is never asked for
        assert_eq!(source.requested(), vec![1, 2]);
        assert_eq!(sample.len(), 40);
    }

    #[tokio::test]
    async fn oversized_pool_is_sampled_without_replacement() {
        let source = FakeSource::new(vec![page_of(0, 50), page_of(50, 50)]);
        let sample = ReviewCollector::new(&source, rng())
            .collect("app", None, "us", 30)
            .await;
        assert_eq!(sample.len(), 30);

        let ids: HashSet<usize> = sample.iter().map(|r| r.id.parse().unwrap()).collect();
        assert_eq!(ids.len(), 30, "no review drawn twice");
        assert!(ids.iter().all(|id| *id < 100), "sample is a subset of the pool");
    }

    #[tokio::test]
    async fn seeded_rng_gives_reproducible_sample() {
        let source = FakeSource::new(vec![page_of(0, 50)]);
        let first = ReviewCollector::new(&source, StdRng::seed_from_u64(99))
            .collect("app", None, "us", 10)
            .await;
        let second = ReviewCollector::new(&source, StdRng::seed_from_u64(99))
            .collect("app", None, "us", 10)
            .await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn error_page_keeps_earlier_reviews() {
        let source = FakeSource::new(vec![page_of(0, 4), FeedPage::failed(), page_of(4, 4)]);
        let sample = ReviewCollector::new(&source, rng())
            .collect("app", None, "us", 50)
            .await;
        assert_eq!(sample.len(), 4);
        assert_eq!(source.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn first_page_error_yields_empty_sample() {
        let source = FakeSource::new(vec![FeedPage::failed()]);
        let sample = ReviewCollector::new(&source, rng())
            .collect("app", None, "us", 50)
            .await;
        assert!(sample.is_empty());
    }

    #[tokio::test]
    async fn pagination_never_passes_page_ceiling() {
        let mut source = FakeSource::new(vec![page_of(0, 1)]);
        source.endless = true;
        let sample = ReviewCollector::new(&source, rng())
            .collect("app", None, "us", 1000)
            .await;
        assert_eq!(source.requested(), (1..=10).collect::<Vec<u32>>());
        assert_eq!(sample.len(), 10);
    }

    #[tokio::test]
    async fn custom_policy_overrides_ceiling() {
        let mut source = FakeSource::new(vec![page_of(0, 1)]);
        source.endless = true;
        let policy = SamplingPolicy {
            max_pages: 3,
            oversampling_factor: 2,
        };
        ReviewCollector::new(&source, rng())
            .with_policy(policy)
            .collect("app", None, "us", 1000)
            .await;
        assert_eq!(source.requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn malformed_entries_are_kept_with_defaults() {
        let page = FeedPage::with_entries(vec![json!({"title": {"label": "no rating"}}), json!(7)]);
        let source = FakeSource::new(vec![page]);
        let sample = ReviewCollector::new(&source, rng())
            .collect("app", None, "us", 10)
            .await;
        assert_eq!(sample.len(), 2);
        assert!(sample.iter().all(|r| r.rating == 0));
    }
}
