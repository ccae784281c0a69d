//! End-to-end review report: collect, analyze off the async runtime, then
//! augment with AI suggestions.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::analysis::{analyze_in_background, Insights, Metrics};
use crate::appstore::{AppStoreClient, Review, ReviewCollector, ReviewSample, ReviewSource, SamplingPolicy};
use crate::environment::Config;
use crate::insights::{augment, SuggestionProvider};
use crate::llm::LlmSuggester;
use crate::stopwords::StopWordResolver;
use crate::TARGET_ANALYSIS;

pub const DEFAULT_COUNTRY: &str = "us";
pub const DEFAULT_REVIEW_COUNT: usize = 100;
pub const DEFAULT_LIMIT_REVIEWS: usize = 5;

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

fn default_count() -> usize {
    DEFAULT_REVIEW_COUNT
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub app_name: String,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_count")]
    pub count: usize,
}

impl ReviewRequest {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            app_id: None,
            country: default_country(),
            count: DEFAULT_REVIEW_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullReport {
    pub app_name: String,
    pub metrics: Metrics,
    pub insights: Insights,
    pub reviews_sample: Vec<Review>,
}

/// Wires the review source, stop-word resolver and optional AI provider
/// into one request pipeline.
#[derive(Clone)]
pub struct ReviewAnalysisService {
    source: Arc<dyn ReviewSource>,
    stopwords: Arc<StopWordResolver>,
    suggester: Option<Arc<dyn SuggestionProvider>>,
    policy: SamplingPolicy,
}

impl ReviewAnalysisService {
    pub fn new(
        source: Arc<dyn ReviewSource>,
        stopwords: Arc<StopWordResolver>,
        suggester: Option<Arc<dyn SuggestionProvider>>,
    ) -> Self {
        Self {
            source,
            stopwords,
            suggester,
            policy: SamplingPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SamplingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = AppStoreClient::new(config.app_store_base_url.clone(), config.http_timeout)?;
        let stopwords = StopWordResolver::with_custom_dir(&config.stopwords_dir);
        let suggester = LlmSuggester::from_config(&config.llm)
            .map(|s| Arc::new(s) as Arc<dyn SuggestionProvider>);

        Ok(Self::new(Arc::new(client), Arc::new(stopwords), suggester).with_policy(
            SamplingPolicy {
                max_pages: config.max_pages,
                oversampling_factor: config.oversampling_factor,
            },
        ))
    }

    /// Collects a fresh review sample; empty when nothing could be found.
    pub async fn fetch_reviews(&self, request: &ReviewRequest) -> ReviewSample {
        let rng = StdRng::seed_from_u64(rand::random());
        ReviewCollector::new(self.source.as_ref(), rng)
            .with_policy(self.policy)
            .collect(
                &request.app_name,
                request.app_id.as_deref(),
                &request.country,
                request.count,
            )
            .await
    }

    /// Builds the full report, or `None` when no reviews were found.
    pub async fn build_report(
        &self,
        request: &ReviewRequest,
        limit_reviews: usize,
    ) -> Result<Option<FullReport>> {
        let reviews = Arc::new(self.fetch_reviews(request).await);
        if reviews.is_empty() {
            return Ok(None);
        }

        let (metrics, insights) = analyze_in_background(
            Arc::clone(&reviews),
            request.country.clone(),
            Arc::clone(&self.stopwords),
        )
        .await?;

        let insights = augment(insights, &reviews, self.suggester.as_deref()).await;

        info!(
            target: TARGET_ANALYSIS,
            "Built report for '{}' from {} reviews",
            request.app_name,
            reviews.len()
        );

        Ok(Some(FullReport {
            app_name: request.app_name.clone(),
            metrics,
            insights,
            reviews_sample: reviews.iter().take(limit_reviews).cloned().collect(),
        }))
    }
}
