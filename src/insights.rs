//! Insight augmentation.
//!
//! Folds suggestions from an external AI collaborator into the rule-based
//! insights produced by the analysis engine. Rule-based entries always come
//! first; collaborator failures become a single notice and never fail the
//! report.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

use crate::analysis::Insights;
use crate::appstore::Review;
use crate::TARGET_LLM_REQUEST;

/// Reviews at or below this rating are sent to the collaborator.
pub const NEGATIVE_RATING_CEILING: u8 = 3;
/// Maximum number of reviews included in one collaborator call.
pub const MAX_AI_REVIEWS: usize = 20;

pub const AI_DISABLED_NOTICE: &str = "AI Insights disabled: Missing API Key.";
pub const NO_NEGATIVE_REVIEWS_NOTICE: &str = "No significant negative reviews found to analyze.";
pub const AI_FAILURE_NOTICE: &str = "Failed to analyze reviews due to an AI service error.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Priority {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Suggestion {
    /// Short name of the product area, e.g. "Performance".
    pub area: String,
    /// Specific, actionable description of the improvement.
    pub description: String,
    pub priority: Priority,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.priority, self.area, self.description)
    }
}

/// An external generator of improvement suggestions.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// `reviews_text` holds one `- body` line per review.
    async fn suggest(&self, sample_size: usize, reviews_text: &str)
        -> anyhow::Result<Vec<Suggestion>>;
}

/// Bodies of the reviews the collaborator should see, in sample order.
pub fn negative_review_bodies(reviews: &[Review]) -> Vec<&str> {
    reviews
        .iter()
        .filter(|r| r.rating <= NEGATIVE_RATING_CEILING)
        .take(MAX_AI_REVIEWS)
        .map(|r| r.body.as_str())
        .collect()
}

pub async fn augment(
    mut insights: Insights,
    reviews: &[Review],
    provider: Option<&dyn SuggestionProvider>,
) -> Insights {
    let Some(provider) = provider else {
        warn!(target: TARGET_LLM_REQUEST, "No AI provider configured, skipping suggestions");
        insights
            .actionable_insights
            .push(AI_DISABLED_NOTICE.to_string());
        return insights;
    };

    let bodies = negative_review_bodies(reviews);
    if bodies.is_empty() {
        insights
            .actionable_insights
            .push(NO_NEGATIVE_REVIEWS_NOTICE.to_string());
        return insights;
    }

    let reviews_text = bodies
        .iter()
        .map(|body| format!("- {}", body))
        .collect::<Vec<_>>()
        .join("\n");

    match provider.suggest(bodies.len(), &reviews_text).await {
        Ok(suggestions) => {
            info!(
                target: TARGET_LLM_REQUEST,
                "Received {} suggestions for {} negative reviews",
                suggestions.len(),
                bodies.len()
            );
            insights
                .actionable_insights
                .extend(suggestions.iter().map(Suggestion::to_string));
        }
        Err(err) => {
            error!(target: TARGET_LLM_REQUEST, "AI analysis failed: {:#}", err);
            insights
                .actionable_insights
                .push(AI_FAILURE_NOTICE.to_string());
        }
    }

    insights
}
