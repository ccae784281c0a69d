use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::appstore::Review;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SentimentCategory {
    Positive,
    Neutral,
    Negative,
}

impl fmt::Display for SentimentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SentimentCategory::Positive => "Positive",
            SentimentCategory::Neutral => "Neutral",
            SentimentCategory::Negative => "Negative",
        };
        f.write_str(label)
    }
}

/// A review plus the fields derived from it during one analysis pass.
#[derive(Debug, Clone)]
pub struct CleanedReview<'a> {
    pub review: &'a Review,
    pub clean_text: String,
    pub sentiment_score: f64,
    pub sentiment_category: SentimentCategory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub average_rating: f64,
    /// Percentage of reviews at each rating, keyed by the rating as a string.
    pub rating_distribution: BTreeMap<String, f64>,
    pub total_reviews: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Insights {
    pub sentiment_distribution: BTreeMap<SentimentCategory, usize>,
    /// Most frequent words in negative reviews, highest count first.
    #[serde(rename = "negative_common_keywords")]
    pub negative_keywords: Vec<(String, usize)>,
    pub actionable_insights: Vec<String>,
}
