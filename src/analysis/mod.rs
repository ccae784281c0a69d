//! Analysis engine.
//!
//! Turns a review sample into rating metrics and rule-based insights. The
//! engine is pure: it makes no network calls, so it can be moved onto the
//! blocking pool with [`analyze_in_background`].

mod keywords;
mod metrics;
mod sentiment;
mod text;
mod types;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};
use whatlang::{detect as detect_language, Lang};

pub use self::keywords::{extract_keywords, TOP_KEYWORDS};
pub use self::metrics::calculate_metrics;
pub use self::sentiment::{categorize, polarity, NEGATIVE_THRESHOLD, POSITIVE_THRESHOLD};
pub use self::text::{clean_text, is_numeric, tokenize};
pub use self::types::{CleanedReview, Insights, Metrics, SentimentCategory};

use crate::appstore::Review;
use crate::language::language_for_country;
use crate::stopwords::StopWordResolver;
use crate::TARGET_ANALYSIS;

/// Share of negative reviews above which the high-volume notice is raised.
pub const NEGATIVE_SHARE_THRESHOLD: f64 = 0.3;
/// Keywords named in the negative-themes insight.
pub const THEME_KEYWORDS: usize = 3;

pub const HIGH_NEGATIVE_VOLUME: &str =
    "High volume of negative sentiment. Investigate common complaints.";

/// Cleans every review and scores its raw body in one pass.
pub fn clean_reviews(reviews: &[Review]) -> Vec<CleanedReview<'_>> {
    reviews
        .iter()
        .map(|review| {
            let clean_text = clean_text(&review.body);
            let sentiment_score = polarity(&review.body);
            CleanedReview {
                review,
                clean_text,
                sentiment_score,
                sentiment_category: categorize(sentiment_score),
            }
        })
        .collect()
}

pub fn analyze(
    reviews: &[Review],
    country: &str,
    stopwords: &StopWordResolver,
) -> (Metrics, Insights) {
    if reviews.is_empty() {
        return (Metrics::default(), Insights::default());
    }

    log_non_english(reviews);

    let metrics = calculate_metrics(reviews);
    let cleaned = clean_reviews(reviews);

    let mut sentiment_distribution: BTreeMap<SentimentCategory, usize> = BTreeMap::new();
    for review in &cleaned {
        *sentiment_distribution
            .entry(review.sentiment_category)
            .or_default() += 1;
    }

    let negative_texts: Vec<&str> = cleaned
        .iter()
        .filter(|r| r.sentiment_category == SentimentCategory::Negative)
        .map(|r| r.clean_text.as_str())
        .collect();

    let negative_keywords = if negative_texts.is_empty() {
        Vec::new()
    } else {
        let stop_words: HashSet<String> = stopwords.resolve(&language_for_country(country));
        extract_keywords(negative_texts.iter().copied(), &stop_words, TOP_KEYWORDS)
    };

    let negative_count = negative_texts.len();
    let actionable_insights = rule_insights(negative_count, reviews.len(), &negative_keywords);

    debug!(
        target: TARGET_ANALYSIS,
        "Analyzed {} reviews for '{}': {} negative, {} keywords",
        reviews.len(),
        country,
        negative_count,
        negative_keywords.len()
    );

    (
        metrics,
        Insights {
            sentiment_distribution,
            negative_keywords,
            actionable_insights,
        },
    )
}

fn rule_insights(
    negative_count: usize,
    total: usize,
    negative_keywords: &[(String, usize)],
) -> Vec<String> {
    let mut insights = Vec::new();

    if negative_count as f64 > NEGATIVE_SHARE_THRESHOLD * total as f64 {
        insights.push(HIGH_NEGATIVE_VOLUME.to_string());
    }

    if !negative_keywords.is_empty() {
        let themes: Vec<&str> = negative_keywords
            .iter()
            .take(THEME_KEYWORDS)
            .map(|(word, _)| word.as_str())
            .collect();
        insights.push(format!(
            "Common themes in negative reviews: {}",
            themes.join(", ")
        ));
    }

    insights
}

/// Sentiment scoring is English-only; record how much of the sample that affects.
fn log_non_english(reviews: &[Review]) {
    let non_english = reviews
        .iter()
        .filter_map(|r| detect_language(&r.body))
        .filter(|info| info.is_reliable() && info.lang() != Lang::Eng)
        .count();
    if non_english > 0 {
        info!(
            target: TARGET_ANALYSIS,
            "{} of {} reviews look non-English; sentiment scores for them use the English lexicon",
            non_english,
            reviews.len()
        );
    }
}

/// Runs [`analyze`] on the blocking thread pool.
pub async fn analyze_in_background(
    reviews: Arc<Vec<Review>>,
    country: String,
    stopwords: Arc<StopWordResolver>,
) -> anyhow::Result<(Metrics, Insights)> {
    tokio::task::spawn_blocking(move || analyze(&reviews, &country, &stopwords))
        .await
        .context("Analysis task failed")
}
