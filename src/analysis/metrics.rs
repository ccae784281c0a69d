use std::collections::BTreeMap;

use super::types::Metrics;
use crate::appstore::Review;

/// Average rating (two decimals) and per-rating percentage breakdown.
pub fn calculate_metrics(reviews: &[Review]) -> Metrics {
    let total = reviews.len();
    if total == 0 {
        return Metrics::default();
    }

    let sum: u64 = reviews.iter().map(|r| u64::from(r.rating)).sum();
    let average = sum as f64 / total as f64;

    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for review in reviews {
        *counts.entry(review.rating).or_default() += 1;
    }
    let rating_distribution = counts
        .into_iter()
        .map(|(rating, count)| (rating.to_string(), count as f64 * 100.0 / total as f64))
        .collect();

    Metrics {
        average_rating: (average * 100.0).round() / 100.0,
        rating_distribution,
        total_reviews: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rated(ratings: &[u8]) -> Vec<Review> {
        ratings
            .iter()
            .map(|&rating| Review {
                rating,
                ..Review::default()
            })
            .collect()
    }

    #[test]
    fn ratings_scenario() {
        let metrics = calculate_metrics(&rated(&[1, 1, 2, 5, 5]));
        assert_eq!(metrics.average_rating, 2.8);
        assert_eq!(metrics.total_reviews, 5);
        assert_eq!(
            metrics.rating_distribution,
            BTreeMap::from([
                ("1".to_string(), 40.0),
                ("2".to_string(), 20.0),
                ("5".to_string(), 40.0),
            ])
        );
    }

    #[test]
    fn average_is_rounded_to_two_places() {
        let metrics = calculate_metrics(&rated(&[5, 4, 4]));
        assert_eq!(metrics.average_rating, 4.33);
    }

    #[test]
    fn distribution_sums_to_one_hundred() {
        let metrics = calculate_metrics(&rated(&[1, 2, 3, 3, 4, 5, 5, 0, 2]));
        let total: f64 = metrics.rating_distribution.values().sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert!(metrics.rating_distribution.contains_key("0"));
    }

    #[test]
    fn empty_sample_is_all_zero() {
        let metrics = calculate_metrics(&[]);
        assert_eq!(metrics.average_rating, 0.0);
        assert!(metrics.rating_distribution.is_empty());
        assert_eq!(metrics.total_reviews, 0);
    }
}
