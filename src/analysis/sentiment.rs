//! Lexicon-based polarity scoring, following pattern's English sentiment
//! rules as used by TextBlob.
//!
//! Every lexicon word in a review is an assessment. An intensifier directly
//! before it scales it. A negation before it (optionally separated by an
//! intensifier) divides it by that intensifier and flips it by -0.5. An
//! exclamation mark boosts the preceding assessment. The review score is the
//! mean of all assessments. The lexicon is English-only.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::types::SentimentCategory;

pub const POSITIVE_THRESHOLD: f64 = 0.1;
pub const NEGATIVE_THRESHOLD: f64 = -0.1;

const NEGATION_FACTOR: f64 = -0.5;
const EXCLAMATION_BOOST: f64 = 1.25;

static LEXICON: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    include_str!("lexicon.txt")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (word, polarity) = line.split_once(' ')?;
            Some((word, polarity.trim().parse::<f64>().ok()?))
        })
        .collect()
});

/// Words, keeping inner apostrophes, and exclamation marks.
static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+(?:'\w+)*|!").expect("TOKEN pattern is valid"));

const NEGATIONS: &[&str] = &["no", "not", "never", "cannot"];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("so", 1.3),
    ("super", 1.3),
    ("highly", 1.3),
    ("too", 1.2),
    ("quite", 1.1),
    ("pretty", 1.1),
    ("totally", 1.4),
    ("completely", 1.4),
    ("extremely", 1.5),
    ("absolutely", 1.5),
    ("incredibly", 1.5),
    ("somewhat", 0.7),
    ("slightly", 0.5),
];

fn intensity(token: &str) -> Option<f64> {
    INTENSIFIERS
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, factor)| *factor)
}

fn is_negation(token: &str) -> bool {
    NEGATIONS.contains(&token) || token.ends_with("n't")
}

struct Assessment {
    polarity: f64,
    negated: bool,
}

/// Scores raw review text in `[-1, 1]`. Returns 0.0 when no lexicon word
/// appears.
pub fn polarity(text: &str) -> f64 {
    let text = text.to_lowercase().replace('\u{2019}', "'");
    let mut assessments: Vec<Assessment> = Vec::new();
    let mut negated = false;
    let mut modifier: Option<f64> = None;

    for token in TOKEN.find_iter(&text).map(|m| m.as_str()) {
        if is_negation(token) {
            negated = true;
            continue;
        }
        if let Some(factor) = intensity(token) {
            modifier = Some(factor);
            continue;
        }
        if let Some(&base) = LEXICON.get(token) {
            let polarity = match modifier {
                Some(factor) if negated => base / factor,
                Some(factor) => (base * factor).clamp(-1.0, 1.0),
                None => base,
            };
            assessments.push(Assessment { polarity, negated });
            negated = false;
            modifier = None;
            continue;
        }
        if token == "!" {
            if let Some(last) = assessments.last_mut() {
                last.polarity = (last.polarity * EXCLAMATION_BOOST).clamp(-1.0, 1.0);
            }
            continue;
        }

        // "not a good", "really is a good"
        let len = token.chars().count();
        if len > 1 {
            negated = false;
        }
        if len > 2 {
            modifier = None;
        }
    }

    if assessments.is_empty() {
        return 0.0;
    }
    let total: f64 = assessments
        .iter()
        .map(|a| if a.negated { a.polarity * NEGATION_FACTOR } else { a.polarity })
        .sum();
    (total / assessments.len() as f64).clamp(-1.0, 1.0)
}

pub fn categorize(score: f64) -> SentimentCategory {
    if score > POSITIVE_THRESHOLD {
        SentimentCategory::Positive
    } else if score < NEGATIVE_THRESHOLD {
        SentimentCategory::Negative
    } else {
        SentimentCategory::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn lexicon_loads() {
        assert!(LEXICON.len() > 100);
        assert_eq!(LEXICON.get("good"), Some(&0.7));
        assert_eq!(LEXICON.get("terrible"), Some(&-1.0));
        assert_eq!(LEXICON.get("simple"), Some(&0.0));
    }

    #[test]
    fn plain_words_score_their_polarity() {
        assert_close(polarity("Good"), 0.7);
        assert_close(polarity("This is terrible."), -1.0);
        assert_eq!(polarity("I downloaded it yesterday"), 0.0);
        assert_eq!(polarity(""), 0.0);
    }

    #[test]
    fn matches_textblob_reference_scores() {
        assert_close(
            polarity("Textblob is amazingly simple to use. What great fun!"),
            0.39166666666666666,
        );
        assert_close(polarity("not a very great calculation"), -0.3076923076923077);
        assert_close(polarity("I wish there were more options and a free trial"), 0.45);
        assert_close(polarity("Great features but slow"), 0.25);
    }

    #[test]
    fn negation_flips_and_damps() {
        assert_close(polarity("not good"), -0.35);
        assert_close(polarity("It isn\u{2019}t good"), -0.35);
        // a negation survives a one-letter word but not a longer one
        assert_close(polarity("not a good app"), -0.35);
        assert_close(polarity("not sure it's good"), (-0.25 + 0.7) / 2.0);
    }

    #[test]
    fn negated_intensifier_divides_instead_of_multiplying() {
        assert_close(polarity("Doesn't work, not very good"), -0.5 * 0.7 / 1.3);
    }

    #[test]
    fn intensifier_scales_and_is_clamped() {
        assert_close(polarity("very good"), 0.91);
        assert_eq!(polarity("absolutely perfect"), 1.0);
        assert_close(polarity("really is a good"), 0.91);
    }

    #[test]
    fn exclamation_boosts_previous_assessment() {
        assert_close(polarity("Nice!"), 0.75);
        assert_close(polarity("bad!"), -0.875);
        assert_eq!(polarity("!"), 0.0);
    }

    #[test]
    fn categorize_uses_fixed_thresholds() {
        assert_eq!(categorize(0.5), SentimentCategory::Positive);
        assert_eq!(categorize(0.1), SentimentCategory::Neutral);
        assert_eq!(categorize(0.0), SentimentCategory::Neutral);
        assert_eq!(categorize(-0.1), SentimentCategory::Neutral);
        assert_eq!(categorize(-0.11), SentimentCategory::Negative);
    }
}
