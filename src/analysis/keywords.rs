use std::collections::{HashMap, HashSet};

use super::text::{is_numeric, tokenize};

pub const TOP_KEYWORDS: usize = 10;

/// Counts keywords across `texts` and returns the `top_n` most frequent.
///
/// Stop words, tokens of two characters or fewer and purely numeric tokens
/// are skipped. Ties keep the order in which words were first seen.
pub fn extract_keywords<'a, I>(
    texts: I,
    stopwords: &HashSet<String>,
    top_n: usize,
) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&'a str, (usize, usize)> = HashMap::new();
    for token in texts.into_iter().flat_map(tokenize) {
        if token.chars().count() <= 2 || is_numeric(token) || stopwords.contains(token) {
            continue;
        }
        let next_rank = counts.len();
        counts.entry(token).or_insert((0, next_rank)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first_seen))| (word, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(top_n)
        .map(|(word, count, _)| (word.to_string(), count))
        .collect()
}
