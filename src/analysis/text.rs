use once_cell::sync::Lazy;
use regex::Regex;

/// Anything that is neither a word character nor whitespace.
static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("NON_WORD pattern is valid"));

/// Lower-cases `text` and strips every character that is not alphanumeric,
/// underscore or whitespace.
pub fn clean_text(text: &str) -> String {
    NON_WORD.replace_all(&text.to_lowercase(), "").into_owned()
}

pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

/// True when every character of `token` is a digit.
pub fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_numeric)
}
