//! Individual stop-word lookup strategies.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, error};

use crate::TARGET_ANALYSIS;

/// One tier of the stop-word lookup chain.
pub trait StopWordSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the stop words this source holds for `language`, if any.
    fn lookup(&self, language: &str) -> Option<HashSet<String>>;
}

/// Newline-delimited override lists stored as `{dir}/{language}.txt`.
#[derive(Debug, Clone)]
pub struct CustomListSource {
    dir: PathBuf,
}

impl CustomListSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl StopWordSource for CustomListSource {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn lookup(&self, language: &str) -> Option<HashSet<String>> {
        // language names double as file names
        if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let path = self.dir.join(format!("{}.txt", language));
        if !path.is_file() {
            debug!(target: TARGET_ANALYSIS, "No custom stopwords file at {}", path.display());
            return None;
        }

        match fs::read_to_string(&path) {
            Ok(contents) => Some(parse_word_list(&contents)),
            Err(err) => {
                error!(target: TARGET_ANALYSIS, "Error reading custom stopwords file for {}: {}", language, err);
                None
            }
        }
    }
}

/// Corpora compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCorpusSource;

impl StopWordSource for BuiltinCorpusSource {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn lookup(&self, language: &str) -> Option<HashSet<String>> {
        builtin_corpus(language).map(parse_word_list)
    }
}

/// Raw text of the compiled-in corpus for `language`.
pub fn builtin_corpus(language: &str) -> Option<&'static str> {
    let corpus = match language {
        "english" => include_str!("corpus/english.txt"),
        "german" => include_str!("corpus/german.txt"),
        "french" => include_str!("corpus/french.txt"),
        "spanish" => include_str!("corpus/spanish.txt"),
        "italian" => include_str!("corpus/italian.txt"),
        "portuguese" => include_str!("corpus/portuguese.txt"),
        "dutch" => include_str!("corpus/dutch.txt"),
        "russian" => include_str!("corpus/russian.txt"),
        _ => return None,
    };
    Some(corpus)
}

/// Trims and lower-cases each line, skipping blanks.
pub fn parse_word_list(contents: &str) -> HashSet<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_lowercase)
        .collect()
}
