//! Stop-word resolution for keyword extraction.
//!
//! A language is resolved by walking an ordered chain of sources: custom
//! override files first, then the compiled-in corpora. The first source with
//! a non-empty list wins. When no source knows the language, the built-in
//! English corpus is used and a warning is logged.

mod sources;

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, warn};

pub use self::sources::{
    builtin_corpus, parse_word_list, BuiltinCorpusSource, CustomListSource, StopWordSource,
};
use crate::language::{LanguageSpec, DEFAULT_LANGUAGE};
use crate::TARGET_ANALYSIS;

pub struct StopWordResolver {
    sources: Vec<Box<dyn StopWordSource>>,
}

impl StopWordResolver {
    pub fn new(sources: Vec<Box<dyn StopWordSource>>) -> Self {
        Self { sources }
    }

    /// The standard chain: custom lists under `custom_dir`, then built-ins.
    pub fn with_custom_dir(custom_dir: impl Into<PathBuf>) -> Self {
        Self::new(vec![
            Box::new(CustomListSource::new(custom_dir)),
            Box::new(BuiltinCorpusSource),
        ])
    }

    pub fn builtin_only() -> Self {
        Self::new(vec![Box::new(BuiltinCorpusSource)])
    }

    /// Resolves a single language or the union of a language set.
    pub fn resolve(&self, spec: &LanguageSpec) -> HashSet<String> {
        spec.languages()
            .iter()
            .flat_map(|language| self.resolve_language(language))
            .collect()
    }

    pub fn resolve_language(&self, language: &str) -> HashSet<String> {
        for source in &self.sources {
            if let Some(words) = source.lookup(language).filter(|w| !w.is_empty()) {
                debug!(
                    target: TARGET_ANALYSIS,
                    "Loaded {} stopwords for '{}' from {} source",
                    words.len(),
                    language,
                    source.name()
                );
                return words;
            }
        }

        warn!(
            target: TARGET_ANALYSIS,
            "Stopwords not found for language '{}'. Falling back to English.", language
        );
        builtin_corpus(DEFAULT_LANGUAGE)
            .map(parse_word_list)
            .unwrap_or_default()
    }
}

impl Default for StopWordResolver {
    fn default() -> Self {
        Self::with_custom_dir(crate::environment::DEFAULT_STOPWORDS_DIR)
    }
}
