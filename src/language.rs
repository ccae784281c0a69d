/// Languages whose stop words apply to reviews from a given storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageSpec {
    Single(&'static str),
    /// Storefronts where reviews are commonly written in several languages.
    Set(&'static [&'static str]),
}

impl LanguageSpec {
    pub fn languages(&self) -> &[&'static str] {
        match self {
            LanguageSpec::Single(lang) => std::slice::from_ref(lang),
            LanguageSpec::Set(langs) => langs,
        }
    }
}

pub const DEFAULT_LANGUAGE: &str = "english";

const UKRAINIAN_STOREFRONT: &[&str] = &["ukrainian", "russian", "english"];

const COUNTRY_LANGUAGES: &[(&str, LanguageSpec)] = &[
    ("us", LanguageSpec::Single("english")),
    ("gb", LanguageSpec::Single("english")),
    ("au", LanguageSpec::Single("english")),
    ("ca", LanguageSpec::Single("english")),
    ("de", LanguageSpec::Single("german")),
    ("es", LanguageSpec::Single("spanish")),
    ("fr", LanguageSpec::Single("french")),
    ("it", LanguageSpec::Single("italian")),
    ("ua", LanguageSpec::Set(UKRAINIAN_STOREFRONT)),
    ("pt", LanguageSpec::Single("portuguese")),
    ("pl", LanguageSpec::Single("polish")),
    ("br", LanguageSpec::Single("portuguese")),
    ("nl", LanguageSpec::Single("dutch")),
];

/// Maps a two-letter storefront code to its review language(s).
///
/// Lookup is case-insensitive; unknown codes map to English.
pub fn language_for_country(country: &str) -> LanguageSpec {
    let country = country.trim().to_lowercase();
    COUNTRY_LANGUAGES
        .iter()
        .find(|(code, _)| *code == country)
        .map(|(_, spec)| *spec)
        .unwrap_or(LanguageSpec::Single(DEFAULT_LANGUAGE))
}
