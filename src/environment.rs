use std::env;
use std::ops::RangeBounds;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::appstore::{DEFAULT_MAX_PAGES, DEFAULT_OVERSAMPLING_FACTOR};

pub const DEFAULT_APP_STORE_BASE_URL: &str = "https://itunes.apple.com/";
pub const DEFAULT_STOPWORDS_DIR: &str = "resources/stopwords";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
    #[error("invalid URL in {var}: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// Which backend answers improvement-suggestion requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Ollama,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub openai_api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub ollama_host: String,
    pub ollama_port: u16,
    pub timeout: Duration,
    pub max_retries: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub app_store_base_url: Url,
    pub http_timeout: Duration,
    pub stopwords_dir: PathBuf,
    pub max_pages: u32,
    pub oversampling_factor: usize,
    pub log_dir: PathBuf,
    pub llm: LlmConfig,
}

impl Config {
    /// Builds the configuration from process environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the configuration from any variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let base_url = vars.or("APP_STORE_BASE_URL", DEFAULT_APP_STORE_BASE_URL);
        let app_store_base_url = Url::parse(&base_url).map_err(|source| ConfigError::InvalidUrl {
            var: "APP_STORE_BASE_URL",
            source,
        })?;

        let provider = match vars.or("LLM_PROVIDER", "openai").to_lowercase().as_str() {
            "openai" => LlmProvider::OpenAI,
            "ollama" => LlmProvider::Ollama,
            other => {
                return Err(ConfigError::InvalidValue {
                    var: "LLM_PROVIDER",
                    value: other.to_string(),
                })
            }
        };

        let llm = LlmConfig {
            provider,
            openai_api_key: vars.get("OPENAI_API_KEY"),
            model: vars.or("LLM_MODEL", "gpt-4o-mini"),
            temperature: vars.parse("LLM_TEMPERATURE", 0.0)?,
            ollama_host: vars.or("OLLAMA_HOST", "http://localhost"),
            ollama_port: vars.parse("OLLAMA_PORT", 11434)?,
            timeout: Duration::from_secs(vars.parse("LLM_TIMEOUT_SECS", 120)?),
            max_retries: vars.parse("LLM_MAX_RETRIES", 3)?,
        };

        Ok(Self {
            host: vars.or("HOST", "0.0.0.0"),
            port: vars.parse("PORT", 8000)?,
            password: vars.get("PASSWORD"),
            app_store_base_url,
            http_timeout: Duration::from_secs(vars.parse("HTTP_TIMEOUT_SECS", 30)?),
            stopwords_dir: PathBuf::from(vars.or("STOPWORDS_DIR", DEFAULT_STOPWORDS_DIR)),
            // the RSS feed serves at most DEFAULT_MAX_PAGES pages
            max_pages: vars.parse_in("MAX_PAGES", DEFAULT_MAX_PAGES, 1..=DEFAULT_MAX_PAGES)?,
            oversampling_factor: vars.parse_in(
                "OVERSAMPLING_FACTOR",
                DEFAULT_OVERSAMPLING_FACTOR,
                1..,
            )?,
            log_dir: PathBuf::from(vars.or("LOG_DIR", "logs")),
            llm,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Variable lookup that treats blank values as unset.
struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, var: &str) -> Option<String> {
        (self.0)(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn or(&self, var: &str, default: &str) -> String {
        self.get(var).unwrap_or_else(|| default.to_string())
    }

    /// Parses `var`, using `default` when it is unset or blank.
    fn parse<T: FromStr>(&self, var: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(var) {
            Some(value) => value
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidValue { var, value }),
            None => Ok(default),
        }
    }

    /// Like [`Vars::parse`], but a set value must also fall inside `range`.
    fn parse_in<T, R>(&self, var: &'static str, default: T, range: R) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd,
        R: RangeBounds<T>,
    {
        let Some(value) = self.get(var) else {
            return Ok(default);
        };
        match value.parse::<T>() {
            Ok(parsed) if range.contains(&parsed) => Ok(parsed),
            _ => Err(ConfigError::InvalidValue { var, value }),
        }
    }
}
