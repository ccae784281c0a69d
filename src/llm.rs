use anyhow::{anyhow, Context};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
};
use async_openai::Client as OpenAIClient;
use async_trait::async_trait;
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::generation::options::GenerationOptions;
use ollama_rs::generation::parameters::FormatType;
use ollama_rs::Ollama;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::environment::{LlmConfig, LlmProvider};
use crate::insights::{Suggestion, SuggestionProvider};
use crate::prompts::{improvement_prompt, SYSTEM_PROMPT};
use crate::{LLMClient, LLMParams, TARGET_LLM_REQUEST};

/// Structured answer expected from the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AiAnalysisResult {
    pub suggestions: Vec<Suggestion>,
}

/// Builds LLM parameters for the configured provider. Returns `None` when the
/// provider cannot be used, e.g. OpenAI without an API key.
pub fn build_llm_params(config: &LlmConfig) -> Option<LLMParams> {
    let llm_client = match config.provider {
        LlmProvider::OpenAI => {
            let Some(api_key) = config.openai_api_key.as_deref() else {
                warn!(target: TARGET_LLM_REQUEST, "OPENAI_API_KEY is not set, AI insights are disabled");
                return None;
            };
            let openai_config = OpenAIConfig::new().with_api_key(api_key);
            LLMClient::OpenAI(OpenAIClient::with_config(openai_config))
        }
        LlmProvider::Ollama => {
            if let Err(e) = Url::parse(&config.ollama_host) {
                error!(target: TARGET_LLM_REQUEST, "Invalid OLLAMA_HOST {:?}: {}", config.ollama_host, e);
                return None;
            }
            LLMClient::Ollama(Ollama::new(config.ollama_host.clone(), config.ollama_port))
        }
    };

    Some(LLMParams {
        llm_client,
        model: config.model.clone(),
        temperature: config.temperature,
        timeout_secs: config.timeout.as_secs(),
        max_retries: config.max_retries,
    })
}

/// Sends `prompt` to the configured model, retrying with exponential backoff.
/// Returns `None` once every attempt has failed or timed out.
pub async fn generate_llm_response(
    system: &str,
    prompt: &str,
    params: &LLMParams,
) -> Option<String> {
    let max_retries = params.max_retries.max(1);
    let mut response_text = String::new();
    let mut backoff = 2;

    debug!(target: TARGET_LLM_REQUEST, "Starting LLM response generation with model {}", params.model);

    for retry_count in 0..max_retries {
        let attempt = async {
            match &params.llm_client {
                LLMClient::OpenAI(client) => request_openai(client, system, prompt, params).await,
                LLMClient::Ollama(ollama) => request_ollama(ollama, system, prompt, params).await,
            }
        };

        match timeout(Duration::from_secs(params.timeout_secs), attempt).await {
            Ok(Ok(response)) if !response.trim().is_empty() => {
                response_text = response;
                debug!(target: TARGET_LLM_REQUEST, "LLM response received: {}", response_text);
                break;
            }
            Ok(Ok(_)) => {
                warn!(target: TARGET_LLM_REQUEST, "LLM returned an empty response");
            }
            Ok(Err(e)) => {
                warn!(target: TARGET_LLM_REQUEST, "Error generating response: {:#}", e);
            }
            Err(_) => {
                warn!(target: TARGET_LLM_REQUEST, "LLM request timed out after {}s", params.timeout_secs);
            }
        }

        if retry_count < max_retries - 1 {
            info!(target: TARGET_LLM_REQUEST, "Retrying LLM request in {}s... ({}/{})", backoff, retry_count + 1, max_retries);
            sleep(Duration::from_secs(backoff)).await;
            backoff *= 2; // Exponential backoff
        }
    }

    if response_text.is_empty() {
        error!(target: TARGET_LLM_REQUEST, "No response generated after {} attempts", max_retries);
        None
    } else {
        Some(response_text)
    }
}

async fn request_openai(
    client: &OpenAIClient<OpenAIConfig>,
    system: &str,
    prompt: &str,
    params: &LLMParams,
) -> anyhow::Result<String> {
    let schema = serde_json::to_value(schema_for!(AiAnalysisResult))?;
    let request = CreateChatCompletionRequestArgs::default()
        .model(params.model.as_str())
        .temperature(params.temperature)
        .messages(vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into(),
        ])
        .response_format(ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: Some("Prioritized improvement suggestions".to_string()),
                name: "ai_analysis_result".to_string(),
                schema: Some(schema),
                strict: None,
            },
        })
        .build()?;

    let response = client
        .chat()
        .create(request)
        .await
        .context("OpenAI chat completion failed")?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("OpenAI response contained no message content"))
}

async fn request_ollama(
    ollama: &Ollama,
    system: &str,
    prompt: &str,
    params: &LLMParams,
) -> anyhow::Result<String> {
    let mut request = GenerationRequest::new(params.model.clone(), prompt.to_string());
    request.options = Some(GenerationOptions::default().temperature(params.temperature));
    request.system = Some(system.to_string().into());
    request.format = Some(FormatType::Json);

    let response = ollama
        .generate(request)
        .await
        .map_err(|e| anyhow!("Ollama generation failed: {}", e))?;
    Ok(response.response)
}

/// Parses the model output, tolerating a surrounding Markdown code fence or
/// stray text around the JSON object.
pub fn parse_suggestions(raw: &str) -> anyhow::Result<Vec<Suggestion>> {
    let trimmed = raw.trim();
    let json = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => return Err(anyhow!("No JSON object in LLM response")),
    };
    let result: AiAnalysisResult =
        serde_json::from_str(json).context("LLM response did not match the expected schema")?;
    Ok(result.suggestions)
}

/// Improvement suggestions backed by an OpenAI or Ollama model.
#[derive(Debug, Clone)]
pub struct LlmSuggester {
    params: LLMParams,
}

impl LlmSuggester {
    pub fn new(params: LLMParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &LlmConfig) -> Option<Self> {
        build_llm_params(config).map(Self::new)
    }
}

#[async_trait]
impl SuggestionProvider for LlmSuggester {
    async fn suggest(
        &self,
        sample_size: usize,
        reviews_text: &str,
    ) -> anyhow::Result<Vec<Suggestion>> {
        let prompt = improvement_prompt(sample_size, reviews_text);
        let response = generate_llm_response(SYSTEM_PROMPT, &prompt, &self.params)
            .await
            .ok_or_else(|| anyhow!("LLM did not return a response"))?;
        parse_suggestions(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::Priority;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SUGGESTIONS_JSON: &str = r#"{"suggestions":[{"area":"Stability","description":"Fix crash on launch","priority":"High"},{"area":"Ads","description":"Reduce ad frequency","priority":"Medium"}]}"#;

    fn llm_config(provider: LlmProvider) -> LlmConfig {
        LlmConfig {
            provider,
            openai_api_key: None,
            model: "test-model".to_string(),
            temperature: 0.0,
            ollama_host: "http://localhost".to_string(),
            ollama_port: 11434,
            timeout: Duration::from_secs(5),
            max_retries: 1,
        }
    }

    fn params(llm_client: LLMClient) -> LLMParams {
        LLMParams {
            llm_client,
            model: "test-model".to_string(),
            temperature: 0.0,
            timeout_secs: 5,
            max_retries: 1,
        }
    }

    fn ollama_for(server: &MockServer) -> LLMClient {
        let port = server.address().port();
        LLMClient::Ollama(Ollama::new("http://127.0.0.1".to_string(), port))
    }

    #[test]
    fn parses_plain_and_fenced_json() {
        let plain = parse_suggestions(SUGGESTIONS_JSON).unwrap();
        assert_eq!(plain.len(), 2);
        assert_eq!(plain[0].priority, Priority::High);

        let fenced = format!("```json\n{}\n```", SUGGESTIONS_JSON);
        assert_eq!(parse_suggestions(&fenced).unwrap(), plain);
    }

    #[test]
    fn rejects_non_json_and_wrong_shape() {
        assert!(parse_suggestions("I could not find any issues.").is_err());
        assert!(parse_suggestions(r#"{"ideas": []}"#).is_err());
        assert!(parse_suggestions(
            r#"{"suggestions":[{"area":"UI","description":"x","priority":"Urgent"}]}"#
        )
        .is_err());
    }

    #[test]
    fn openai_without_key_is_disabled() {
        assert!(build_llm_params(&llm_config(LlmProvider::OpenAI)).is_none());

        let mut config = llm_config(LlmProvider::OpenAI);
        config.openai_api_key = Some("sk-test".to_string());
        let params = build_llm_params(&config).unwrap();
        assert!(matches!(params.llm_client, LLMClient::OpenAI(_)));
        assert_eq!(params.timeout_secs, 5);
    }

    #[test]
    fn ollama_requires_valid_host() {
        let params = build_llm_params(&llm_config(LlmProvider::Ollama)).unwrap();
        assert!(matches!(params.llm_client, LLMClient::Ollama(_)));

        let mut config = llm_config(LlmProvider::Ollama);
        config.ollama_host = "not a url".to_string();
        assert!(build_llm_params(&config).is_none());
    }

    #[tokio::test]
    async fn openai_suggester_parses_structured_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "created": 1700000000,
                "model": "test-model",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": SUGGESTIONS_JSON},
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = OpenAIConfig::new()
            .with_api_key("sk-test")
            .with_api_base(server.uri());
        let suggester = LlmSuggester::new(params(LLMClient::OpenAI(OpenAIClient::with_config(config))));

        let suggestions = suggester.suggest(1, "- Crashes on launch").await.unwrap();
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[1].area, "Ads");
    }

    #[tokio::test]
    async fn ollama_suggester_tolerates_code_fence() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "test-model",
                "created_at": "2024-01-01T00:00:00Z",
                "response": format!("```json\n{}\n```", SUGGESTIONS_JSON),
                "done": true
            })))
            .mount(&server)
            .await;

        let suggester = LlmSuggester::new(params(ollama_for(&server)));
        let suggestions = suggester.suggest(2, "- a\n- b").await.unwrap();
        assert_eq!(suggestions[0].description, "Fix crash on launch");
    }

    #[tokio::test]
    async fn failed_generation_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let suggester = LlmSuggester::new(params(ollama_for(&server)));
        assert!(suggester.suggest(1, "- broken").await.is_err());
    }
}
