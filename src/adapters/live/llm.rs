//! Live adapter for the `LlmClient` port using the OpenAI HTTP API.

use std::env;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PortError;
use crate::ports::llm::{CompletionFuture, CompletionRequest, CompletionResponse, LlmClient};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Live LLM client that calls the OpenAI completions APIs.
///
/// Chat models (`gpt-*`) go through `/chat/completions`; anything else is
/// sent to the legacy `/completions` endpoint.
pub struct LiveLlmClient {
    client: Client,
    base_url: String,
}

impl LiveLlmClient {
    /// Creates a client using `OPENAI_BASE_URL` if set, otherwise the public API.
    #[must_use]
    pub fn new() -> Self {
        let base_url = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Self::with_base_url(base_url)
    }

    /// Creates a client against an explicit API base URL.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

impl Default for LiveLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns `true` when the model is served by the chat completions endpoint.
#[must_use]
pub fn is_chat_model(model: &str) -> bool {
    model.starts_with("gpt")
}

/// API path, relative to the base URL, that serves `model`.
#[must_use]
pub fn endpoint_path(model: &str) -> &'static str {
    if is_chat_model(model) {
        "/chat/completions"
    } else {
        "/completions"
    }
}

/// Request body for `/chat/completions`.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

/// A single message in a chat request.
#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Request body for the legacy `/completions` endpoint.
#[derive(Serialize)]
struct TextRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    prompt: &'a str,
}

/// Response shared by both endpoints; chat choices carry `message`, text
/// choices carry `text`.
#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Error response from the OpenAI API.
#[derive(Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

impl LlmClient for LiveLlmClient {
    fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
                PortError::from("OPENAI_API_KEY environment variable not set")
            })?;

            let endpoint = endpoint_path(&request.model);
            info!(model = %request.model, endpoint, "requesting completion");
            let url = format!("{}{endpoint}", self.base_url);
            let builder = if is_chat_model(&request.model) {
                self.client.post(url).json(&ChatRequest {
                    model: &request.model,
                    max_tokens: request.max_tokens,
                    temperature: request.temperature,
                    messages: vec![ChatMessage {
                        role: "user",
                        content: &request.prompt,
                    }],
                })
            } else {
                self.client.post(url).json(&TextRequest {
                    model: &request.model,
                    max_tokens: request.max_tokens,
                    temperature: request.temperature,
                    prompt: &request.prompt,
                })
            };

            let response = builder.bearer_auth(&api_key).send().await.map_err(
                |e| -> PortError { format!("OpenAI API request failed: {e}").into() },
            )?;

            let status = response.status();
            let response_text = response.text().await.map_err(|e| -> PortError {
                format!("Failed to read OpenAI API response: {e}").into()
            })?;

            if !status.is_success() {
                let msg = serde_json::from_str::<OpenAiError>(&response_text)
                    .map(|e| e.error.message)
                    .unwrap_or(response_text);
                return Err(format!("OpenAI API error ({}): {msg}", status.as_u16()).into());
            }

            parse_response(&response_text)
        })
    }
}

fn parse_response(body: &str) -> Result<CompletionResponse, PortError> {
    let api_response: OpenAiResponse = serde_json::from_str(body).map_err(|e| -> PortError {
        format!("Failed to parse OpenAI API response: {e}").into()
    })?;

    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| PortError::from("OpenAI API response contained no choices"))?;
    let text = choice
        .message
        .and_then(|m| m.content)
        .or(choice.text)
        .unwrap_or_default();
    let (prompt_tokens, completion_tokens) =
        api_response.usage.map_or((0, 0), |u| (u.prompt_tokens, u.completion_tokens));

    Ok(CompletionResponse {
        text,
        prompt_tokens,
        completion_tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpt_models_use_chat_endpoint() {
        assert!(is_chat_model("gpt-3.5-turbo"));
        assert!(is_chat_model("gpt-4o"));
        assert!(!is_chat_model("text-davinci-003"));
    }

    #[test]
    fn endpoint_follows_model_family() {
        assert_eq!(endpoint_path("gpt-3.5-turbo"), "/chat/completions");
        assert_eq!(endpoint_path("text-davinci-003"), "/completions");
    }

    #[test]
    fn parses_chat_response() {
        let body = r#"{
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Sorts a dataset."}
            }],
            "usage": {"prompt_tokens": 42, "completion_tokens": 5, "total_tokens": 47}
        }"#;
        let resp = parse_response(body).unwrap();
        assert_eq!(resp.text, "Sorts a dataset.");
        assert_eq!(resp.prompt_tokens, 42);
        assert_eq!(resp.completion_tokens, 5);
    }

    #[test]
    fn parses_text_completion_response_without_usage() {
        let body = r#"{"choices": [{"text": " Prints a table."}]}"#;
        let resp = parse_response(body).unwrap();
        assert_eq!(resp.text, " Prints a table.");
        assert_eq!(resp.prompt_tokens, 0);
    }

    #[test]
    fn empty_choices_is_an_error() {
        let err = parse_response(r#"{"choices": []}"#).unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = LiveLlmClient::with_base_url("http://localhost:8080/v1/");
        assert_eq!(client.base_url, "http://localhost:8080/v1");
    }
}
