//! OpenRouter API client used for conversation summaries.
//!
//! OpenRouter exposes an OpenAI-compatible chat-completions endpoint in front
//! of many hosted models.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// OpenRouter API client
#[derive(Clone)]
pub struct OpenRouterClient {
    api_key: String,
    model: String,
    base_url: String,
    http_client: reqwest::Client,
}

/// Chat message for the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Error response from OpenRouter
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Error)]
pub enum OpenRouterError {
    #[error("OpenRouter API key not configured")]
    NoApiKey,

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Rate limited{}", retry_suffix(.0))]
    RateLimited(Option<u64>),
}

impl OpenRouterClient {
    pub fn new(api_key: String, model: String) -> Result<Self, OpenRouterError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| OpenRouterError::RequestFailed(e.to_string()))?;

        Ok(Self {
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client,
        })
    }

    /// Point the client at another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Make a chat completion request
    pub async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<String, OpenRouterError> {
        if self.api_key.is_empty() {
            return Err(OpenRouterError::NoApiKey);
        }

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens,
            temperature,
        };

        info!(
            target: "openrouter",
            model = %self.model,
            max_tokens = ?max_tokens,
            temperature = ?temperature,
            "OpenRouter request"
        );
        let formatted_messages: String = request
            .messages
            .iter()
            .map(|m| format!("{}---\n{}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        debug!(target: "openrouter", messages = %formatted_messages, "Request messages");

        let start_time = Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", "iMessage Summary")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(
                    target: "openrouter",
                    latency_ms = start_time.elapsed().as_millis(),
                    error = %e,
                    "OpenRouter request failed"
                );
                OpenRouterError::RequestFailed(e.to_string())
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            warn!(
                target: "openrouter",
                latency_ms = start_time.elapsed().as_millis(),
                retry_after = ?retry_after,
                "OpenRouter rate limited"
            );
            return Err(OpenRouterError::RateLimited(retry_after));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| OpenRouterError::RequestFailed(e.to_string()))?;

        let elapsed = start_time.elapsed();

        if !status.is_success() {
            warn!(
                target: "openrouter",
                latency_ms = elapsed.as_millis(),
                status = %status,
                response = %response_text,
                "OpenRouter API error"
            );
            return Err(api_error(status, &response_text));
        }

        info!(
            target: "openrouter",
            latency_ms = elapsed.as_millis(),
            status = %status,
            "OpenRouter response received"
        );
        debug!(target: "openrouter", response = %response_text, "Full response body");

        parse_completion(&response_text)
    }

    /// Chat completion that retries rate limits and transport failures with
    /// exponential backoff. API and parse errors are returned immediately.
    pub async fn chat_completion_with_retry(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        max_retries: u32,
    ) -> Result<String, OpenRouterError> {
        let mut attempt = 0;
        loop {
            let wait_secs = match self
                .chat_completion(messages.clone(), max_tokens, temperature)
                .await
            {
                Ok(result) => return Ok(result),
                Err(OpenRouterError::RateLimited(retry_after)) if attempt < max_retries => {
                    retry_after.unwrap_or(2u64.pow(attempt))
                }
                Err(OpenRouterError::RequestFailed(_)) if attempt < max_retries => {
                    2u64.pow(attempt)
                }
                Err(e) => return Err(e),
            };
            info!(
                target: "openrouter",
                attempt = attempt + 1,
                wait_secs,
                "Retrying OpenRouter request"
            );
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
            attempt += 1;
        }
    }
}

fn retry_suffix(retry_after: &Option<u64>) -> String {
    match retry_after {
        Some(secs) => format!(", retry after {} seconds", secs),
        None => String::new(),
    }
}

fn api_error(status: reqwest::StatusCode, body: &str) -> OpenRouterError {
    if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(body) {
        return OpenRouterError::ApiError(error_response.error.message);
    }
    OpenRouterError::ApiError(format!("HTTP {}: {}", status, body))
}

fn parse_completion(body: &str) -> Result<String, OpenRouterError> {
    let completion: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| OpenRouterError::ParseError(format!("{}: {}", e, body)))?;

    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| OpenRouterError::ParseError("No choices in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"A summary."},"finish_reason":"stop"}],"usage":{"prompt_tokens":1,"completion_tokens":2,"total_tokens":3}}"#;
        assert_eq!(parse_completion(body).expect("content"), "A summary.");
    }

    #[test]
    fn empty_choices_is_parse_error() {
        assert!(matches!(
            parse_completion(r#"{"choices":[]}"#),
            Err(OpenRouterError::ParseError(_))
        ));
        assert!(matches!(
            parse_completion("<html>"),
            Err(OpenRouterError::ParseError(_))
        ));
    }

    #[test]
    fn api_error_prefers_error_message() {
        let err = api_error(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"No auth credentials found","code":401}}"#,
        );
        assert_eq!(err.to_string(), "API error: No auth credentials found");

        let err = api_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "API error: HTTP 502 Bad Gateway: upstream down");
    }

    #[test]
    fn rate_limit_message() {
        assert_eq!(OpenRouterError::RateLimited(None).to_string(), "Rate limited");
        assert_eq!(
            OpenRouterError::RateLimited(Some(3)).to_string(),
            "Rate limited, retry after 3 seconds"
        );
    }

    #[test]
    fn request_omits_unset_options() {
        let request = ChatCompletionRequest {
            model: "openai/gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::system("s"), ChatMessage::user("u")],
            max_tokens: None,
            temperature: Some(0.3),
        };
        let json = serde_json::to_value(&request).expect("json");
        assert!(json.get("max_tokens").is_none());
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "u");
    }

    #[tokio::test]
    async fn missing_key_fails_before_sending() {
        let client = OpenRouterClient::new(String::new(), "m".to_string()).expect("client");
        let result = client
            .chat_completion(vec![ChatMessage::user("hi")], None, None)
            .await;
        assert!(matches!(result, Err(OpenRouterError::NoApiKey)));
    }
}
