//! OpenAI chat-completions transport
//!
//! Sends the request with a single function tool and a `tool_choice` forcing
//! it, then reads the call's arguments from the first choice. Replies that use
//! the legacy `function_call` field are accepted too.

use crate::error::{CompletionError, TransportError};
use crate::request::{CompletionReply, CompletionRequest, TokenUsage};
use crate::transport::CompletionTransport;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_KEY";
/// Optional environment override of the API base URL
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
/// Public API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings for the chat-completions API
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    120_000
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl OpenAiConfig {
    /// Create configuration for an API key
    #[inline]
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Read `OPENAI_KEY` and optional `OPENAI_BASE_URL`
    ///
    /// # Errors
    /// `CompletionError::Config` if the key is missing or empty.
    pub fn from_env() -> Result<Self, CompletionError> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CompletionError::Config(format!("{API_KEY_ENV} is not set")))?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        Ok(config)
    }

    /// With API base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With per-request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// reqwest-backed [`CompletionTransport`]
#[derive(Debug, Clone)]
pub struct OpenAiTransport {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiTransport {
    /// Build transport with its own HTTP client
    ///
    /// # Errors
    /// `TransportError::Http` if the HTTP client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl CompletionTransport for OpenAiTransport {
    async fn send(&self, request: &CompletionRequest) -> Result<CompletionReply, TransportError> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request_body(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_reply(&body)
    }
}

/// Build the JSON body for a request
#[must_use]
pub fn request_body(request: &CompletionRequest) -> Value {
    json!({
        "model": request.model,
        "messages": request.messages,
        "tools": [{
            "type": "function",
            "function": request.function,
        }],
        "tool_choice": {
            "type": "function",
            "function": {"name": request.directive},
        },
        "temperature": request.temperature,
        "max_tokens": request.max_output_tokens,
    })
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

#[derive(Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Deserialize)]
struct FunctionCall {
    arguments: String,
}

/// Decode a chat-completions reply body
///
/// A well-formed envelope without a function call yields
/// `function_arguments: None`; the client treats that as a malformed reply.
///
/// # Errors
/// `TransportError::Decode` if the body is not a chat-completions envelope.
pub fn parse_reply(body: &str) -> Result<CompletionReply, TransportError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;

    let function_arguments = response.choices.into_iter().next().and_then(|choice| {
        let ReplyMessage {
            tool_calls,
            function_call,
        } = choice.message;
        tool_calls
            .and_then(|calls| calls.into_iter().next())
            .map(|call| call.function.arguments)
            .or_else(|| function_call.map(|call| call.arguments))
    });

    Ok(CompletionReply {
        function_arguments,
        model: response.model,
        usage: response.usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ChatMessage, FunctionSchema};

    #[test]
    fn body_forces_the_function() {
        let request = CompletionRequest::new(
            "gpt-3.5-turbo-0613",
            FunctionSchema::new("Generate_keywords", json!({"type": "object"})),
        )
        .with_message(ChatMessage::system("be precise"))
        .with_temperature(0.5)
        .with_max_output_tokens(3700);

        let body = request_body(&request);
        assert_eq!(body["model"], "gpt-3.5-turbo-0613");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["tools"][0]["function"]["name"], "Generate_keywords");
        assert_eq!(body["tool_choice"]["function"]["name"], "Generate_keywords");
        assert_eq!(body["max_tokens"], 3700);
        assert_eq!(body["temperature"], 0.5);
    }

    #[test]
    fn temperature_keeps_its_decimal_form() {
        let request =
            CompletionRequest::new("m", FunctionSchema::new("f", json!({"type": "object"})))
                .with_temperature(0.9);
        assert_eq!(request_body(&request)["temperature"].to_string(), "0.9");
    }

    #[test]
    fn reads_tool_call_arguments() {
        let body = r#"{
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": null,
                "tool_calls": [{"id": "c1", "type": "function",
                    "function": {"name": "Generate_keywords", "arguments": "{\"gettyKeywords\":[\"cat\"]}"}}]}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let reply = parse_reply(body).unwrap();
        assert_eq!(
            reply.function_arguments.as_deref(),
            Some(r#"{"gettyKeywords":["cat"]}"#)
        );
        assert_eq!(reply.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn reads_legacy_function_call() {
        let body = r#"{"choices": [{"message": {"function_call":
            {"name": "Generate_keywords", "arguments": "{}"}}}]}"#;
        let reply = parse_reply(body).unwrap();
        assert_eq!(reply.function_arguments.as_deref(), Some("{}"));
    }

    #[test]
    fn prose_reply_has_no_arguments() {
        let body = r#"{"choices": [{"message": {"content": "Sure! cat, dog", "tool_calls": null}}]}"#;
        let reply = parse_reply(body).unwrap();
        assert!(reply.function_arguments.is_none());
    }

    #[test]
    fn garbage_body_is_decode_error() {
        assert!(matches!(
            parse_reply("<html>bad gateway</html>"),
            Err(TransportError::Decode(_))
        ));
    }

    #[test]
    fn debug_redacts_key() {
        let config = OpenAiConfig::new("sk-secret");
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}
