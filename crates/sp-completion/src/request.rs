//! Request and reply value types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions framing the conversation
    System,
    /// The asking party
    User,
    /// Earlier model output
    Assistant,
}

/// One role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// System message
    #[inline]
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// User message
    #[inline]
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Function the service is forced to call
///
/// `parameters` is a JSON schema for the call's arguments; the reply is
/// validated against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Value,
}

impl FunctionSchema {
    /// Create function descriptor
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters,
        }
    }

    /// With human readable description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A schema-constrained completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// Ordered conversation
    pub messages: Vec<ChatMessage>,
    /// Function descriptor holding the response schema
    pub function: FunctionSchema,
    /// Name of the function the service must call
    pub directive: String,
    /// Sampling temperature
    pub temperature: f64,
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
}

impl CompletionRequest {
    /// Create request forcing a call to `function`
    #[must_use]
    pub fn new(model: impl Into<String>, function: FunctionSchema) -> Self {
        let directive = function.name.clone();
        Self {
            model: model.into(),
            messages: Vec::new(),
            function,
            directive,
            temperature: 1.0,
            max_output_tokens: 1024,
        }
    }

    /// Append a message
    #[inline]
    #[must_use]
    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// With sampling temperature
    #[inline]
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// With output token ceiling
    #[inline]
    #[must_use]
    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = max;
        self
    }
}

/// Token accounting reported by the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Transport-level reply, before any JSON validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionReply {
    /// Raw function-call arguments; `None` when the model answered in prose
    pub function_arguments: Option<String>,
    /// Model that served the request
    pub model: Option<String>,
    /// Token accounting
    pub usage: Option<TokenUsage>,
}

impl CompletionReply {
    /// Reply carrying function-call arguments
    #[inline]
    #[must_use]
    pub fn with_arguments(arguments: impl Into<String>) -> Self {
        Self {
            function_arguments: Some(arguments.into()),
            ..Self::default()
        }
    }
}
