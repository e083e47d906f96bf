//! Keyword extraction through a structured completion

use crate::error::KeywordError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sp_completion::{
    ChatMessage, CompletionRequest, CompletionTransport, FunctionSchema,
    StructuredCompletionClient,
};

/// Arguments the model must fill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct KeywordPayload {
    /// The keywords to search for in Getty Images
    #[serde(rename = "gettyKeywords")]
    pub getty_keywords: Vec<String>,
}

impl KeywordPayload {
    /// JSON schema of the payload, as sent in the function descriptor
    ///
    /// # Errors
    /// `KeywordError::Schema` if the generated schema does not serialize.
    pub fn schema() -> Result<Value, KeywordError> {
        let schema = schemars::schema_for!(KeywordPayload);
        let mut value =
            serde_json::to_value(&schema).map_err(|e| KeywordError::Schema(e.to_string()))?;
        if let Some(object) = value.as_object_mut() {
            object.remove("$schema");
        }
        Ok(value)
    }
}

/// Prompt and sampling settings for the keyword step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordConfig {
    pub model: String,
    pub function_name: String,
    pub system_prompt: String,
    /// Number of keywords requested in the prompt
    pub keyword_count: usize,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl KeywordConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With model identifier
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// With requested keyword count
    #[inline]
    #[must_use]
    pub fn with_keyword_count(mut self, count: usize) -> Self {
        self.keyword_count = count;
        self
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo-0613".to_string(),
            function_name: "Generate_keywords".to_string(),
            system_prompt: "You are an AI assistant helping a user generate keywords for images. \
                This is for Getty Images which only uses specific keywords and you can't choose \
                outside that. So be precise."
                .to_string(),
            keyword_count: 20,
            temperature: 0.9,
            max_output_tokens: 3700,
        }
    }
}

/// Builds keyword requests and decodes their answers
#[derive(Debug, Clone)]
pub struct KeywordExtractor<T> {
    client: StructuredCompletionClient<T>,
    config: KeywordConfig,
}

impl<T: CompletionTransport> KeywordExtractor<T> {
    /// Create extractor over a completion client
    #[inline]
    #[must_use]
    pub fn new(client: StructuredCompletionClient<T>) -> Self {
        Self {
            client,
            config: KeywordConfig::default(),
        }
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: KeywordConfig) -> Self {
        self.config = config;
        self
    }

    /// Completion client in use
    #[inline]
    #[must_use]
    pub fn client(&self) -> &StructuredCompletionClient<T> {
        &self.client
    }

    /// Build the completion request for a description
    ///
    /// # Errors
    /// `KeywordError::Schema` if the payload schema cannot be produced.
    pub fn build_request(&self, description: &str) -> Result<CompletionRequest, KeywordError> {
        let function = FunctionSchema::new(&self.config.function_name, KeywordPayload::schema()?)
            .with_description("Generate stock photo keywords for an image description");

        Ok(CompletionRequest::new(&self.config.model, function)
            .with_message(ChatMessage::system(&self.config.system_prompt))
            .with_message(ChatMessage::user(format!(
                "Please generate {} keywords for the image: {description}",
                self.config.keyword_count
            )))
            .with_temperature(self.config.temperature)
            .with_max_output_tokens(self.config.max_output_tokens))
    }

    /// Ask the service for keywords describing `description`
    ///
    /// Keywords are returned exactly as the service listed them.
    ///
    /// # Errors
    /// - `KeywordError::Completion` when the client gives up
    /// - `KeywordError::Decode` if the validated payload does not decode
    pub async fn extract(&self, description: &str) -> Result<Vec<String>, KeywordError> {
        let request = self.build_request(description)?;
        let value = self.client.complete(&request).await?;
        let payload: KeywordPayload = serde_json::from_value(value)?;
        Ok(payload.getty_keywords)
    }
}
