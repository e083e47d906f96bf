//! Replicate predictions captioner
//!
//! Creates a prediction for a hosted captioning model, asking the API to hold
//! the connection until it finishes (`Prefer: wait`). Predictions still
//! running when that returns are polled until they settle or time out.

use crate::caption::Captioner;
use crate::error::CaptionError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Environment variable holding the API token
pub const API_TOKEN_ENV: &str = "REPLICATE_API_TOKEN";
/// Public API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";
/// BLIP image captioning model
pub const DEFAULT_MODEL: &str =
    "salesforce/blip:2e1dddc8621f72155f24cf2e0adbde548458d3cab9f00c0139eea840d0ac4746";

/// Connection and polling settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ReplicateConfig {
    pub api_token: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// `owner/name:version` or a bare version id
    #[serde(default = "default_model")]
    pub model: String,
    /// Delay between status polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up on a prediction after this many milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_timeout_ms() -> u64 {
    120_000
}

impl std::fmt::Debug for ReplicateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateConfig")
            .field("api_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl ReplicateConfig {
    /// Create configuration for an API token
    #[inline]
    #[must_use]
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: default_base_url(),
            model: default_model(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Read `REPLICATE_API_TOKEN`
    ///
    /// # Errors
    /// `CaptionError::Config` if the token is missing or empty.
    pub fn from_env() -> Result<Self, CaptionError> {
        std::env::var(API_TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .map(Self::new)
            .ok_or_else(|| CaptionError::Config(format!("{API_TOKEN_ENV} is not set")))
    }

    /// With API base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With model reference
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Version id part of the model reference
    #[must_use]
    pub fn version(&self) -> &str {
        self.model
            .rsplit_once(':')
            .map_or(self.model.as_str(), |(_, version)| version)
    }
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    id: Option<String>,
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: String,
}

/// reqwest-backed [`Captioner`]
#[derive(Debug, Clone)]
pub struct ReplicateCaptioner {
    http: reqwest::Client,
    config: ReplicateConfig,
}

impl ReplicateCaptioner {
    /// Build captioner with its own HTTP client
    ///
    /// # Errors
    /// `CaptionError::Http` if the HTTP client cannot be built.
    pub fn new(config: ReplicateConfig) -> Result<Self, CaptionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { http, config })
    }

    async fn read_prediction(response: reqwest::Response) -> Result<Prediction, CaptionError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CaptionError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| CaptionError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Captioner for ReplicateCaptioner {
    async fn caption(&self, image_data_uri: &str) -> Result<String, CaptionError> {
        let url = format!(
            "{}/predictions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = json!({
            "version": self.config.version(),
            "input": {"image": image_data_uri},
        });

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_token)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await?;
        let mut prediction = Self::read_prediction(response).await?;

        let timeout = Duration::from_millis(self.config.timeout_ms);
        let deadline = tokio::time::Instant::now() + timeout;
        let poll = Duration::from_millis(self.config.poll_interval_ms);

        while is_running(&prediction.status) {
            let Some(get_url) = prediction.urls.as_ref().map(|urls| urls.get.clone()) else {
                return Err(CaptionError::Decode(
                    "running prediction has no status url".to_string(),
                ));
            };
            if tokio::time::Instant::now() + poll > deadline {
                return Err(CaptionError::Timeout(timeout));
            }
            tracing::debug!(id = ?prediction.id, status = %prediction.status, "waiting for caption");
            tokio::time::sleep(poll).await;

            let response = self
                .http
                .get(get_url)
                .bearer_auth(&self.config.api_token)
                .send()
                .await?;
            prediction = Self::read_prediction(response).await?;
        }

        if prediction.status != "succeeded" {
            let message = prediction
                .error
                .map_or_else(|| "no error message".to_string(), |e| value_text(&e));
            return Err(CaptionError::Prediction {
                status: prediction.status,
                message,
            });
        }

        normalize_output(prediction.output.as_ref().unwrap_or(&Value::Null))
    }
}

fn is_running(status: &str) -> bool {
    matches!(status, "starting" | "processing")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Turn prediction output into a caption
///
/// Strings are used as is, arrays of strings (streamed tokens) are joined,
/// and a leading `Caption:` label is removed.
///
/// # Errors
/// - `CaptionError::Decode` for any other output shape
/// - `CaptionError::EmptyOutput` if nothing is left after trimming
pub fn normalize_output(output: &Value) -> Result<String, CaptionError> {
    let text = match output {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .map(|part| {
                part.as_str()
                    .ok_or_else(|| CaptionError::Decode(format!("non-string output part: {part}")))
            })
            .collect::<Result<String, _>>()?,
        Value::Null => return Err(CaptionError::EmptyOutput),
        other => return Err(CaptionError::Decode(format!("unexpected output: {other}"))),
    };

    let trimmed = text.trim();
    let caption = trimmed
        .strip_prefix("Caption:")
        .or_else(|| trimmed.strip_prefix("caption:"))
        .unwrap_or(trimmed)
        .trim();

    if caption.is_empty() {
        Err(CaptionError::EmptyOutput)
    } else {
        Ok(caption.to_string())
    }
}
