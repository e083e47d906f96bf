//! W3C WebDriver client over reqwest
//!
//! Talks to a running chromedriver or geckodriver. Only the handful of
//! commands the upload macros need are implemented.

use crate::driver::{Cookie, ElementRef, PageDriver};
use crate::error::DriverError;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Key under which WebDriver returns element references
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Driver endpoint and browser capabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebDriverConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Sent as `capabilities.alwaysMatch`
    #[serde(default = "default_capabilities")]
    pub capabilities: Value,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_endpoint() -> String {
    "http://localhost:9515".to_string()
}

fn default_capabilities() -> Value {
    json!({"browserName": "chrome"})
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            capabilities: default_capabilities(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl WebDriverConfig {
    /// Create configuration for a driver endpoint
    #[inline]
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// With browser capabilities
    #[inline]
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Value) -> Self {
        self.capabilities = capabilities;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ErrorValue {
    error: String,
    #[serde(default)]
    message: String,
}

/// A live WebDriver session
#[derive(Debug)]
pub struct WebDriverClient {
    http: reqwest::Client,
    session_url: String,
    session_id: String,
    closed: AtomicBool,
}

impl WebDriverClient {
    /// Start a new browser session
    ///
    /// # Errors
    /// - `DriverError::Http` if the driver is unreachable
    /// - `DriverError::Command` if the driver refuses the session
    /// - `DriverError::Decode` if the reply carries no session id
    pub async fn connect(config: &WebDriverConfig) -> Result<Self, DriverError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        let endpoint = config.endpoint.trim_end_matches('/');

        let body = json!({"capabilities": {"alwaysMatch": config.capabilities}});
        let value = send(&http, Method::POST, &format!("{endpoint}/session"), Some(&body)).await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::Decode(format!("no session id in {value}")))?
            .to_string();

        tracing::info!(session = %session_id, endpoint, "browser session started");
        Ok(Self {
            http,
            session_url: format!("{endpoint}/session/{session_id}"),
            session_id,
            closed: AtomicBool::new(false),
        })
    }

    /// Session id assigned by the driver
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, DriverError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DriverError::Closed);
        }
        send(&self.http, method, &format!("{}{path}", self.session_url), body).await
    }
}

async fn send(
    http: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<&Value>,
) -> Result<Value, DriverError> {
    let mut request = http.request(method, url);
    if let Some(body) = body {
        request = request.json(body);
    }
    let response = request.send().await?;
    let status = response.status().as_u16();
    let text = response.text().await?;
    read_response(status, &text)
}

/// Unwrap the `value` member of a driver response
///
/// # Errors
/// `DriverError::Command` for WebDriver errors, `DriverError::Decode` for
/// bodies that are not WebDriver JSON.
pub fn read_response(status: u16, body: &str) -> Result<Value, DriverError> {
    let mut parsed: Value = serde_json::from_str(body)
        .map_err(|e| DriverError::Decode(format!("status {status}: {e}")))?;
    let value = parsed.get_mut("value").map(Value::take).unwrap_or(Value::Null);

    if (200..300).contains(&status) {
        return Ok(value);
    }
    let error: ErrorValue = serde_json::from_value(value)
        .map_err(|e| DriverError::Decode(format!("status {status}: {e}")))?;
    Err(DriverError::Command {
        status,
        error: error.error,
        message: error.message,
    })
}

/// Extract the element reference from a find result
///
/// # Errors
/// `DriverError::Decode` if the value holds no element id.
pub fn element_from_value(value: &Value) -> Result<ElementRef, DriverError> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(ElementRef::new)
        .ok_or_else(|| DriverError::Decode(format!("not an element reference: {value}")))
}

#[async_trait::async_trait]
impl PageDriver for WebDriverClient {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        tracing::debug!(url, "navigate");
        self.command(Method::POST, "/url", Some(&json!({"url": url})))
            .await
            .map(drop)
    }

    async fn add_cookie(&self, cookie: &Cookie) -> Result<(), DriverError> {
        self.command(Method::POST, "/cookie", Some(&json!({"cookie": cookie})))
            .await
            .map(drop)
    }

    async fn find(&self, selector: &str) -> Result<Option<ElementRef>, DriverError> {
        let body = json!({"using": "css selector", "value": selector});
        match self.command(Method::POST, "/element", Some(&body)).await {
            Ok(value) => element_from_value(&value).map(Some),
            Err(err) if err.code() == Some("no such element") => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn click(&self, element: &ElementRef) -> Result<(), DriverError> {
        let path = format!("/element/{}/click", element.id());
        self.command(Method::POST, &path, Some(&json!({})))
            .await
            .map(drop)
    }

    async fn send_file(&self, element: &ElementRef, path: &Path) -> Result<(), DriverError> {
        let command = format!("/element/{}/value", element.id());
        let body = json!({"text": path.display().to_string()});
        self.command(Method::POST, &command, Some(&body))
            .await
            .map(drop)
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.command(Method::DELETE, "", None).await?;
        self.closed.store(true, Ordering::Release);
        tracing::info!(session = %self.session_id, "browser session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_success_value() {
        let value = read_response(200, r#"{"value": {"sessionId": "s1", "capabilities": {}}}"#)
            .unwrap();
        assert_eq!(value["sessionId"], "s1");
        assert_eq!(read_response(200, r#"{"value": null}"#).unwrap(), Value::Null);
    }

    #[test]
    fn maps_webdriver_errors() {
        let err = read_response(
            404,
            r#"{"value": {"error": "no such element", "message": "Unable to locate", "stacktrace": ""}}"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), Some("no such element"));

        let err = read_response(500, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, DriverError::Decode(_)));
    }

    #[test]
    fn element_reference() {
        let value = json!({ELEMENT_KEY: "e-42"});
        assert_eq!(element_from_value(&value).unwrap().id(), "e-42");
        assert!(element_from_value(&json!({})).is_err());
    }

    #[test]
    fn config_defaults() {
        let config: WebDriverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.endpoint, "http://localhost:9515");
        assert_eq!(config.capabilities["browserName"], "chrome");
    }
}
