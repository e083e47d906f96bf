//! Bounded-retry structured completion client
//!
//! `complete` returns only once a reply parses as JSON and conforms to the
//! request's schema. Transport failures and malformed replies each consume one
//! attempt from the shared budget; the wait before the next attempt comes from
//! the backoff for the kind of failure that just happened.

use crate::error::{AttemptFailure, CompletionError};
use crate::request::{ChatMessage, CompletionRequest};
use crate::retry::RetryPolicy;
use crate::transport::CompletionTransport;
use crate::validate::{check_request, ReplyValidator};
use serde_json::Value;
use std::borrow::Cow;

/// Retrying client over a [`CompletionTransport`]
#[derive(Debug, Clone)]
pub struct StructuredCompletionClient<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: CompletionTransport> StructuredCompletionClient<T> {
    /// Create client with the default retry policy
    #[inline]
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
        }
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active retry policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Underlying transport
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Obtain a schema-conformant JSON value
    ///
    /// # Errors
    /// - `CompletionError::InvalidRequest` if a precondition fails (no request is sent)
    /// - `CompletionError::Rejected` on a non-retryable rejection when the policy fails fast
    /// - `CompletionError::MaxRetriesExceeded` once the attempt budget is spent
    pub async fn complete(&self, request: &CompletionRequest) -> Result<Value, CompletionError> {
        check_request(request)?;
        let validator = ReplyValidator::compile(&request.function.parameters)?;

        let max_attempts = self.policy.max_attempts;
        let mut current = Cow::Borrowed(request);
        let mut last_failure: Option<AttemptFailure> = None;

        for attempt in 1..=max_attempts {
            if let Some(previous) = &last_failure {
                let backoff = if previous.is_malformed() {
                    self.policy.malformed_backoff
                } else {
                    self.policy.transport_backoff
                };
                let wait = backoff.delay_before(attempt);
                if !wait.is_zero() {
                    tracing::info!(attempt, wait_ms = wait.as_millis(), "retrying completion");
                    tokio::time::sleep(wait).await;
                }
            }

            let reply = match self.transport.send(&current).await {
                Ok(reply) => reply,
                Err(err) => {
                    if !self.policy.retry_client_errors && !err.is_retryable() {
                        tracing::error!(attempt, status = ?err.status(), error = %err, "completion rejected");
                        return Err(CompletionError::Rejected(err));
                    }
                    tracing::warn!(attempt, status = ?err.status(), error = %err, "completion request failed");
                    last_failure = Some(AttemptFailure::Transport(err));
                    continue;
                }
            };

            match validator.parse(reply.function_arguments.as_deref()) {
                Ok(value) => {
                    tracing::debug!(attempt, model = ?reply.model, "completion accepted");
                    return Ok(value);
                }
                Err(reason) => {
                    tracing::warn!(attempt, reason = %reason, "model reply was not valid JSON for the schema, retrying");
                    if self.policy.repair_prompt {
                        current
                            .to_mut()
                            .messages
                            .push(ChatMessage::user(repair_message(&reason)));
                    }
                    last_failure = Some(AttemptFailure::Malformed(reason));
                }
            }
        }

        match last_failure {
            Some(last) => {
                tracing::error!(attempts = max_attempts, error = %last, "maximum retries reached");
                Err(CompletionError::MaxRetriesExceeded {
                    attempts: max_attempts,
                    last,
                })
            }
            None => Err(CompletionError::InvalidRequest(
                "retry policy allows zero attempts".to_string(),
            )),
        }
    }
}

fn repair_message(reason: &str) -> String {
    format!(
        "Your previous reply could not be used ({reason}). \
         Call the function again with arguments that are valid JSON matching its schema."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::request::{CompletionReply, FunctionSchema};
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays a fixed list of outcomes and records every request it saw
    struct Replay {
        outcomes: Mutex<Vec<Result<CompletionReply, TransportError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl Replay {
        fn new(mut outcomes: Vec<Result<CompletionReply, TransportError>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl CompletionTransport for Replay {
        async fn send(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionReply, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(TransportError::Decode("script exhausted".into())))
        }
    }

    fn request() -> CompletionRequest {
        let schema = json!({
            "type": "object",
            "properties": {"tags": {"type": "array", "items": {"type": "string"}}},
            "required": ["tags"]
        });
        CompletionRequest::new("test-model", FunctionSchema::new("tag", schema))
            .with_message(ChatMessage::user("tag this"))
    }

    #[tokio::test]
    async fn first_valid_reply_wins() {
        let client = StructuredCompletionClient::new(Replay::new(vec![Ok(
            CompletionReply::with_arguments(r#"{"tags":["a"]}"#),
        )]));
        let value = client.complete(&request()).await.unwrap();
        assert_eq!(value, json!({"tags": ["a"]}));
        assert_eq!(client.transport().seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_request_is_never_sent() {
        let client = StructuredCompletionClient::new(Replay::new(vec![]));
        let mut req = request();
        req.messages.clear();
        let err = client.complete(&req).await.unwrap_err();
        assert!(matches!(err, CompletionError::InvalidRequest(_)));
        assert!(client.transport().seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn repair_prompt_appends_reason() {
        let client = StructuredCompletionClient::new(Replay::new(vec![
            Ok(CompletionReply::with_arguments("not json")),
            Ok(CompletionReply::with_arguments(r#"{"tags":[]}"#)),
        ]))
        .with_policy(RetryPolicy::default().with_repair_prompt(true));

        client.complete(&request()).await.unwrap();

        let seen = client.transport().seen.lock().unwrap();
        assert_eq!(seen[0].messages.len(), 1);
        assert_eq!(seen[1].messages.len(), 2);
        assert!(seen[1].messages[1].content.contains("not JSON"));
    }

    #[tokio::test]
    async fn client_errors_fail_fast_when_configured() {
        let client = StructuredCompletionClient::new(Replay::new(vec![Err(
            TransportError::Status {
                status: 401,
                body: "bad key".into(),
            },
        )]))
        .with_policy(RetryPolicy::default().fail_fast_on_client_errors());

        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Rejected(_)));
        assert_eq!(client.transport().seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn zero_attempt_budget_is_an_error() {
        let client = StructuredCompletionClient::new(Replay::new(vec![]))
            .with_policy(RetryPolicy::default().with_max_attempts(0));
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, CompletionError::InvalidRequest(_)));
    }
}
