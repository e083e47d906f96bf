//! Request preconditions and reply validation

use crate::error::CompletionError;
use crate::request::CompletionRequest;
use jsonschema::JSONSchema;
use serde_json::Value;

/// Check a request before it is ever sent
///
/// # Errors
/// `CompletionError::InvalidRequest` describing the first violation.
pub fn check_request(request: &CompletionRequest) -> Result<(), CompletionError> {
    if request.messages.is_empty() {
        return Err(CompletionError::InvalidRequest(
            "messages must not be empty".to_string(),
        ));
    }
    if request.max_output_tokens == 0 {
        return Err(CompletionError::InvalidRequest(
            "max_output_tokens must be positive".to_string(),
        ));
    }
    if request.directive != request.function.name {
        return Err(CompletionError::InvalidRequest(format!(
            "directive '{}' does not name function '{}'",
            request.directive, request.function.name
        )));
    }
    if string_array_properties(&request.function.parameters).is_empty() {
        return Err(CompletionError::InvalidRequest(
            "schema must declare at least one array-of-string property".to_string(),
        ));
    }
    Ok(())
}

/// Names of top-level properties typed as arrays of strings
#[must_use]
pub fn string_array_properties(schema: &Value) -> Vec<&str> {
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Vec::new();
    }
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };
    properties
        .iter()
        .filter(|(_, prop)| {
            prop.get("type").and_then(Value::as_str) == Some("array")
                && prop
                    .get("items")
                    .and_then(|items| items.get("type"))
                    .and_then(Value::as_str)
                    == Some("string")
        })
        .map(|(name, _)| name.as_str())
        .collect()
}

/// Compiled response schema
pub struct ReplyValidator {
    schema: JSONSchema,
}

impl std::fmt::Debug for ReplyValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyValidator").finish_non_exhaustive()
    }
}

impl ReplyValidator {
    /// Compile a function's parameter schema
    ///
    /// # Errors
    /// `CompletionError::InvalidRequest` if the schema itself is invalid.
    pub fn compile(parameters: &Value) -> Result<Self, CompletionError> {
        let schema = JSONSchema::compile(parameters).map_err(|e| {
            CompletionError::InvalidRequest(format!("response schema does not compile: {e}"))
        })?;
        Ok(Self { schema })
    }

    /// Parse raw arguments and check them against the schema
    ///
    /// # Errors
    /// A description of the parse error or of every schema violation.
    pub fn parse(&self, arguments: Option<&str>) -> Result<Value, String> {
        let Some(raw) = arguments else {
            return Err("reply carried no function call".to_string());
        };
        let value: Value =
            serde_json::from_str(raw).map_err(|e| format!("arguments are not JSON: {e}"))?;

        if let Err(errors) = self.schema.validate(&value) {
            let issues: Vec<String> = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{path}: {e}")
                    }
                })
                .collect();
            return Err(format!("schema violation: {}", issues.join("; ")));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ChatMessage, FunctionSchema};
    use serde_json::json;

    fn keyword_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "gettyKeywords": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["gettyKeywords"]
        })
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new("m", FunctionSchema::new("Generate_keywords", keyword_schema()))
            .with_message(ChatMessage::user("hi"))
    }

    #[test]
    fn valid_request_passes() {
        assert!(check_request(&request()).is_ok());
    }

    #[test]
    fn empty_messages_rejected() {
        let mut req = request();
        req.messages.clear();
        assert!(matches!(
            check_request(&req),
            Err(CompletionError::InvalidRequest(_))
        ));
    }

    #[test]
    fn zero_tokens_rejected() {
        let req = request().with_max_output_tokens(0);
        assert!(check_request(&req).is_err());
    }

    #[test]
    fn directive_must_name_function() {
        let mut req = request();
        req.directive = "Other".to_string();
        assert!(check_request(&req).is_err());
    }

    #[test]
    fn schema_needs_string_array() {
        let mut req = request();
        req.function.parameters = json!({
            "type": "object",
            "properties": {"count": {"type": "integer"}}
        });
        assert!(check_request(&req).is_err());
        assert_eq!(string_array_properties(&keyword_schema()), vec!["gettyKeywords"]);
    }

    #[test]
    fn parse_accepts_conformant_arguments() {
        let validator = ReplyValidator::compile(&keyword_schema()).unwrap();
        let value = validator
            .parse(Some(r#"{"gettyKeywords": ["cat", "pet"]}"#))
            .unwrap();
        assert_eq!(value["gettyKeywords"][1], "pet");
    }

    #[test]
    fn parse_rejects_bad_json_and_schema() {
        let validator = ReplyValidator::compile(&keyword_schema()).unwrap();
        assert!(validator.parse(None).is_err());
        assert!(validator
            .parse(Some("{gettyKeywords: cat}"))
            .unwrap_err()
            .starts_with("arguments are not JSON"));
        assert!(validator
            .parse(Some(r#"{"gettyKeywords": "cat"}"#))
            .unwrap_err()
            .starts_with("schema violation"));
        assert!(validator.parse(Some("{}")).is_err());
    }
}
