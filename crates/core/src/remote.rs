//! Remote Dialogue Components
//!
//! Components served by an external process are reached with a JSON `POST`
//! per call. Headers may reference environment variables as `${NAME}`, and
//! the interesting part of the response is picked out with a simple JSONPath.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{ConfigError, RemoteError};
use crate::types::DialogueAct;

// ============================================================================
// Endpoint Configuration
// ============================================================================

/// HTTP endpoint for one dialogue component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub url: String,

    /// HTTP headers (support `${ENV_VAR}` substitution)
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// JSONPath of the result in the response body (e.g. "$.acts")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_path: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl EndpointConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            response_path: None,
            timeout_secs: default_timeout(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ConfigError::Invalid("endpoint url must not be empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "endpoint url must start with http:// or https://: {}",
                url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(format!(
                "timeout_secs must be > 0 for {}",
                url
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Template Substitution
// ============================================================================

fn env_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| regex::Regex::new(r"\$\{(\w+)\}").expect("Invalid regex"))
}

/// Substitute ${ENV_VAR} placeholders from environment
fn substitute_env(template: &str) -> Result<String, RemoteError> {
    let mut result = template.to_string();

    for cap in env_pattern().captures_iter(template) {
        let full_match = &cap[0];
        let var_name = &cap[1];

        let value = env::var(var_name).map_err(|_| RemoteError::MissingEnv(var_name.to_string()))?;

        result = result.replace(full_match, &value);
    }

    Ok(result)
}

// ============================================================================
// Simple JSONPath Extraction
// ============================================================================

/// Extract a value from JSON using a simple JSONPath-like expression
/// Supports: $, $.field, $.field.subfield, $.array[0], $.array[0].field
pub fn extract_json_path<'a>(value: &'a Value, path: &str) -> Result<&'a Value, RemoteError> {
    let path = path.strip_prefix('$').unwrap_or(path);
    let path = path.strip_prefix('.').unwrap_or(path);

    if path.is_empty() {
        return Ok(value);
    }

    let missing = |reason: String| RemoteError::Path {
        path: path.to_string(),
        reason,
    };

    let mut current = value;

    for segment in path.split('.') {
        if let Some(bracket_pos) = segment.find('[') {
            let field = &segment[..bracket_pos];
            let index_str = segment[bracket_pos + 1..]
                .strip_suffix(']')
                .ok_or_else(|| missing(format!("invalid array index syntax: {}", segment)))?;
            let index: usize = index_str
                .parse()
                .map_err(|_| missing(format!("invalid array index: {}", index_str)))?;

            if !field.is_empty() {
                current = current
                    .get(field)
                    .ok_or_else(|| missing(format!("field not found: {}", field)))?;
            }

            current = current
                .get(index)
                .ok_or_else(|| missing(format!("array index out of bounds: {}", index)))?;
        } else {
            current = current
                .get(segment)
                .ok_or_else(|| missing(format!("field not found: {}", segment)))?;
        }
    }

    Ok(current)
}

/// Read the dialogue acts found at `path`; `null` counts as no acts
pub fn acts_at(response: &Value, path: &str) -> Result<Vec<DialogueAct>, RemoteError> {
    match extract_json_path(response, path)? {
        Value::Null => Ok(Vec::new()),
        acts => Ok(Vec::<DialogueAct>::deserialize(acts)?),
    }
}

// ============================================================================
// Remote Endpoint
// ============================================================================

/// A configured endpoint plus the blocking client used to call it
#[derive(Debug, Clone)]
pub struct RemoteEndpoint {
    client: Client,
    config: EndpointConfig,
    default_path: &'static str,
}

impl RemoteEndpoint {
    /// `default_path` applies when the config names no `response_path`
    pub fn new(config: EndpointConfig, default_path: &'static str) -> Result<Self, ConfigError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            default_path,
        })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn response_path(&self) -> &str {
        self.config
            .response_path
            .as_deref()
            .unwrap_or(self.default_path)
    }

    /// POST `body` and return the full JSON response
    pub fn call(&self, body: &Value) -> Result<Value, RemoteError> {
        let mut request = self.client.post(self.url()).json(body);

        for (key, value) in &self.config.headers {
            request = request.header(key.as_str(), substitute_env(value)?);
        }

        tracing::debug!(url = %self.url(), "calling remote component");
        let response = request.send()?;

        let status = response.status();
        let text = response.text()?;

        decode_response(status.as_u16(), &text)
    }
}

/// Turn a raw HTTP reply into JSON; non-2xx statuses are errors
pub fn decode_response(status: u16, body: &str) -> Result<Value, RemoteError> {
    if !(200..300).contains(&status) {
        return Err(RemoteError::Status {
            status,
            body: body.to_string(),
        });
    }

    Ok(serde_json::from_str(body)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_env() {
        env::set_var("DIALOGUE_TEST_VAR_12345", "test_value");
        let result = substitute_env("Bearer ${DIALOGUE_TEST_VAR_12345}").unwrap();
        assert_eq!(result, "Bearer test_value");
        env::remove_var("DIALOGUE_TEST_VAR_12345");
    }

    #[test]
    fn test_substitute_env_missing() {
        let result = substitute_env("Key: ${NONEXISTENT_VAR_99999}");
        match result {
            Err(RemoteError::MissingEnv(name)) => assert_eq!(name, "NONEXISTENT_VAR_99999"),
            other => panic!("Expected MissingEnv, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_json_path() {
        let json = serde_json::json!({
            "result": {
                "acts": [["inform", "hotel", "area", "north"]],
                "text": "It is in the north."
            }
        });

        assert_eq!(
            extract_json_path(&json, "$.result.text").unwrap(),
            "It is in the north."
        );
        assert_eq!(
            extract_json_path(&json, "$.result.acts[0]").unwrap()[1],
            "hotel"
        );
        assert_eq!(extract_json_path(&json, "$").unwrap(), &json);
    }

    #[test]
    fn test_extract_json_path_missing() {
        let json = serde_json::json!({ "acts": [] });
        assert!(matches!(
            extract_json_path(&json, "$.text"),
            Err(RemoteError::Path { .. })
        ));
        assert!(extract_json_path(&json, "$.acts[3]").is_err());
    }

    #[test]
    fn test_acts_at() {
        let json = serde_json::json!({
            "acts": [["request", "hotel", "area", "?"], ["greet", "general"]],
            "empty": null
        });

        let acts = acts_at(&json, "$.acts").unwrap();
        assert_eq!(acts.len(), 2);
        assert_eq!(acts[0].slot(), Some("area"));
        assert_eq!(acts[1].domain(), "general");

        assert!(acts_at(&json, "$.empty").unwrap().is_empty());
        assert!(matches!(acts_at(&json, "$"), Err(RemoteError::Json(_))));
    }

    #[test]
    fn test_decode_response() {
        let value = decode_response(200, r#"{"text": "Hi"}"#).unwrap();
        assert_eq!(value["text"], "Hi");

        match decode_response(503, "overloaded") {
            Err(RemoteError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("Expected Status, got {:?}", other),
        }

        assert!(matches!(decode_response(200, "<html>"), Err(RemoteError::Json(_))));
    }

    #[test]
    fn test_endpoint_validation() {
        assert!(EndpointConfig::new("http://localhost:8000/nlu").validate().is_ok());
        assert!(EndpointConfig::new("").validate().is_err());
        assert!(EndpointConfig::new("localhost:8000").validate().is_err());

        let mut config = EndpointConfig::new("https://example.com/nlg");
        config.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_response_path() {
        let endpoint =
            RemoteEndpoint::new(EndpointConfig::new("http://localhost:8000/nlg"), "$.text").unwrap();
        assert_eq!(endpoint.response_path(), "$.text");
        assert_eq!(endpoint.url(), "http://localhost:8000/nlg");

        let mut config = EndpointConfig::new("http://localhost:8000/nlg");
        config.response_path = Some("$.data.utterance".to_string());
        let endpoint = RemoteEndpoint::new(config, "$.text").unwrap();
        assert_eq!(endpoint.response_path(), "$.data.utterance");
    }
}
