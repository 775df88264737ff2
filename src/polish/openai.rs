//! OpenAI Responses API rewriter.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use super::{RewriteRequest, Rewriter};
use crate::config::PolishConfig;
use crate::error::{AtlasError, Result};

const USER_PREAMBLE: &str = "Polish this narrative. Return ONLY JSON.";

/// Upstream error bodies are truncated to this many characters
const MAX_ERROR_BODY_CHARS: usize = 500;

pub struct OpenAiRewriter {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout_ms: u64,
}

impl OpenAiRewriter {
    pub fn new(api_key: String, model: String, base_url: String, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| AtlasError::Internal {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url,
            timeout_ms,
        })
    }

    pub fn from_config(cfg: &PolishConfig) -> Result<Self> {
        let api_key = cfg.api_key.clone().ok_or_else(|| AtlasError::Config {
            message: "OPENAI_API_KEY is not set".to_string(),
        })?;
        Self::new(
            api_key,
            cfg.model.clone(),
            cfg.base_url.clone(),
            cfg.timeout_ms,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.base_url.trim_end_matches('/'))
    }

    fn transport_error(&self, err: reqwest::Error) -> AtlasError {
        if err.is_timeout() {
            AtlasError::Timeout {
                operation: "narrative rewrite".to_string(),
                timeout_ms: self.timeout_ms,
            }
        } else {
            err.into()
        }
    }
}

/// Text of a Responses API reply: `output_text` if present, otherwise all
/// `output_text` parts of the `output` messages joined together.
pub fn response_text(val: &Value) -> Option<String> {
    if let Some(text) = val.get("output_text").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    let parts: Vec<&str> = val
        .get("output")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.concat())
    }
}

#[async_trait]
impl Rewriter for OpenAiRewriter {
    async fn rewrite(&self, instructions: &str, request: &RewriteRequest) -> Result<String> {
        let payload = serde_json::to_string(request)?;
        let body = json!({
            "model": self.model,
            "instructions": instructions,
            "input": [
                {"role": "user", "content": USER_PREAMBLE},
                {"role": "user", "content": payload},
            ],
            "text": {"verbosity": "low"},
        });

        debug!(model = %self.model, "Sending narrative rewrite request");

        // Single round-trip: no retry or backoff here
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(AtlasError::Upstream {
                status: status.as_u16(),
                body: body_text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let val: Value = resp.json().await.map_err(|e| self.transport_error(e))?;
        response_text(&val).ok_or_else(|| AtlasError::MalformedResponse {
            message: "response carried no output text".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_text_shortcut() {
        let v = json!({"output_text": "{\"hypotheses\": []}"});
        assert_eq!(response_text(&v).as_deref(), Some("{\"hypotheses\": []}"));
    }

    #[test]
    fn test_output_message_parts() {
        let v = json!({
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "{\"sugg"},
                    {"type": "refusal", "refusal": "no"},
                    {"type": "output_text", "text": "estions\": [\"x\"]}"}
                ]}
            ]
        });
        assert_eq!(
            response_text(&v).as_deref(),
            Some("{\"suggestions\": [\"x\"]}")
        );
    }

    #[test]
    fn test_no_text() {
        assert_eq!(response_text(&json!({"output": []})), None);
        assert_eq!(response_text(&json!({"id": "resp_1"})), None);
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let r = OpenAiRewriter::new("k".into(), "m".into(), "http://localhost:9/v1/".into(), 100)
            .unwrap();
        assert_eq!(r.endpoint(), "http://localhost:9/v1/responses");
    }

    #[test]
    fn test_from_config_requires_key() {
        let cfg = PolishConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(matches!(
            OpenAiRewriter::from_config(&cfg),
            Err(AtlasError::Config { .. })
        ));
    }
}
