//! Language-model judge over an OpenAI-compatible chat completions API.
//!
//! Works against OpenAI, Azure OpenAI, Ollama, vLLM and any endpoint that
//! follows the chat completions format. The model is asked to answer with a
//! small JSON object; anything else becomes a neutral verdict.

use super::{Judge, JudgeVerdict, evidence_digest, parse_verdict_text};
use crate::config::LmJudgeConfig;
use crate::error::JudgeError;
use crate::types::{Evidence, JudgeRole};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are a careful fact-checking assistant. Judge whether the \
evidence supports the claim. Respond with only a JSON object of the form \
{\"score\": <number between 0 and 1, 1 meaning fully supported>, \
\"label\": \"supports\" | \"refutes\" | \"neutral\", \
\"rationale\": \"<one or two sentences>\"}.";

/// A chat-completions model acting as a claim judge.
pub struct LmJudge {
    client: Client,
    name: String,
    role: JudgeRole,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
}

impl LmJudge {
    /// Create a judge from configuration, reading the API key from `config.api_key_env`.
    ///
    /// Local endpoints (localhost / 127.0.0.1) do not need a key.
    pub fn new(config: &LmJudgeConfig, role: JudgeRole) -> Result<Self, JudgeError> {
        let is_local = config
            .base_url
            .as_ref()
            .map(|u| u.contains("localhost") || u.contains("127.0.0.1"))
            .unwrap_or(false);

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .or_else(|| {
                if is_local {
                    debug!("No API key set for local judge; using dummy bearer token");
                    Some("local".to_string())
                } else {
                    None
                }
            })
            .ok_or_else(|| JudgeError::AuthFailed {
                judge: format!("{}: env var '{}' not set", config.model, config.api_key_env),
            })?;
        Ok(Self::new_with_key(config, role, api_key))
    }

    /// Create a judge with an explicitly provided API key.
    pub fn new_with_key(config: &LmJudgeConfig, role: JudgeRole, api_key: String) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        Self {
            client: Client::new(),
            name: config.model.clone(),
            role,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn build_body(&self, claim: &str, evidence: &[Evidence]) -> Value {
        let user = format!(
            "Claim: {}\n\nEvidence:\n{}",
            claim.trim(),
            evidence_digest(evidence)
        );
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user },
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": false,
        })
    }

    /// Pull the assistant text out of an OpenAI-format response body.
    fn parse_response(body: &Value) -> Result<String, JudgeError> {
        let choice = body
            .get("choices")
            .and_then(|c| c.get(0))
            .ok_or_else(|| JudgeError::Parse {
                message: "No choices in response".to_string(),
            })?;
        choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| JudgeError::Parse {
                message: "No message content in choice".to_string(),
            })
    }

    fn map_http_error(&self, status: reqwest::StatusCode, body: &str) -> JudgeError {
        match status.as_u16() {
            401 | 403 => JudgeError::AuthFailed {
                judge: self.name.clone(),
            },
            _ => JudgeError::Request {
                message: format!("HTTP {}: {}", status, body.chars().take(200).collect::<String>()),
            },
        }
    }
}

#[async_trait]
impl Judge for LmJudge {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> JudgeRole {
        self.role
    }

    async fn judge(&self, claim: &str, evidence: &[Evidence]) -> Result<JudgeVerdict, JudgeError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(claim, evidence);

        debug!(url = %url, model = %self.model, role = %self.role, "Sending judge request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| JudgeError::Request {
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        let response_body = response.text().await.map_err(|e| JudgeError::Request {
            message: format!("Failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(self.map_http_error(status, &response_body));
        }

        // A response that is not the expected envelope is a parse failure, which
        // the ensemble treats as a neutral opinion rather than a missing judge.
        let content = serde_json::from_str::<Value>(&response_body)
            .map_err(|e| JudgeError::Parse {
                message: format!("Invalid JSON: {}", e),
            })
            .and_then(|json| Self::parse_response(&json));
        match content {
            Ok(text) => Ok(parse_verdict_text(&text)),
            Err(e) => {
                debug!(judge = %self.name, error = %e, "Unreadable judge response");
                Ok(JudgeVerdict::neutral(format!("Unreadable response from {}", self.name)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JudgeLabel, ReliabilityLevel, Source, SourceDescriptor, SourceType};
    use chrono::Utc;
    use std::sync::Arc;

    fn judge() -> LmJudge {
        LmJudge::new_with_key(&LmJudgeConfig::default(), JudgeRole::PrimaryLm, "test-key".into())
    }

    #[test]
    fn test_parse_response_extracts_content() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "{\"score\": 0.85, \"label\": \"supports\", \"rationale\": \"Confirmed.\"}"
                }
            }]
        });
        let text = LmJudge::parse_response(&body).unwrap();
        let verdict = parse_verdict_text(&text);
        assert_eq!(verdict.score, 0.85);
        assert_eq!(verdict.label, JudgeLabel::Supports);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let err = LmJudge::parse_response(&json!({"error": "overloaded"})).unwrap_err();
        assert!(matches!(err, JudgeError::Parse { .. }));
    }

    #[test]
    fn test_body_includes_claim_and_evidence() {
        let source = Arc::new(Source::from_descriptor(
            &SourceDescriptor::new("bbc", "BBC News", SourceType::News, ReliabilityLevel::Verified),
            Utc::now(),
        ));
        let evidence = vec![Evidence::new("The bridge opened in 1937.", source)];
        let body = judge().build_body("The bridge opened in 1937", &evidence);
        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("Claim: The bridge opened in 1937"));
        assert!(user.contains("[1] BBC News (news): The bridge opened in 1937."));
        assert_eq!(body["model"], "gpt-4o-mini");
    }

    #[test]
    fn test_missing_key_is_auth_error() {
        let config = LmJudgeConfig {
            api_key_env: "VERITY_TEST_UNSET_JUDGE_KEY".into(),
            ..Default::default()
        };
        assert!(matches!(
            LmJudge::new(&config, JudgeRole::SecondaryLm),
            Err(JudgeError::AuthFailed { .. })
        ));
    }

    #[test]
    fn test_local_endpoint_needs_no_key() {
        let config = LmJudgeConfig {
            base_url: Some("http://localhost:11434/v1/".into()),
            api_key_env: "VERITY_TEST_UNSET_JUDGE_KEY".into(),
            ..Default::default()
        };
        let judge = LmJudge::new(&config, JudgeRole::SecondaryLm).unwrap();
        assert_eq!(judge.base_url, "http://localhost:11434/v1");
    }
}
