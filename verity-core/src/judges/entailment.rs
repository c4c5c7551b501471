//! Entailment judge backed by a hosted NLI classifier.
//!
//! Sends the evidence as premise and the claim as hypothesis to a
//! text-classification endpoint (Hugging Face inference format) and turns the
//! entailment / contradiction probabilities into a support score:
//! `0.5 + 0.5 * (p_entailment - p_contradiction)`.

use super::{Judge, JudgeVerdict, MAX_EVIDENCE_CHARS, MAX_PROMPT_EVIDENCE};
use crate::config::EntailmentJudgeConfig;
use crate::error::JudgeError;
use crate::types::{Evidence, JudgeLabel, JudgeRole};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

/// Class probabilities reported by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NliScores {
    pub entailment: f64,
    pub neutral: f64,
    pub contradiction: f64,
}

impl NliScores {
    /// Support score in `[0.0, 1.0]`.
    pub fn support(&self) -> f64 {
        (0.5 + 0.5 * (self.entailment - self.contradiction)).clamp(0.0, 1.0)
    }

    /// Label of the most probable class.
    pub fn label(&self) -> JudgeLabel {
        if self.entailment >= self.contradiction && self.entailment >= self.neutral {
            JudgeLabel::Supports
        } else if self.contradiction >= self.neutral {
            JudgeLabel::Refutes
        } else {
            JudgeLabel::Neutral
        }
    }
}

/// Parse a classifier response: a list of `{label, score}` objects, possibly
/// nested one level deep.
pub fn parse_nli_response(body: &Value) -> Result<NliScores, JudgeError> {
    let outer = body.as_array().ok_or_else(|| JudgeError::Parse {
        message: "Expected a JSON array of label scores".to_string(),
    })?;
    let entries = match outer.first() {
        Some(Value::Array(inner)) => inner,
        _ => outer,
    };

    let mut scores = NliScores::default();
    let mut seen = false;
    for entry in entries {
        let (Some(label), Some(score)) = (
            entry.get("label").and_then(|l| l.as_str()),
            entry.get("score").and_then(|s| s.as_f64()),
        ) else {
            continue;
        };
        match label.to_lowercase().as_str() {
            "entailment" => scores.entailment = score,
            "neutral" => scores.neutral = score,
            "contradiction" => scores.contradiction = score,
            _ => continue,
        }
        seen = true;
    }

    if !seen {
        return Err(JudgeError::Parse {
            message: "No entailment/neutral/contradiction labels in response".to_string(),
        });
    }
    Ok(scores)
}

pub struct EntailmentJudge {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl EntailmentJudge {
    pub fn new(config: &EntailmentJudgeConfig) -> Self {
        let api_key = config
            .api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok());
        Self {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
            api_key,
        }
    }

    fn premise(evidence: &[Evidence]) -> String {
        evidence
            .iter()
            .take(MAX_PROMPT_EVIDENCE)
            .map(|e| e.content.chars().take(MAX_EVIDENCE_CHARS).collect::<String>())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl Judge for EntailmentJudge {
    fn name(&self) -> &str {
        "entailment"
    }

    fn role(&self) -> JudgeRole {
        JudgeRole::Entailment
    }

    async fn judge(&self, claim: &str, evidence: &[Evidence]) -> Result<JudgeVerdict, JudgeError> {
        if evidence.is_empty() {
            return Ok(JudgeVerdict::neutral("No evidence to compare against"));
        }
        let body = json!({
            "inputs": { "text": Self::premise(evidence), "text_pair": claim.trim() },
            "parameters": { "top_k": null },
        });

        debug!(endpoint = %self.endpoint, "Sending entailment request");

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }
        let response = request.send().await.map_err(|e| JudgeError::Request {
            message: format!("Request failed: {}", e),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| JudgeError::Request {
            message: format!("Failed to read response body: {}", e),
        })?;
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(JudgeError::AuthFailed {
                judge: "entailment".to_string(),
            });
        }
        if !status.is_success() {
            return Err(JudgeError::Request {
                message: format!("HTTP {}: {}", status, text.chars().take(200).collect::<String>()),
            });
        }

        let parsed = serde_json::from_str::<Value>(&text)
            .map_err(|e| JudgeError::Parse {
                message: format!("Invalid JSON: {}", e),
            })
            .and_then(|v| parse_nli_response(&v));
        Ok(match parsed {
            Ok(scores) => JudgeVerdict::new(
                scores.support(),
                scores.label(),
                format!(
                    "Entailment {:.2}, contradiction {:.2}, neutral {:.2}",
                    scores.entailment, scores.contradiction, scores.neutral
                ),
            ),
            Err(e) => {
                debug!(error = %e, "Unreadable entailment response");
                JudgeVerdict::neutral("Unreadable entailment response")
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_response() {
        let body = json!([[
            {"label": "ENTAILMENT", "score": 0.8},
            {"label": "NEUTRAL", "score": 0.15},
            {"label": "CONTRADICTION", "score": 0.05}
        ]]);
        let scores = parse_nli_response(&body).unwrap();
        assert!((scores.support() - 0.875).abs() < 1e-9);
        assert_eq!(scores.label(), JudgeLabel::Supports);
    }

    #[test]
    fn test_parse_flat_response() {
        let body = json!([
            {"label": "contradiction", "score": 0.9},
            {"label": "entailment", "score": 0.02}
        ]);
        let scores = parse_nli_response(&body).unwrap();
        assert!(scores.support() < 0.1);
        assert_eq!(scores.label(), JudgeLabel::Refutes);
    }

    #[test]
    fn test_parse_unknown_labels_fails() {
        let body = json!([{"label": "LABEL_0", "score": 0.9}]);
        assert!(parse_nli_response(&body).is_err());
        assert!(parse_nli_response(&json!({"error": "loading"})).is_err());
    }

    #[tokio::test]
    async fn test_no_evidence_is_neutral_without_request() {
        let judge = EntailmentJudge::new(&EntailmentJudgeConfig {
            endpoint: "http://127.0.0.1:9/unused".into(),
            api_key_env: None,
        });
        let verdict = judge.judge("claim", &[]).await.unwrap();
        assert_eq!(verdict.score, 0.5);
        assert_eq!(verdict.label, JudgeLabel::Neutral);
    }
}
