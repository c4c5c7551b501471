//! AI judges and the weighted judge ensemble.
//!
//! A judge reads a claim plus the aggregated evidence and returns a score in
//! `[0.0, 1.0]` (1.0 = supported) with a coarse label and a rationale. The
//! ensemble queries every judge concurrently, each under its own timeout, and
//! combines the survivors with role weights renormalized over whoever answered.

pub mod entailment;
pub mod openai_compat;

pub use entailment::EntailmentJudge;
pub use openai_compat::LmJudge;

use crate::config::EnsembleConfig;
use crate::error::JudgeError;
use crate::types::{Evidence, JudgeLabel, JudgeRole, JudgeScore};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Evidence items included in a judge prompt.
pub(crate) const MAX_PROMPT_EVIDENCE: usize = 5;
/// Characters of each evidence item included in a judge prompt.
pub(crate) const MAX_EVIDENCE_CHARS: usize = 600;

/// One judge's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeVerdict {
    pub score: f64,
    pub label: JudgeLabel,
    pub rationale: String,
}

impl JudgeVerdict {
    pub fn new(score: f64, label: JudgeLabel, rationale: impl Into<String>) -> Self {
        let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.5 };
        Self {
            score,
            label,
            rationale: rationale.into(),
        }
    }

    /// The fallback verdict for a response that could not be interpreted.
    pub fn neutral(rationale: impl Into<String>) -> Self {
        Self::new(0.5, JudgeLabel::Neutral, rationale)
    }
}

/// Something that can score a claim against evidence.
#[async_trait]
pub trait Judge: Send + Sync {
    /// Judge name used in logs and result metadata.
    fn name(&self) -> &str;

    /// Which ensemble slot this judge fills.
    fn role(&self) -> JudgeRole;

    async fn judge(&self, claim: &str, evidence: &[Evidence]) -> Result<JudgeVerdict, JudgeError>;
}

/// Parse a judge's free-text answer into a verdict.
///
/// Expects a JSON object `{"score": .., "label": .., "rationale": ..}`,
/// possibly wrapped in prose or a code fence. Anything unreadable yields the
/// neutral verdict.
pub fn parse_verdict_text(text: &str) -> JudgeVerdict {
    let Some(value) = extract_json_object(text) else {
        warn!("Judge answer contained no JSON object; using neutral verdict");
        return JudgeVerdict::neutral(text.trim());
    };

    let score = value.get("score").and_then(|s| match s {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    });
    let Some(score) = score else {
        warn!("Judge answer had no numeric score; using neutral verdict");
        return JudgeVerdict::neutral(text.trim());
    };

    let label = value
        .get("label")
        .and_then(|l| l.as_str())
        .map(parse_label)
        .unwrap_or_else(|| label_for_score(score));
    let rationale = value
        .get("rationale")
        .or_else(|| value.get("explanation"))
        .and_then(|r| r.as_str())
        .unwrap_or_default();

    JudgeVerdict::new(score, label, rationale)
}

fn extract_json_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<Value>(&text[start..=end])
        .ok()
        .filter(|v| v.is_object())
}

/// Map a free-form stance label onto a `JudgeLabel`.
pub fn parse_label(label: &str) -> JudgeLabel {
    match label.trim().to_lowercase().as_str() {
        "supports" | "support" | "supported" | "true" | "entailment" | "verified" => {
            JudgeLabel::Supports
        }
        "refutes" | "refute" | "refuted" | "false" | "contradiction" => JudgeLabel::Refutes,
        _ => JudgeLabel::Neutral,
    }
}

fn label_for_score(score: f64) -> JudgeLabel {
    if score > 0.6 {
        JudgeLabel::Supports
    } else if score < 0.4 {
        JudgeLabel::Refutes
    } else {
        JudgeLabel::Neutral
    }
}

/// Render the evidence block shared by the prompt-based judges.
pub(crate) fn evidence_digest(evidence: &[Evidence]) -> String {
    if evidence.is_empty() {
        return "(no evidence retrieved)".to_string();
    }
    evidence
        .iter()
        .take(MAX_PROMPT_EVIDENCE)
        .enumerate()
        .map(|(i, e)| {
            let content: String = e.content.chars().take(MAX_EVIDENCE_CHARS).collect();
            format!("[{}] {} ({}): {}", i + 1, e.source.name, e.source.source_type, content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A judge that answered, with its renormalized weight.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeOpinion {
    pub judge: String,
    pub role: JudgeRole,
    pub weight: f64,
    pub verdict: JudgeVerdict,
}

/// Combined result of one ensemble run.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleOutcome {
    pub weighted_score: f64,
    /// Surviving judges in registration order.
    pub opinions: Vec<JudgeOpinion>,
}

impl EnsembleOutcome {
    /// The opinion with the highest individual score; first wins ties.
    pub fn best(&self) -> Option<&JudgeOpinion> {
        self.opinions.iter().fold(None, |best: Option<&JudgeOpinion>, o| match best {
            Some(b) if b.verdict.score >= o.verdict.score => Some(b),
            _ => Some(o),
        })
    }

    pub fn judge_scores(&self) -> Vec<JudgeScore> {
        self.opinions
            .iter()
            .map(|o| JudgeScore {
                judge: o.judge.clone(),
                role: o.role,
                score: o.verdict.score,
                weight: o.weight,
            })
            .collect()
    }
}

/// Runs a set of judges concurrently and combines their scores.
pub struct JudgeEnsemble {
    judges: Vec<Arc<dyn Judge>>,
    config: EnsembleConfig,
}

impl JudgeEnsemble {
    pub fn new(config: EnsembleConfig) -> Self {
        Self {
            judges: Vec::new(),
            config,
        }
    }

    pub fn with_judge(mut self, judge: Arc<dyn Judge>) -> Self {
        self.judges.push(judge);
        self
    }

    pub fn push(&mut self, judge: Arc<dyn Judge>) {
        self.judges.push(judge);
    }

    pub fn len(&self) -> usize {
        self.judges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.judges.is_empty()
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Configured weight of a judge role before renormalization.
    pub fn weight_for(&self, role: JudgeRole) -> f64 {
        match role {
            JudgeRole::PrimaryLm => self.config.primary_weight,
            JudgeRole::Entailment => self.config.entailment_weight,
            JudgeRole::SecondaryLm => self.config.secondary_weight,
        }
    }

    /// Query every judge and combine the survivors.
    ///
    /// Returns `None` when no judge produced a score (or all survivors carry
    /// zero weight).
    pub async fn run(&self, claim: &str, evidence: &[Evidence]) -> Option<EnsembleOutcome> {
        if self.judges.is_empty() {
            return None;
        }
        let timeout = Duration::from_millis(self.config.judge_timeout_ms);

        let calls: Vec<_> = self
            .judges
            .iter()
            .map(|judge| {
                let judge = Arc::clone(judge);
                async move {
                    let outcome = tokio::time::timeout(timeout, judge.judge(claim, evidence)).await;
                    let result = match outcome {
                        Ok(result) => result,
                        Err(_) => Err(JudgeError::Timeout {
                            judge: judge.name().to_string(),
                            timeout_ms: timeout.as_millis() as u64,
                        }),
                    };
                    match result {
                        Ok(verdict) => Some((judge.name().to_string(), judge.role(), verdict)),
                        Err(e) => {
                            warn!(judge = judge.name(), error = %e, "Judge failed; excluded from ensemble");
                            None
                        }
                    }
                }
            })
            .collect();

        let survivors: Vec<_> = futures::future::join_all(calls)
            .await
            .into_iter()
            .flatten()
            .collect();

        let total_weight: f64 = survivors.iter().map(|(_, role, _)| self.weight_for(*role)).sum();
        if survivors.is_empty() || total_weight <= 0.0 {
            return None;
        }

        let opinions: Vec<JudgeOpinion> = survivors
            .into_iter()
            .map(|(judge, role, verdict)| JudgeOpinion {
                judge,
                role,
                weight: self.weight_for(role) / total_weight,
                verdict,
            })
            .collect();
        let weighted_score = opinions
            .iter()
            .map(|o| o.weight * o.verdict.score)
            .sum::<f64>()
            .clamp(0.0, 1.0);

        debug!(
            judges = opinions.len(),
            weighted_score, "Judge ensemble combined"
        );

        Some(EnsembleOutcome {
            weighted_score,
            opinions,
        })
    }
}

/// Judge returning a fixed verdict; optionally slow or failing.
pub struct StaticJudge {
    name: String,
    role: JudgeRole,
    verdict: JudgeVerdict,
    delay: Option<Duration>,
    fail: bool,
}

impl StaticJudge {
    pub fn new(name: impl Into<String>, role: JudgeRole, verdict: JudgeVerdict) -> Self {
        Self {
            name: name.into(),
            role,
            verdict,
            delay: None,
            fail: false,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Always answer with a request error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl Judge for StaticJudge {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> JudgeRole {
        self.role
    }

    async fn judge(&self, _claim: &str, _evidence: &[Evidence]) -> Result<JudgeVerdict, JudgeError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(JudgeError::Request {
                message: format!("{} is unavailable", self.name),
            });
        }
        Ok(self.verdict.clone())
    }
}
