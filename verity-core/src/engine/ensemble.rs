//! AI-ensemble tier.

use super::{TierVerdict, VerificationContext, VerificationStrategy};
use crate::error::VerityError;
use crate::judges::{EnsembleOutcome, JudgeEnsemble};
use crate::registry::SourceRegistry;
use crate::types::{
    Evidence, EvidenceKind, ReliabilityLevel, SourceDescriptor, SourceFlags, SourceType, Tier,
    Verdict,
};
use async_trait::async_trait;

/// Asks the configured judges; defers when none is configured or none answers.
pub struct AiEnsembleStrategy {
    ensemble: JudgeEnsemble,
}

impl AiEnsembleStrategy {
    pub fn new(ensemble: JudgeEnsemble) -> Self {
        Self { ensemble }
    }

    fn status_for(&self, score: f64) -> Verdict {
        let config = self.ensemble.config();
        if score > config.verified_cutoff {
            Verdict::Verified
        } else if score < config.false_cutoff {
            Verdict::False
        } else {
            Verdict::Disputed
        }
    }

    /// Supplementary evidence carrying every rationale except the best one.
    fn rationale_evidence(outcome: &EnsembleOutcome, best: &str, registry: &SourceRegistry) -> Vec<Evidence> {
        outcome
            .opinions
            .iter()
            .filter(|o| o.judge != best && !o.verdict.rationale.trim().is_empty())
            .map(|o| {
                let source = registry.register_or_get(
                    &SourceDescriptor::new(
                        format!("judge:{}", o.judge),
                        o.judge.clone(),
                        SourceType::Other,
                        ReliabilityLevel::Moderate,
                    )
                    .with_flags(SourceFlags {
                        is_ai: true,
                        ..Default::default()
                    }),
                );
                Evidence::new(o.verdict.rationale.clone(), source)
                    .with_confidence(o.verdict.score)
                    .with_kind(EvidenceKind::AiJudge {
                        judge: o.judge.clone(),
                        role: o.role,
                        score: o.verdict.score,
                        label: o.verdict.label,
                    })
            })
            .collect()
    }
}

#[async_trait]
impl VerificationStrategy for AiEnsembleStrategy {
    fn tier(&self) -> Tier {
        Tier::AiEnsemble
    }

    async fn try_verify(
        &self,
        ctx: &VerificationContext<'_>,
    ) -> Result<Option<TierVerdict>, VerityError> {
        if self.ensemble.is_empty() {
            return Ok(None);
        }
        let Some(outcome) = self.ensemble.run(ctx.claim, ctx.evidence()).await else {
            return Ok(None);
        };
        let Some(best) = outcome.best() else {
            return Ok(None);
        };

        let score = outcome.weighted_score;
        let mut verdict = TierVerdict::new(Tier::AiEnsemble, self.status_for(score), score);
        if !best.verdict.rationale.trim().is_empty() {
            verdict = verdict.with_rationale(best.verdict.rationale.clone());
        }
        verdict.judge_scores = outcome.judge_scores();
        verdict.extra_evidence = Self::rationale_evidence(&outcome, &best.judge, ctx.registry);
        Ok(Some(verdict))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::AggregatedEvidence;
    use crate::config::EnsembleConfig;
    use crate::judges::{JudgeVerdict, StaticJudge};
    use crate::types::{ClaimProfile, JudgeLabel, JudgeRole};
    use std::sync::Arc;

    async fn decide(ensemble: JudgeEnsemble, registry: &SourceRegistry) -> Option<TierVerdict> {
        let aggregated = AggregatedEvidence::default();
        let profile = ClaimProfile::default();
        let ctx = VerificationContext::new("claim", &profile, &aggregated, registry);
        AiEnsembleStrategy::new(ensemble).try_verify(&ctx).await.unwrap()
    }

    fn judge(name: &str, role: JudgeRole, score: f64, rationale: &str) -> Arc<StaticJudge> {
        Arc::new(StaticJudge::new(
            name,
            role,
            JudgeVerdict::new(score, JudgeLabel::Neutral, rationale),
        ))
    }

    #[tokio::test]
    async fn test_verified_with_best_rationale() {
        let registry = SourceRegistry::new();
        let ensemble = JudgeEnsemble::new(EnsembleConfig::default())
            .with_judge(judge("gpt", JudgeRole::PrimaryLm, 0.9, "Primary agrees."))
            .with_judge(judge("nli", JudgeRole::Entailment, 0.6, "Entailed."))
            .with_judge(judge("claude", JudgeRole::SecondaryLm, 0.95, "Strongly supported."));
        let verdict = decide(ensemble, &registry).await.unwrap();
        // 0.45 + 0.12 + 0.285 = 0.855
        assert_eq!(verdict.status, Verdict::Verified);
        assert!((verdict.confidence - 0.855).abs() < 1e-9);
        assert_eq!(verdict.rationale.as_deref(), Some("Strongly supported."));
        assert_eq!(verdict.extra_evidence.len(), 2);
        assert!(registry.get("judge:gpt").is_some());
        assert!(registry.get("judge:claude").is_none());
    }

    #[tokio::test]
    async fn test_low_score_is_false_and_middle_is_disputed() {
        let registry = SourceRegistry::new();
        let low = JudgeEnsemble::new(EnsembleConfig::default())
            .with_judge(judge("gpt", JudgeRole::PrimaryLm, 0.1, "No."));
        assert_eq!(decide(low, &registry).await.unwrap().status, Verdict::False);

        let middle = JudgeEnsemble::new(EnsembleConfig::default())
            .with_judge(judge("gpt", JudgeRole::PrimaryLm, 0.7, "Probably."));
        // Exactly at the cutoff is not above it.
        assert_eq!(decide(middle, &registry).await.unwrap().status, Verdict::Disputed);
    }

    #[tokio::test]
    async fn test_defers_without_judges() {
        let registry = SourceRegistry::new();
        assert!(decide(JudgeEnsemble::new(EnsembleConfig::default()), &registry).await.is_none());
    }
}
