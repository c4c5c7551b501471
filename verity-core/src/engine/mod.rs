//! The verification engine.
//!
//! An ordered chain of strategies, most authoritative first. Before the chain
//! runs, predictive claims and claims without enough evidence are answered
//! directly. The first strategy returning a verdict wins; an error or panic
//! anywhere in the chain becomes an Unverified result with the fault recorded
//! in the metadata.

pub mod biographical;
pub mod current_event;
pub mod ensemble;
pub mod fact_check;
pub mod generic;

pub use biographical::BiographicalStrategy;
pub use current_event::CurrentEventStrategy;
pub use ensemble::AiEnsembleStrategy;
pub use fact_check::FactCheckStrategy;
pub use generic::GenericStrategy;

use crate::aggregator::{AggregatedEvidence, contradiction_ratio};
use crate::classifier::key_terms;
use crate::config::{EngineConfig, VerityConfig};
use crate::error::VerityError;
use crate::explanation::ExplanationGenerator;
use crate::judges::JudgeEnsemble;
use crate::registry::SourceRegistry;
use crate::types::{
    ClaimProfile, Evidence, JudgeScore, ResultMetadata, Source, Tier, VerificationResult, Verdict,
};
use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Everything a strategy may look at while deciding.
pub struct VerificationContext<'a> {
    pub claim: &'a str,
    pub profile: &'a ClaimProfile,
    pub aggregated: &'a AggregatedEvidence,
    pub registry: &'a SourceRegistry,
    /// Key terms of the claim, computed once.
    pub key_terms: Vec<String>,
    pub contradiction_ratio: f64,
}

impl<'a> VerificationContext<'a> {
    pub fn new(
        claim: &'a str,
        profile: &'a ClaimProfile,
        aggregated: &'a AggregatedEvidence,
        registry: &'a SourceRegistry,
    ) -> Self {
        Self {
            claim,
            profile,
            aggregated,
            registry,
            key_terms: key_terms(claim),
            contradiction_ratio: contradiction_ratio(&aggregated.evidence),
        }
    }

    pub fn evidence(&self) -> &'a [Evidence] {
        &self.aggregated.evidence
    }
}

/// A decision produced by one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierVerdict {
    pub tier: Tier,
    pub status: Verdict,
    pub confidence: f64,
    pub evidence_scores: Vec<f64>,
    pub rating: Option<String>,
    pub decisive_evidence: Option<Uuid>,
    pub judge_scores: Vec<JudgeScore>,
    pub conflicting_sources: Vec<String>,
    pub rationale: Option<String>,
    /// Evidence produced by the tier itself (judge rationales), appended to the result.
    pub extra_evidence: Vec<Evidence>,
}

impl TierVerdict {
    pub fn new(tier: Tier, status: Verdict, confidence: f64) -> Self {
        Self {
            tier,
            status,
            confidence,
            evidence_scores: Vec::new(),
            rating: None,
            decisive_evidence: None,
            judge_scores: Vec::new(),
            conflicting_sources: Vec::new(),
            rationale: None,
            extra_evidence: Vec::new(),
        }
    }

    pub fn with_scores(mut self, scores: Vec<f64>) -> Self {
        self.evidence_scores = scores;
        self
    }

    pub fn with_rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    pub fn with_decisive(mut self, evidence: &Evidence) -> Self {
        self.decisive_evidence = Some(evidence.id);
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }
}

/// One tier of the chain.
#[async_trait]
pub trait VerificationStrategy: Send + Sync {
    fn tier(&self) -> Tier;

    /// Return a verdict, or `None` to defer to the next tier.
    async fn try_verify(
        &self,
        ctx: &VerificationContext<'_>,
    ) -> Result<Option<TierVerdict>, VerityError>;
}

/// Whether every term occurs in `text_lower` (which must already be lowercase).
/// An empty term list never counts as covered.
pub(crate) fn covers_all(terms: &[String], text_lower: &str) -> bool {
    !terms.is_empty() && terms.iter().all(|t| text_lower.contains(t.as_str()))
}

/// Fraction of terms occurring in `text_lower`; 0 for an empty term list.
pub(crate) fn term_match(terms: &[String], text_lower: &str) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let found = terms.iter().filter(|t| text_lower.contains(t.as_str())).count();
    found as f64 / terms.len() as f64
}

/// Runs the strategy chain and assembles the final result.
pub struct VerificationEngine {
    registry: Arc<SourceRegistry>,
    config: EngineConfig,
    strategies: Vec<Box<dyn VerificationStrategy>>,
    explainer: ExplanationGenerator,
}

impl VerificationEngine {
    /// Build the standard chain: fact-check, current event, AI ensemble,
    /// biographical, generic.
    pub fn new(registry: Arc<SourceRegistry>, config: &VerityConfig, judges: JudgeEnsemble) -> Self {
        let strategies: Vec<Box<dyn VerificationStrategy>> = vec![
            Box::new(FactCheckStrategy::new(config.engine.clone())),
            Box::new(CurrentEventStrategy::new(
                config.engine.clone(),
                &config.office_policy,
            )),
            Box::new(AiEnsembleStrategy::new(judges)),
            Box::new(BiographicalStrategy::new(
                config.engine.clone(),
                config.aggregator.clone(),
            )),
            Box::new(GenericStrategy::new(config.engine.clone())),
        ];
        Self::with_strategies(registry, config.engine.clone(), strategies)
    }

    /// Build an engine around a custom chain.
    pub fn with_strategies(
        registry: Arc<SourceRegistry>,
        config: EngineConfig,
        strategies: Vec<Box<dyn VerificationStrategy>>,
    ) -> Self {
        let explainer = ExplanationGenerator::new(&config);
        Self {
            registry,
            config,
            strategies,
            explainer,
        }
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    /// Decide a verdict for a classified claim and its aggregated evidence.
    ///
    /// Never fails: internal faults are reported through the result.
    pub async fn verify(
        &self,
        claim: &str,
        profile: &ClaimProfile,
        aggregated: AggregatedEvidence,
    ) -> VerificationResult {
        let verdict = if profile.is_predictive {
            debug!("Predictive claim; skipping evidence evaluation");
            TierVerdict::new(Tier::PredictiveCheck, Verdict::Unverified, 0.0)
        } else if aggregated.len() < self.config.min_evidence_count {
            debug!(
                evidence = aggregated.len(),
                required = self.config.min_evidence_count,
                "Insufficient evidence"
            );
            TierVerdict::new(
                Tier::InsufficientEvidence,
                Verdict::Unverified,
                aggregated.reliability_score,
            )
        } else {
            let outcome = {
                let ctx = VerificationContext::new(claim, profile, &aggregated, &self.registry);
                AssertUnwindSafe(self.run_chain(&ctx)).catch_unwind().await
            };
            match outcome {
                Ok(Ok(verdict)) => verdict,
                Ok(Err(e)) => return self.fault(claim, profile, aggregated, e.to_string()),
                Err(panic) => {
                    let message = panic_message(&*panic);
                    return self.fault(claim, profile, aggregated, format!("panic: {}", message));
                }
            }
        };

        self.assemble(claim, profile, aggregated, verdict)
    }

    async fn run_chain(&self, ctx: &VerificationContext<'_>) -> Result<TierVerdict, VerityError> {
        for strategy in &self.strategies {
            if let Some(verdict) = strategy.try_verify(ctx).await? {
                return Ok(verdict);
            }
            debug!(tier = %strategy.tier(), "Tier deferred");
        }
        Ok(TierVerdict::new(Tier::Generic, Verdict::Unverified, 0.0))
    }

    fn fault(
        &self,
        claim: &str,
        profile: &ClaimProfile,
        aggregated: AggregatedEvidence,
        message: String,
    ) -> VerificationResult {
        error!(claim, fault = %message, "Verification fault; returning Unverified");
        let mut result = self.assemble(
            claim,
            profile,
            aggregated,
            TierVerdict::new(Tier::Fault, Verdict::Unverified, 0.0),
        );
        result.metadata.fault = Some(message);
        result.explanation = self.explainer.explain_fault();
        result
    }

    fn assemble(
        &self,
        claim: &str,
        profile: &ClaimProfile,
        aggregated: AggregatedEvidence,
        verdict: TierVerdict,
    ) -> VerificationResult {
        let confidence = if verdict.confidence.is_finite() {
            verdict.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut metadata = ResultMetadata::new(verdict.tier);
        metadata.contradiction_ratio = contradiction_ratio(&aggregated.evidence);
        metadata.evidence_scores = verdict.evidence_scores;
        metadata.categories = profile.categories.clone();
        metadata.rating = verdict.rating;
        metadata.decisive_evidence = verdict.decisive_evidence;
        metadata.judge_scores = verdict.judge_scores;
        metadata.conflicting_sources = verdict.conflicting_sources;
        metadata.rationale = verdict.rationale;

        let mut evidence = aggregated.evidence.clone();
        evidence.extend(verdict.extra_evidence);
        let sources = distinct_sources(&evidence);

        let mut result = VerificationResult {
            claim: claim.to_string(),
            status: verdict.status,
            confidence,
            evidence,
            sources,
            explanation: String::new(),
            metadata,
            verified_at: Utc::now(),
        };
        result.explanation = self.explainer.explain(&result, &aggregated);

        info!(
            status = %result.status,
            confidence = result.confidence,
            tier = %result.metadata.tier,
            evidence = result.evidence.len(),
            "Claim verified"
        );
        result
    }
}

fn distinct_sources(evidence: &[Evidence]) -> Vec<Arc<Source>> {
    let mut seen = HashSet::new();
    evidence
        .iter()
        .filter(|e| seen.insert(e.source.id.clone()))
        .map(|e| Arc::clone(&e.source))
        .collect()
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReliabilityLevel, SourceDescriptor, SourceType};

    struct FailingStrategy;

    #[async_trait]
    impl VerificationStrategy for FailingStrategy {
        fn tier(&self) -> Tier {
            Tier::Generic
        }

        async fn try_verify(
            &self,
            _ctx: &VerificationContext<'_>,
        ) -> Result<Option<TierVerdict>, VerityError> {
            Err(VerityError::internal("generic", "scoring table missing"))
        }
    }

    struct PanickingStrategy;

    #[async_trait]
    impl VerificationStrategy for PanickingStrategy {
        fn tier(&self) -> Tier {
            Tier::Generic
        }

        async fn try_verify(
            &self,
            _ctx: &VerificationContext<'_>,
        ) -> Result<Option<TierVerdict>, VerityError> {
            panic!("index out of bounds")
        }
    }

    struct DeferringStrategy;

    #[async_trait]
    impl VerificationStrategy for DeferringStrategy {
        fn tier(&self) -> Tier {
            Tier::FactCheck
        }

        async fn try_verify(
            &self,
            _ctx: &VerificationContext<'_>,
        ) -> Result<Option<TierVerdict>, VerityError> {
            Ok(None)
        }
    }

    fn one_item() -> AggregatedEvidence {
        let source = Arc::new(Source::from_descriptor(
            &SourceDescriptor::new("bbc", "BBC News", SourceType::News, ReliabilityLevel::Verified),
            Utc::now(),
        ));
        AggregatedEvidence {
            evidence: vec![Evidence::new("Some relevant reporting on the claim.", source)],
            reliability_score: 0.69,
            total_sources: 1,
            received: 1,
            dropped: Default::default(),
        }
    }

    fn engine(strategies: Vec<Box<dyn VerificationStrategy>>) -> VerificationEngine {
        VerificationEngine::with_strategies(
            Arc::new(SourceRegistry::new()),
            EngineConfig::default(),
            strategies,
        )
    }

    #[tokio::test]
    async fn test_error_becomes_fault_result() {
        let result = engine(vec![Box::new(FailingStrategy)])
            .verify("claim", &ClaimProfile::default(), one_item())
            .await;
        assert_eq!(result.status, Verdict::Unverified);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.metadata.tier, Tier::Fault);
        assert!(result.metadata.fault.as_deref().unwrap().contains("scoring table missing"));
    }

    #[tokio::test]
    async fn test_panic_becomes_fault_result() {
        let result = engine(vec![Box::new(PanickingStrategy)])
            .verify("claim", &ClaimProfile::default(), one_item())
            .await;
        assert_eq!(result.status, Verdict::Unverified);
        assert_eq!(result.confidence, 0.0);
        assert!(result.metadata.fault.as_deref().unwrap().contains("index out of bounds"));
    }

    #[tokio::test]
    async fn test_exhausted_chain_is_unverified() {
        let result = engine(vec![Box::new(DeferringStrategy)])
            .verify("claim", &ClaimProfile::default(), one_item())
            .await;
        assert_eq!(result.status, Verdict::Unverified);
        assert!(result.metadata.fault.is_none());
    }

    #[tokio::test]
    async fn test_insufficient_evidence_surfaces_partial_score() {
        let config = EngineConfig {
            min_evidence_count: 2,
            ..Default::default()
        };
        let engine = VerificationEngine::with_strategies(
            Arc::new(SourceRegistry::new()),
            config,
            vec![Box::new(FailingStrategy)],
        );
        let result = engine.verify("claim", &ClaimProfile::default(), one_item()).await;
        assert_eq!(result.status, Verdict::Unverified);
        assert_eq!(result.metadata.tier, Tier::InsufficientEvidence);
        assert!((result.confidence - 0.69).abs() < 1e-9);
        assert_eq!(result.sources.len(), 1);
    }

    #[test]
    fn test_term_helpers() {
        let terms = vec!["eiffel".to_string(), "paris".to_string()];
        assert!(covers_all(&terms, "the eiffel tower is in paris"));
        assert!(!covers_all(&terms, "the eiffel tower"));
        assert!(!covers_all(&[], "anything"));
        assert_eq!(term_match(&terms, "the eiffel tower"), 0.5);
        assert_eq!(term_match(&[], "anything"), 0.0);
    }
}
