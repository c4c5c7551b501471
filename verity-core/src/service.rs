//! End-to-end claim verification.
//!
//! Classifies the claim, short-circuits predictions before any provider is
//! called, fans out to every provider, aggregates, and hands the result to the
//! engine.

use crate::aggregator::{AggregatedEvidence, EvidenceAggregator};
use crate::classifier::ClaimClassifier;
use crate::config::VerityConfig;
use crate::engine::VerificationEngine;
use crate::judges::JudgeEnsemble;
use crate::providers::ProviderSet;
use crate::registry::SourceRegistry;
use crate::types::{ClaimProfile, VerificationResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub struct VerificationService {
    classifier: ClaimClassifier,
    providers: ProviderSet,
    aggregator: EvidenceAggregator,
    engine: VerificationEngine,
}

impl VerificationService {
    pub fn new(
        classifier: ClaimClassifier,
        providers: ProviderSet,
        aggregator: EvidenceAggregator,
        engine: VerificationEngine,
    ) -> Self {
        Self {
            classifier,
            providers,
            aggregator,
            engine,
        }
    }

    /// Wire the standard pipeline around a shared registry.
    pub fn from_config(
        config: &VerityConfig,
        registry: Arc<SourceRegistry>,
        providers: ProviderSet,
        judges: JudgeEnsemble,
    ) -> Self {
        let aggregator = EvidenceAggregator::new(Arc::clone(&registry), config.aggregator.clone());
        let engine = VerificationEngine::new(registry, config, judges);
        Self::new(ClaimClassifier::new(), providers, aggregator, engine)
    }

    pub fn classify(&self, claim: &str) -> ClaimProfile {
        self.classifier.classify(claim)
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        self.aggregator.registry()
    }

    /// Verify a claim end to end. Never fails; see [`VerificationEngine::verify`].
    pub async fn verify_claim(&self, claim: &str) -> VerificationResult {
        let start = Instant::now();
        let profile = self.classifier.classify(claim);

        let aggregated = if profile.is_predictive {
            debug!("Predictive claim; providers not consulted");
            AggregatedEvidence::default()
        } else {
            let results = self.providers.gather(claim).await;
            self.aggregator.aggregate(&profile, results)
        };

        let result = self.engine.verify(claim, &profile, aggregated).await;
        info!(
            status = %result.status,
            confidence = result.confidence,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Verification request complete"
        );
        result
    }
}
