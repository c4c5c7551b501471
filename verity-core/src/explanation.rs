//! Human-readable justifications for verification results.
//!
//! Pure and template-driven: the text depends only on the result and the
//! aggregation it was computed from.

use crate::aggregator::AggregatedEvidence;
use crate::config::EngineConfig;
use crate::types::{EvidenceKind, Tier, VerificationResult, Verdict};

fn percent(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}

/// Renders explanations for each verdict.
#[derive(Debug, Clone)]
pub struct ExplanationGenerator {
    similarity_caveat_threshold: f64,
    verified_threshold: f64,
    min_evidence_count: usize,
}

impl ExplanationGenerator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            similarity_caveat_threshold: config.similarity_caveat_threshold,
            verified_threshold: config.verified_threshold,
            min_evidence_count: config.min_evidence_count,
        }
    }

    pub fn explain(&self, result: &VerificationResult, aggregated: &AggregatedEvidence) -> String {
        match result.status {
            Verdict::Verified => self.explain_verified(result, aggregated),
            Verdict::False => self.explain_false(result),
            Verdict::Disputed => self.explain_disputed(result),
            Verdict::Unverified => self.explain_unverified(result, aggregated),
        }
    }

    /// Text used when the engine hit an internal fault.
    pub fn explain_fault(&self) -> String {
        "The claim could not be verified because of an internal error while evaluating the evidence."
            .to_string()
    }

    fn explain_verified(&self, result: &VerificationResult, aggregated: &AggregatedEvidence) -> String {
        let confidence = percent(result.confidence);
        if let Some(rationale) = &result.metadata.rationale {
            return format!("Verified ({} confidence). {}", confidence, rationale);
        }
        match (result.metadata.tier, result.decisive_evidence()) {
            (Tier::FactCheck, Some(e)) => format!(
                "Verified: {} rated this claim {}.",
                e.source.name,
                result.metadata.rating.as_deref().unwrap_or("true")
            ),
            (Tier::CurrentEvent | Tier::Biographical, Some(e)) => format!(
                "Verified ({} confidence): {} confirms the claim.",
                confidence, e.source.name
            ),
            _ => format!(
                "Verified ({} confidence), supported by {} evidence item(s) from {} source(s).",
                confidence,
                aggregated.len(),
                aggregated.total_sources
            ),
        }
    }

    fn explain_false(&self, result: &VerificationResult) -> String {
        let Some(decisive) = result.decisive_evidence() else {
            if let Some(rationale) = &result.metadata.rationale {
                return format!("False ({} confidence). {}", percent(result.confidence), rationale);
            }
            return format!(
                "False ({} confidence): the evidence does not support this claim.",
                percent(result.confidence)
            );
        };

        let mut text = match (&result.metadata.rating, result.metadata.tier) {
            (Some(rating), _) => format!("{} rated this claim {}.", decisive.source.name, rating),
            (None, Tier::FactCheck) => {
                format!("{} reports that this claim is false.", decisive.source.name)
            }
            (None, _) => format!(
                "False ({} confidence): {} does not support this claim.",
                percent(result.confidence),
                decisive.source.name
            ),
        };
        let reviewed = match &decisive.kind {
            EvidenceKind::FactCheck {
                reviewed_claim: Some(reviewed),
                ..
            } => Some(reviewed.as_str()),
            _ => None,
        };
        if decisive.flags.similarity_score < self.similarity_caveat_threshold {
            text.push_str(" Note: the fact-check addresses a related, not identical, claim");
            match reviewed {
                Some(reviewed) => text.push_str(&format!(": \"{}\".", reviewed)),
                None => text.push('.'),
            }
        }
        text
    }

    fn explain_disputed(&self, result: &VerificationResult) -> String {
        let meta = &result.metadata;
        if !meta.conflicting_sources.is_empty() {
            return format!(
                "Disputed: fact-checkers disagree ({}).",
                meta.conflicting_sources.join(", ")
            );
        }
        match meta.tier {
            Tier::FactCheck => {
                let source = result
                    .decisive_evidence()
                    .map(|e| e.source.name.as_str())
                    .unwrap_or("A fact-checker");
                format!(
                    "Disputed: {} rated this claim {}.",
                    source,
                    meta.rating.as_deref().unwrap_or("mixed")
                )
            }
            Tier::AiEnsemble => format!(
                "Disputed: AI judges were inconclusive (weighted score {:.2}).{}",
                result.confidence,
                meta.rationale
                    .as_deref()
                    .map(|r| format!(" {}", r))
                    .unwrap_or_default()
            ),
            _ => format!(
                "Disputed: {} of the evidence contradicts the claim.",
                percent(meta.contradiction_ratio)
            ),
        }
    }

    fn explain_unverified(&self, result: &VerificationResult, aggregated: &AggregatedEvidence) -> String {
        match result.metadata.tier {
            Tier::PredictiveCheck => {
                return "Unverified: the claim is a prediction about the future and cannot be checked against present evidence."
                    .to_string();
            }
            Tier::Fault => return self.explain_fault(),
            _ => {}
        }

        if aggregated.is_empty() {
            if aggregated.received == 0 {
                return "Unverified: no evidence was found for this claim.".to_string();
            }
            return format!(
                "Unverified: {} evidence item(s) were retrieved but none passed quality and reliability filtering.",
                aggregated.received
            );
        }
        if aggregated.len() < self.min_evidence_count {
            return format!(
                "Unverified: insufficient evidence ({} item(s), at least {} required).",
                aggregated.len(),
                self.min_evidence_count
            );
        }
        format!(
            "Unverified: evidence was found ({} item(s)) but confidence {} is below the {} threshold.",
            aggregated.len(),
            percent(result.confidence),
            percent(self.verified_threshold)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ClaimProfile, Evidence, EvidenceFlags, ReliabilityLevel, ResultMetadata, Source,
        SourceDescriptor, SourceType,
    };
    use chrono::Utc;
    use std::sync::Arc;

    fn generator() -> ExplanationGenerator {
        ExplanationGenerator::new(&EngineConfig::default())
    }

    fn result(status: Verdict, tier: Tier, evidence: Vec<Evidence>) -> VerificationResult {
        VerificationResult {
            claim: ClaimProfile::default().raw_text,
            status,
            confidence: 0.95,
            evidence,
            sources: Vec::new(),
            explanation: String::new(),
            metadata: ResultMetadata::new(tier),
            verified_at: Utc::now(),
        }
    }

    fn snopes_item(similarity: f64) -> Evidence {
        let source = Arc::new(Source::from_descriptor(
            &SourceDescriptor::new("snopes", "Snopes", SourceType::Other, ReliabilityLevel::Verified),
            Utc::now(),
        ));
        Evidence::new("Rating: FALSE", source)
            .with_flags(EvidenceFlags {
                similarity_score: similarity,
                ..Default::default()
            })
            .with_kind(EvidenceKind::FactCheck {
                rating: Some("FALSE".into()),
                publisher: None,
                reviewed_claim: Some("A similar viral post".into()),
            })
    }

    #[test]
    fn test_false_cites_source_and_rating() {
        let item = snopes_item(0.95);
        let mut r = result(Verdict::False, Tier::FactCheck, vec![item.clone()]);
        r.metadata.rating = Some("FALSE".into());
        r.metadata.decisive_evidence = Some(item.id);
        let text = generator().explain(&r, &AggregatedEvidence::default());
        assert_eq!(text, "Snopes rated this claim FALSE.");
    }

    #[test]
    fn test_false_adds_similarity_caveat() {
        let item = snopes_item(0.5);
        let mut r = result(Verdict::False, Tier::FactCheck, vec![item.clone()]);
        r.metadata.rating = Some("FALSE".into());
        r.metadata.decisive_evidence = Some(item.id);
        let text = generator().explain(&r, &AggregatedEvidence::default());
        assert!(text.contains("related, not identical, claim"));
        assert!(text.contains("A similar viral post"));
    }

    #[test]
    fn test_unverified_variants() {
        let g = generator();
        let none = g.explain(
            &result(Verdict::Unverified, Tier::InsufficientEvidence, vec![]),
            &AggregatedEvidence::default(),
        );
        assert!(none.contains("no evidence was found"));

        let filtered = AggregatedEvidence {
            received: 3,
            ..Default::default()
        };
        let text = g.explain(
            &result(Verdict::Unverified, Tier::InsufficientEvidence, vec![]),
            &filtered,
        );
        assert!(text.contains("3 evidence item(s) were retrieved"));

        let predictive = g.explain(
            &result(Verdict::Unverified, Tier::PredictiveCheck, vec![]),
            &AggregatedEvidence::default(),
        );
        assert!(predictive.contains("prediction about the future"));
    }

    #[test]
    fn test_unverified_below_threshold() {
        let item = snopes_item(1.0);
        let aggregated = AggregatedEvidence {
            evidence: vec![item.clone()],
            received: 1,
            total_sources: 1,
            ..Default::default()
        };
        let mut r = result(Verdict::Unverified, Tier::Generic, vec![item]);
        r.confidence = 0.45;
        let text = generator().explain(&r, &aggregated);
        assert_eq!(
            text,
            "Unverified: evidence was found (1 item(s)) but confidence 45% is below the 60% threshold."
        );
    }

    #[test]
    fn test_disputed_cites_ratio_or_conflict() {
        let mut r = result(Verdict::Disputed, Tier::Generic, vec![]);
        r.metadata.contradiction_ratio = 0.4;
        assert_eq!(
            generator().explain(&r, &AggregatedEvidence::default()),
            "Disputed: 40% of the evidence contradicts the claim."
        );

        let mut r = result(Verdict::Disputed, Tier::FactCheck, vec![]);
        r.metadata.conflicting_sources = vec!["Snopes".into(), "PolitiFact".into()];
        assert_eq!(
            generator().explain(&r, &AggregatedEvidence::default()),
            "Disputed: fact-checkers disagree (Snopes, PolitiFact)."
        );
    }
}
