//! Biographical check, run ahead of the generic tier for claims about people.
//!
//! Verified needs a high-reliability source and one evidence item mentioning
//! every key term of the claim. Otherwise the claim is Disputed when enough
//! evidence contradicts it, and Unverified with the computed confidence when
//! not.

use super::{TierVerdict, VerificationContext, VerificationStrategy, covers_all};
use crate::aggregator::adjusted_score;
use crate::config::{AggregatorConfig, EngineConfig};
use crate::error::VerityError;
use crate::registry;
use crate::types::{Evidence, SourceType, Tier, Verdict};
use async_trait::async_trait;
use regex::Regex;

pub struct BiographicalStrategy {
    config: EngineConfig,
    aggregator: AggregatorConfig,
    life_events: Regex,
}

impl BiographicalStrategy {
    pub fn new(config: EngineConfig, aggregator: AggregatorConfig) -> Self {
        Self {
            config,
            aggregator,
            life_events: Regex::new(
                r"(?i)\b(born|died|early life|career|married|graduated|biography|childhood|raised in|known for)\b",
            )
            .expect("life event pattern is static and valid"),
        }
    }

    fn is_high_reliability(&self, evidence: &Evidence) -> bool {
        matches!(
            evidence.source.source_type,
            SourceType::Reference | SourceType::Academic
        ) || registry::reliability_score(&evidence.source) >= self.config.high_reliability_threshold
    }

    /// Quality of one item from its statement flags and biographical content.
    pub fn quality(&self, evidence: &Evidence) -> f64 {
        let mut quality: f64 = 0.0;
        if evidence.flags.is_direct_statement {
            quality += 0.3;
        }
        if evidence.flags.is_official_document {
            quality += 0.2;
        }
        if evidence.flags.is_primary_source {
            quality += 0.2;
        }
        if self.life_events.is_match(&evidence.content)
            || evidence.categories.iter().any(|c| c == "biography")
        {
            quality += 0.2;
        }
        quality.min(1.0)
    }
}

#[async_trait]
impl VerificationStrategy for BiographicalStrategy {
    fn tier(&self) -> Tier {
        Tier::Biographical
    }

    async fn try_verify(
        &self,
        ctx: &VerificationContext<'_>,
    ) -> Result<Option<TierVerdict>, VerityError> {
        if !ctx.profile.is_biographical {
            return Ok(None);
        }
        let evidence = ctx.evidence();
        if evidence.is_empty() {
            return Ok(None);
        }

        let adjusted: Vec<f64> = evidence
            .iter()
            .map(|e| adjusted_score(e, ctx.profile, &self.aggregator))
            .collect();
        let n = evidence.len() as f64;
        let avg_adjusted = adjusted.iter().sum::<f64>() / n;
        let quality = evidence.iter().map(|e| self.quality(e)).sum::<f64>() / n;
        let mut confidence = 0.6 * avg_adjusted + 0.4 * quality;

        let high_reliability = evidence.iter().any(|e| self.is_high_reliability(e));
        let covering = evidence
            .iter()
            .find(|e| covers_all(&ctx.key_terms, &e.content.to_lowercase()));

        if let Some(item) = covering
            && item.source.is_wikipedia()
        {
            confidence = (confidence * self.config.wikipedia_verdict_boost).min(self.config.boost_cap);
        }
        let confidence = confidence.clamp(0.0, 1.0);

        let verdict = match covering {
            Some(item) if high_reliability => {
                TierVerdict::new(Tier::Biographical, Verdict::Verified, confidence).with_decisive(item)
            }
            _ if ctx.contradiction_ratio > self.config.contradiction_threshold => {
                TierVerdict::new(Tier::Biographical, Verdict::Disputed, confidence)
            }
            _ => TierVerdict::new(Tier::Biographical, Verdict::Unverified, confidence),
        };
        Ok(Some(verdict.with_scores(adjusted)))
    }
}
