//! Generic fallback tier.
//!
//! Scores each evidence item by term match, source reliability and
//! specificity, then blends the mean item score with the aggregate
//! reliability, source-type diversity and source consistency, discounted by
//! the contradiction ratio.

use super::{TierVerdict, VerificationContext, VerificationStrategy, term_match};
use crate::aggregator::{distinct_sources, source_type_diversity};
use crate::classifier::word_count;
use crate::config::EngineConfig;
use crate::error::VerityError;
use crate::registry;
use crate::types::{Evidence, Tier, Verdict};
use async_trait::async_trait;
use tracing::debug;

/// Word count above which vague content is penalized.
const LONG_CONTENT_WORDS: usize = 100;
/// Term density below which long content counts as vague.
const VAGUE_DENSITY: f64 = 0.1;

pub struct GenericStrategy {
    config: EngineConfig,
}

impl GenericStrategy {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// `0.4 * term_match + 0.3 * source_reliability + 0.3 * specificity`.
    pub fn item_score(&self, evidence: &Evidence, terms: &[String]) -> f64 {
        let lower = evidence.content.to_lowercase();
        let matched = term_match(terms, &lower);
        let reliability = registry::reliability_score(&evidence.source);
        0.4 * matched + 0.3 * reliability + 0.3 * specificity(&lower, terms)
    }
}

/// `0.4 * density + 0.6 * coverage`, halved for long content with low density.
///
/// Density is the share of content words that are key terms; coverage is the
/// share of key terms present as whole words.
pub fn specificity(text_lower: &str, terms: &[String]) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let words: Vec<&str> = text_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return 0.0;
    }
    let hits = words.iter().filter(|w| terms.iter().any(|t| t == *w)).count();
    let density = hits as f64 / words.len() as f64;
    let covered = terms.iter().filter(|t| words.contains(&t.as_str())).count();
    let coverage = covered as f64 / terms.len() as f64;

    let mut score = 0.4 * density + 0.6 * coverage;
    if word_count(text_lower) > LONG_CONTENT_WORDS && density < VAGUE_DENSITY {
        score *= 0.5;
    }
    score
}

#[async_trait]
impl VerificationStrategy for GenericStrategy {
    fn tier(&self) -> Tier {
        Tier::Generic
    }

    async fn try_verify(
        &self,
        ctx: &VerificationContext<'_>,
    ) -> Result<Option<TierVerdict>, VerityError> {
        let evidence = ctx.evidence();
        if evidence.is_empty() {
            return Ok(Some(TierVerdict::new(
                Tier::Generic,
                Verdict::Unverified,
                ctx.aggregated.reliability_score,
            )));
        }

        let scores: Vec<f64> = evidence
            .iter()
            .map(|e| self.item_score(e, &ctx.key_terms))
            .collect();
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let diversity = source_type_diversity(evidence);
        let consistency = distinct_sources(evidence) as f64 / evidence.len() as f64;
        let ratio = ctx.contradiction_ratio;

        let raw = (0.4 * mean
            + 0.2 * ctx.aggregated.reliability_score
            + 0.2 * diversity
            + 0.2 * consistency)
            * (1.0 - 0.5 * ratio);
        let confidence = raw.clamp(0.0, 1.0);

        let status = if ratio > self.config.contradiction_threshold {
            Verdict::Disputed
        } else if confidence >= self.config.verified_threshold {
            Verdict::Verified
        } else {
            Verdict::Unverified
        };
        debug!(
            mean_item = mean,
            diversity, consistency, ratio, confidence, "Generic tier scored"
        );

        Ok(Some(
            TierVerdict::new(Tier::Generic, status, confidence).with_scores(scores),
        ))
    }
}
