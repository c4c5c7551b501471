//! Fact-check registry tier.
//!
//! Evidence from fact-checking outlets carries a rating token. A parsed
//! rating decides the verdict outright; disagreeing fact-checkers make the
//! claim Disputed.

use super::{TierVerdict, VerificationContext, VerificationStrategy};
use crate::config::EngineConfig;
use crate::error::VerityError;
use crate::registry;
use crate::types::{Evidence, EvidenceKind, Tier, Verdict};
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

const VERIFIED_RATINGS: &[&str] = &["TRUE", "CORRECT", "ACCURATE", "CORRECT ATTRIBUTION"];
const FALSE_RATINGS: &[&str] = &[
    "FALSE",
    "PANTS ON FIRE",
    "INCORRECT",
    "FAKE",
    "FABRICATED",
    "MISATTRIBUTED",
];
/// Multi-word ratings recognised before falling back to the first word.
const PHRASE_RATINGS: &[&str] = &[
    "PANTS ON FIRE",
    "HALF TRUE",
    "MOSTLY TRUE",
    "MOSTLY FALSE",
    "PARTLY FALSE",
    "PARTLY TRUE",
    "MISSING CONTEXT",
    "LACKS CONTEXT",
    "CORRECT ATTRIBUTION",
];

/// Map a rating token to a verdict. Any non-empty rating other than the
/// true/false families is Disputed.
pub fn map_rating(rating: &str) -> Option<Verdict> {
    let normalized = normalize_rating(rating)?;
    Some(if VERIFIED_RATINGS.contains(&normalized.as_str()) {
        Verdict::Verified
    } else if FALSE_RATINGS.contains(&normalized.as_str()) {
        Verdict::False
    } else {
        Verdict::Disputed
    })
}

/// Uppercase, collapse separators, and keep a known phrase or the first word.
pub fn normalize_rating(rating: &str) -> Option<String> {
    let cleaned = rating
        .to_uppercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if cleaned.is_empty() {
        return None;
    }
    if let Some(phrase) = PHRASE_RATINGS.iter().find(|p| cleaned.starts_with(*p)) {
        return Some(phrase.to_string());
    }
    cleaned.split(' ').next().map(|w| w.to_string())
}

pub struct FactCheckStrategy {
    config: EngineConfig,
    rating_pattern: Regex,
}

impl FactCheckStrategy {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            rating_pattern: Regex::new(r"(?i)\brating\s*[:=]\s*([a-z]+(?:[ \-][a-z]+){0,3})")
                .expect("rating pattern is static and valid"),
        }
    }

    /// The rating of a fact-check item: its structured field first, then the content.
    pub fn rating_of(&self, evidence: &Evidence) -> Option<String> {
        if let EvidenceKind::FactCheck {
            rating: Some(rating),
            ..
        } = &evidence.kind
            && normalize_rating(rating).is_some()
        {
            return normalize_rating(rating);
        }
        self.rating_pattern
            .captures(&evidence.content)
            .and_then(|c| c.get(1))
            .and_then(|m| normalize_rating(m.as_str()))
    }

    fn confidence_for(&self, status: Verdict) -> f64 {
        match status {
            Verdict::Disputed => self.config.fact_check_disputed_confidence,
            _ => self.config.fact_check_confidence,
        }
    }
}

#[async_trait]
impl VerificationStrategy for FactCheckStrategy {
    fn tier(&self) -> Tier {
        Tier::FactCheck
    }

    async fn try_verify(
        &self,
        ctx: &VerificationContext<'_>,
    ) -> Result<Option<TierVerdict>, VerityError> {
        let checks: Vec<&Evidence> = ctx
            .evidence()
            .iter()
            .filter(|e| e.source.flags.is_fact_checker)
            .collect();
        if checks.is_empty() {
            return Ok(None);
        }
        let scores: Vec<f64> = checks
            .iter()
            .map(|e| registry::reliability_score(&e.source))
            .collect();

        let rated: Vec<(&Evidence, String, Verdict)> = checks
            .iter()
            .filter_map(|e| {
                let rating = self.rating_of(e)?;
                let verdict = map_rating(&rating)?;
                Some((*e, rating, verdict))
            })
            .collect();

        if let Some((first, rating, status)) = rated.first() {
            if rated.iter().any(|(_, _, v)| v != status) {
                let mut conflicting: Vec<String> = Vec::new();
                for (e, _, _) in &rated {
                    if !conflicting.contains(&e.source.name) {
                        conflicting.push(e.source.name.clone());
                    }
                }
                debug!(sources = ?conflicting, "Fact-checkers disagree");
                let mut verdict = TierVerdict::new(
                    Tier::FactCheck,
                    Verdict::Disputed,
                    self.config.fact_check_disputed_confidence,
                )
                .with_scores(scores)
                .with_decisive(first);
                verdict.conflicting_sources = conflicting;
                return Ok(Some(verdict));
            }

            debug!(rating = %rating, status = %status, source = %first.source.name, "Fact-check rating decided");
            return Ok(Some(
                TierVerdict::new(Tier::FactCheck, *status, self.confidence_for(*status))
                    .with_scores(scores)
                    .with_rating(rating.clone())
                    .with_decisive(first),
            ));
        }

        if let Some(contradicting) = checks.iter().find(|e| e.is_contradictory()) {
            return Ok(Some(
                TierVerdict::new(Tier::FactCheck, Verdict::False, self.config.fact_check_confidence)
                    .with_scores(scores)
                    .with_decisive(contradicting),
            ));
        }

        Ok(None)
    }
}
