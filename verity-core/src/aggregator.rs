//! Evidence aggregation.
//!
//! Merges provider output into one evidence list: flatten (registering every
//! source), deduplicate by exact content, then drop items that are too short or
//! too long, come from low-reliability sources, or come from sources whose last
//! verification is stale. Wikipedia reference extracts are exempt from the
//! length and staleness filters.

use crate::config::AggregatorConfig;
use crate::registry::{self, SourceRegistry};
use crate::types::{ClaimProfile, Evidence, SourceType};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Counts of evidence removed at each pipeline stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropCounts {
    pub duplicates: usize,
    pub length: usize,
    pub low_reliability: usize,
    pub stale: usize,
}

/// Output of the aggregator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregatedEvidence {
    pub evidence: Vec<Evidence>,
    /// Overall reliability in `[0.0, 1.0]`; zero when no evidence survived.
    pub reliability_score: f64,
    /// Distinct sources among the surviving evidence.
    pub total_sources: usize,
    /// Evidence items received before filtering.
    pub received: usize,
    pub dropped: DropCounts,
}

impl AggregatedEvidence {
    pub fn is_empty(&self) -> bool {
        self.evidence.is_empty()
    }

    pub fn len(&self) -> usize {
        self.evidence.len()
    }
}

/// Fraction of evidence items flagged as contradicting the claim; 0 when empty.
pub fn contradiction_ratio(evidence: &[Evidence]) -> f64 {
    if evidence.is_empty() {
        return 0.0;
    }
    let contradictory = evidence.iter().filter(|e| e.is_contradictory()).count();
    contradictory as f64 / evidence.len() as f64
}

/// Distinct source types present divided by the number of known types.
pub fn source_type_diversity(evidence: &[Evidence]) -> f64 {
    let types: HashSet<SourceType> = evidence.iter().map(|e| e.source.source_type).collect();
    types.len() as f64 / SourceType::ALL.len() as f64
}

/// Number of distinct source ids among the evidence.
pub fn distinct_sources(evidence: &[Evidence]) -> usize {
    evidence
        .iter()
        .map(|e| e.source.id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Merges, filters and scores evidence from all providers.
pub struct EvidenceAggregator {
    registry: Arc<SourceRegistry>,
    config: AggregatorConfig,
}

impl EvidenceAggregator {
    pub fn new(registry: Arc<SourceRegistry>, config: AggregatorConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    /// Aggregate provider results as of now.
    pub fn aggregate(
        &self,
        profile: &ClaimProfile,
        provider_results: Vec<Vec<Evidence>>,
    ) -> AggregatedEvidence {
        self.aggregate_at(profile, provider_results, Utc::now())
    }

    /// Aggregate provider results against an explicit clock.
    pub fn aggregate_at(
        &self,
        profile: &ClaimProfile,
        provider_results: Vec<Vec<Evidence>>,
        now: DateTime<Utc>,
    ) -> AggregatedEvidence {
        let flattened: Vec<Evidence> = provider_results
            .into_iter()
            .flatten()
            .map(|e| {
                let canonical = self.registry.canonicalize(&e.source);
                e.rebind(canonical)
            })
            .collect();
        let received = flattened.len();
        if received == 0 {
            return AggregatedEvidence::default();
        }

        let mut dropped = DropCounts::default();
        let mut seen = HashSet::new();
        let max_age = Duration::days(self.config.max_source_age_days);

        let mut evidence = Vec::with_capacity(received);
        for item in flattened {
            if !seen.insert(item.content.clone()) {
                dropped.duplicates += 1;
                continue;
            }
            let wikipedia = item.source.is_wikipedia();
            let len = item.content.chars().count();
            if !wikipedia && (len < self.config.min_content_len || len > self.config.max_content_len)
            {
                dropped.length += 1;
                continue;
            }
            if self.registry.reliability_score(&item.source) < self.config.min_source_reliability {
                dropped.low_reliability += 1;
                continue;
            }
            if !wikipedia && now - item.source.last_verified_at > max_age {
                dropped.stale += 1;
                continue;
            }
            evidence.push(item);
        }

        let reliability_score = self.reliability_score(profile, &evidence);
        let total_sources = distinct_sources(&evidence);

        debug!(
            received,
            kept = evidence.len(),
            duplicates = dropped.duplicates,
            length = dropped.length,
            low_reliability = dropped.low_reliability,
            stale = dropped.stale,
            reliability_score,
            "Evidence aggregated"
        );

        AggregatedEvidence {
            evidence,
            reliability_score,
            total_sources,
            received,
            dropped,
        }
    }

    /// Overall reliability: 0.7 × mean adjusted score + 0.3 × source type diversity.
    pub fn reliability_score(&self, profile: &ClaimProfile, evidence: &[Evidence]) -> f64 {
        if evidence.is_empty() {
            return 0.0;
        }
        let mean = evidence
            .iter()
            .map(|e| self.adjusted_score(e, profile))
            .sum::<f64>()
            / evidence.len() as f64;
        (0.7 * mean + 0.3 * source_type_diversity(evidence)).clamp(0.0, 1.0)
    }

    /// Per-evidence source score with capped boosts; see [`adjusted_score`].
    pub fn adjusted_score(&self, evidence: &Evidence, profile: &ClaimProfile) -> f64 {
        adjusted_score(evidence, profile, &self.config)
    }
}

/// Per-evidence source score with capped boosts for biographical reference
/// material, Wikipedia, and primary sources. Each boost is capped on its own.
pub fn adjusted_score(evidence: &Evidence, profile: &ClaimProfile, config: &AggregatorConfig) -> f64 {
    let cap = config.boost_cap;
    let mut score = registry::reliability_score(&evidence.source);
    if profile.is_biographical && evidence.source.source_type == SourceType::Reference {
        score = (score * config.biographical_reference_boost).min(cap);
    }
    if evidence.source.is_wikipedia() {
        score = (score * config.wikipedia_boost).min(cap);
    }
    if evidence.flags.is_primary_source {
        score = (score * config.primary_source_boost).min(cap);
    }
    score
}
