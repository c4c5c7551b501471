//! Core type definitions for Verity.
//!
//! Defines the data model shared by every stage of the pipeline: sources and
//! their trust classification, evidence items with per-kind payloads, the
//! classified claim profile, and the final verification result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Broad classification of an evidence origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    News,
    Academic,
    Government,
    Reference,
    Other,
}

impl SourceType {
    /// Every known source type, used as the denominator for diversity scores.
    pub const ALL: [SourceType; 5] = [
        SourceType::News,
        SourceType::Academic,
        SourceType::Government,
        SourceType::Reference,
        SourceType::Other,
    ];
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::News => write!(f, "news"),
            SourceType::Academic => write!(f, "academic"),
            SourceType::Government => write!(f, "government"),
            SourceType::Reference => write!(f, "reference"),
            SourceType::Other => write!(f, "other"),
        }
    }
}

/// Editorial trust tier assigned to a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliabilityLevel {
    Primary,
    Verified,
    Established,
    Moderate,
    Corroborated,
    Unverified,
}

impl ReliabilityLevel {
    /// Base reliability before any flag adjustments.
    pub fn base_score(self) -> f64 {
        match self {
            ReliabilityLevel::Primary => 1.0,
            ReliabilityLevel::Verified => 0.9,
            ReliabilityLevel::Established => 0.8,
            ReliabilityLevel::Moderate => 0.75,
            ReliabilityLevel::Corroborated => 0.6,
            ReliabilityLevel::Unverified => 0.3,
        }
    }
}

/// Outcome of the most recent periodic re-verification of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceVerification {
    Verified,
    Unverified,
    #[default]
    Pending,
}

/// Boolean traits of a source that adjust its reliability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFlags {
    pub is_government: bool,
    pub is_academic: bool,
    pub is_fact_checker: bool,
    pub is_news: bool,
    pub is_reference: bool,
    pub is_ai: bool,
}

/// What a provider knows about a source before it is registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub reliability_level: ReliabilityLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Defaults to the registration time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verification_status: SourceVerification,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub flags: SourceFlags,
}

impl SourceDescriptor {
    /// Minimal descriptor; remaining fields take their defaults.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        source_type: SourceType,
        reliability_level: ReliabilityLevel,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source_type,
            reliability_level,
            url: None,
            last_verified_at: None,
            verification_status: SourceVerification::default(),
            categories: Vec::new(),
            flags: SourceFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: SourceFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_status(mut self, status: SourceVerification) -> Self {
        self.verification_status = status;
        self
    }

    pub fn verified_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_verified_at = Some(at);
        self
    }
}

/// A named evidence origin with a trust classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub reliability_level: ReliabilityLevel,
    pub url: Option<String>,
    pub last_verified_at: DateTime<Utc>,
    pub verification_status: SourceVerification,
    pub categories: Vec<String>,
    pub flags: SourceFlags,
}

impl Source {
    /// Materialize a descriptor, stamping `now` when no verification time is known.
    pub fn from_descriptor(descriptor: &SourceDescriptor, now: DateTime<Utc>) -> Self {
        Self {
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            source_type: descriptor.source_type,
            reliability_level: descriptor.reliability_level,
            url: descriptor.url.clone(),
            last_verified_at: descriptor.last_verified_at.unwrap_or(now),
            verification_status: descriptor.verification_status,
            categories: descriptor.categories.clone(),
            flags: descriptor.flags,
        }
    }

    /// Reference sources backed by Wikipedia get length and staleness exemptions.
    pub fn is_wikipedia(&self) -> bool {
        if self.source_type != SourceType::Reference {
            return false;
        }
        self.name.to_lowercase().contains("wikipedia")
            || self
                .url
                .as_deref()
                .is_some_and(|u| u.to_lowercase().contains("wikipedia.org"))
    }

    /// Whether the source counts as reference material for the current-event tier.
    pub fn is_reference(&self) -> bool {
        self.source_type == SourceType::Reference || self.flags.is_reference
    }
}

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

/// Which judge in the ensemble produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeRole {
    /// The main general-purpose language model judge.
    PrimaryLm,
    /// An entailment/contradiction classifier.
    Entailment,
    /// An optional second language model judge.
    SecondaryLm,
}

impl std::fmt::Display for JudgeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JudgeRole::PrimaryLm => write!(f, "primary-lm"),
            JudgeRole::Entailment => write!(f, "entailment"),
            JudgeRole::SecondaryLm => write!(f, "secondary-lm"),
        }
    }
}

/// Coarse stance a judge took towards the claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeLabel {
    Supports,
    Refutes,
    #[default]
    Neutral,
}

/// Per-kind payload of an evidence item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceKind {
    /// A professional fact-check review.
    FactCheck {
        #[serde(default)]
        rating: Option<String>,
        #[serde(default)]
        publisher: Option<String>,
        #[serde(default)]
        reviewed_claim: Option<String>,
    },
    /// An encyclopedic article extract.
    Reference {
        #[serde(default)]
        title: Option<String>,
    },
    /// A news search hit.
    News {
        #[serde(default)]
        outlet: Option<String>,
    },
    /// Supplementary rationale from an AI judge.
    AiJudge {
        judge: String,
        role: JudgeRole,
        score: f64,
        label: JudgeLabel,
    },
    #[default]
    Generic,
}

/// Boolean traits of one evidence item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceFlags {
    pub is_primary_source: bool,
    pub is_direct_statement: bool,
    pub is_official_document: bool,
    pub is_contradictory: bool,
    /// How closely the reviewed statement matches the submitted claim.
    pub similarity_score: f64,
}

impl Default for EvidenceFlags {
    fn default() -> Self {
        Self {
            is_primary_source: false,
            is_direct_statement: false,
            is_official_document: false,
            is_contradictory: false,
            similarity_score: 1.0,
        }
    }
}

/// A retrieved text unit plus its source, confidence, and flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evidence {
    pub id: Uuid,
    pub content: String,
    pub source: Arc<Source>,
    pub timestamp: DateTime<Utc>,
    pub url: Option<String>,
    /// Provider confidence, clamped to `[0.0, 1.0]`.
    pub confidence: f64,
    pub categories: Vec<String>,
    pub flags: EvidenceFlags,
    #[serde(flatten)]
    pub kind: EvidenceKind,
}

impl Evidence {
    pub fn new(content: impl Into<String>, source: Arc<Source>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            source,
            timestamp: Utc::now(),
            url: None,
            confidence: 1.0,
            categories: Vec::new(),
            flags: EvidenceFlags::default(),
            kind: EvidenceKind::Generic,
        }
    }

    pub fn with_kind(mut self, kind: EvidenceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_flags(mut self, flags: EvidenceFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// Same evidence bound to a different (canonical) source handle.
    pub fn rebind(self, source: Arc<Source>) -> Self {
        Self { source, ..self }
    }

    /// Whether the content contradicts the claim it was retrieved for.
    pub fn is_contradictory(&self) -> bool {
        self.flags.is_contradictory
    }
}

// ---------------------------------------------------------------------------
// Claims and results
// ---------------------------------------------------------------------------

/// Rule-based classification of a claim's text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClaimProfile {
    pub raw_text: String,
    pub is_temporal: bool,
    pub is_factual: bool,
    pub is_predictive: bool,
    pub is_biographical: bool,
    pub is_historical: bool,
    pub categories: BTreeSet<String>,
}

/// Final verdict on a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Verified,
    False,
    Disputed,
    Unverified,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Verified => write!(f, "Verified"),
            Verdict::False => write!(f, "False"),
            Verdict::Disputed => write!(f, "Disputed"),
            Verdict::Unverified => write!(f, "Unverified"),
        }
    }
}

/// Which step of the strategy chain decided the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    PredictiveCheck,
    InsufficientEvidence,
    FactCheck,
    CurrentEvent,
    AiEnsemble,
    Biographical,
    Generic,
    Fault,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::PredictiveCheck => "predictive-check",
            Tier::InsufficientEvidence => "insufficient-evidence",
            Tier::FactCheck => "fact-check",
            Tier::CurrentEvent => "current-event",
            Tier::AiEnsemble => "ai-ensemble",
            Tier::Biographical => "biographical",
            Tier::Generic => "generic",
            Tier::Fault => "fault",
        };
        write!(f, "{}", name)
    }
}

/// One judge's contribution to an ensemble verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeScore {
    pub judge: String,
    pub role: JudgeRole,
    pub score: f64,
    pub weight: f64,
}

/// Diagnostic details attached to every result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMetadata {
    pub contradiction_ratio: f64,
    /// Per-evidence scores from whichever tier decided, in evidence order.
    pub evidence_scores: Vec<f64>,
    pub categories: BTreeSet<String>,
    pub tier: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decisive_evidence: Option<Uuid>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub judge_scores: Vec<JudgeScore>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicting_sources: Vec<String>,
    /// Rationale text supplied by the deciding tier, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

impl ResultMetadata {
    pub fn new(tier: Tier) -> Self {
        Self {
            contradiction_ratio: 0.0,
            evidence_scores: Vec::new(),
            categories: BTreeSet::new(),
            tier,
            rating: None,
            decisive_evidence: None,
            judge_scores: Vec::new(),
            conflicting_sources: Vec::new(),
            rationale: None,
            fault: None,
        }
    }
}

/// The engine's answer for one claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    pub claim: String,
    pub status: Verdict,
    /// Always within `[0.0, 1.0]`.
    pub confidence: f64,
    pub evidence: Vec<Evidence>,
    pub sources: Vec<Arc<Source>>,
    pub explanation: String,
    pub metadata: ResultMetadata,
    pub verified_at: DateTime<Utc>,
}

impl VerificationResult {
    /// Look up an evidence item attached to this result.
    pub fn evidence_by_id(&self, id: &Uuid) -> Option<&Evidence> {
        self.evidence.iter().find(|e| e.id == *id)
    }

    /// The evidence item that decided the verdict, if the tier named one.
    pub fn decisive_evidence(&self) -> Option<&Evidence> {
        self.metadata
            .decisive_evidence
            .as_ref()
            .and_then(|id| self.evidence_by_id(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wiki() -> Source {
        Source::from_descriptor(
            &SourceDescriptor::new(
                "wikipedia",
                "Wikipedia",
                SourceType::Reference,
                ReliabilityLevel::Established,
            ),
            Utc::now(),
        )
    }

    #[test]
    fn test_base_scores() {
        assert_eq!(ReliabilityLevel::Primary.base_score(), 1.0);
        assert_eq!(ReliabilityLevel::Moderate.base_score(), 0.75);
        assert_eq!(ReliabilityLevel::Unverified.base_score(), 0.3);
    }

    #[test]
    fn test_is_wikipedia_by_name_or_url() {
        assert!(wiki().is_wikipedia());

        let by_url = Source::from_descriptor(
            &SourceDescriptor::new("enc", "Encyclopedia", SourceType::Reference, ReliabilityLevel::Verified)
                .with_url("https://en.wikipedia.org/wiki/Rust"),
            Utc::now(),
        );
        assert!(by_url.is_wikipedia());

        let news = Source::from_descriptor(
            &SourceDescriptor::new("wp-news", "Wikipedia Weekly", SourceType::News, ReliabilityLevel::Moderate),
            Utc::now(),
        );
        assert!(!news.is_wikipedia());
    }

    #[test]
    fn test_descriptor_defaults_verification_time() {
        let now = Utc::now();
        let source = Source::from_descriptor(
            &SourceDescriptor::new("x", "X", SourceType::Other, ReliabilityLevel::Moderate),
            now,
        );
        assert_eq!(source.last_verified_at, now);
        assert_eq!(source.verification_status, SourceVerification::Pending);
    }

    #[test]
    fn test_evidence_confidence_is_clamped() {
        let ev = Evidence::new("content", Arc::new(wiki())).with_confidence(1.7);
        assert_eq!(ev.confidence, 1.0);
        let ev = ev.with_confidence(-0.2);
        assert_eq!(ev.confidence, 0.0);
    }

    #[test]
    fn test_evidence_kind_serializes_tagged() {
        let ev = Evidence::new("Rating: FALSE", Arc::new(wiki())).with_kind(EvidenceKind::FactCheck {
            rating: Some("FALSE".into()),
            publisher: Some("Snopes".into()),
            reviewed_claim: None,
        });
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["kind"], "fact_check");
        assert_eq!(json["rating"], "FALSE");
    }
}
