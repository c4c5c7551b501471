//! Source registry and reliability scoring.
//!
//! Holds every `Source` seen during the process lifetime, keyed by id, and
//! computes each one's reliability score. The registry is constructed
//! explicitly and shared through an `Arc`; there is no global instance.

use crate::types::{ReliabilityLevel, Source, SourceDescriptor, SourceVerification};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Fact-checking outlets that earn an extra boost on top of the fact-checker flag.
const KNOWN_FACT_CHECKERS: &[&str] = &[
    "snopes",
    "politifact",
    "factcheck.org",
    "full fact",
    "afp fact check",
    "reuters fact check",
    "ap fact check",
    "lead stories",
    "poynter",
    "washington post fact checker",
];

/// Compute the reliability score of a source.
///
/// Starts from the reliability level's base score and applies multiplicative
/// adjustments for verification status and flags, then clamps to `[0.0, 1.0]`.
/// Depends on nothing but the source's own state.
pub fn reliability_score(source: &Source) -> f64 {
    let mut score = source.reliability_level.base_score();

    match source.verification_status {
        SourceVerification::Verified => score *= 1.1,
        SourceVerification::Unverified => score *= 0.5,
        SourceVerification::Pending => {}
    }

    let flags = &source.flags;
    if flags.is_government {
        score *= 1.2;
    }
    if flags.is_fact_checker {
        score *= 1.3;
        if is_known_fact_checker(&source.name) {
            score *= 1.1;
        }
    }
    if flags.is_academic {
        score *= 1.1;
    }
    if flags.is_news && flags.is_reference {
        score *= 1.15;
    }

    score.clamp(0.0, 1.0)
}

/// Whether a source name belongs to a well-known fact-checking brand.
pub fn is_known_fact_checker(name: &str) -> bool {
    let lower = name.to_lowercase();
    KNOWN_FACT_CHECKERS.iter().any(|brand| lower.contains(brand))
}

/// Registry of known evidence sources.
pub struct SourceRegistry {
    sources: RwLock<HashMap<String, Arc<Source>>>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry pre-populated with the given descriptors.
    pub fn with_sources(descriptors: &[SourceDescriptor]) -> Self {
        let registry = Self::new();
        for descriptor in descriptors {
            registry.register_or_get(descriptor);
        }
        registry
    }

    /// Return the registered source with this descriptor's id, registering it first if unseen.
    ///
    /// An already-registered source is returned unchanged; descriptors never
    /// overwrite existing state.
    pub fn register_or_get(&self, descriptor: &SourceDescriptor) -> Arc<Source> {
        if let Some(existing) = self.get(&descriptor.id) {
            return existing;
        }

        let mut sources = self.sources.write().unwrap_or_else(|e| e.into_inner());
        // Another writer may have registered it between the read and write lock.
        if let Some(existing) = sources.get(&descriptor.id) {
            return Arc::clone(existing);
        }
        let source = Arc::new(Source::from_descriptor(descriptor, Utc::now()));
        debug!(
            source_id = descriptor.id.as_str(),
            source_type = %descriptor.source_type,
            "Registered new source"
        );
        sources.insert(descriptor.id.clone(), Arc::clone(&source));
        source
    }

    /// Register the source an evidence item arrived with, returning the canonical handle.
    pub fn canonicalize(&self, source: &Arc<Source>) -> Arc<Source> {
        if let Some(existing) = self.get(&source.id) {
            return existing;
        }
        let mut sources = self.sources.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            sources
                .entry(source.id.clone())
                .or_insert_with(|| Arc::clone(source)),
        )
    }

    /// Look up a source by id.
    pub fn get(&self, id: &str) -> Option<Arc<Source>> {
        let sources = self.sources.read().unwrap_or_else(|e| e.into_inner());
        sources.get(id).cloned()
    }

    /// Reliability score of a registered source (or any source snapshot).
    pub fn reliability_score(&self, source: &Source) -> f64 {
        reliability_score(source)
    }

    /// Record the outcome of a periodic re-verification.
    ///
    /// Replaces the registry's handle; evidence already holding the previous
    /// snapshot is unaffected. Returns `false` for unknown ids.
    pub fn update_verification(
        &self,
        id: &str,
        level: ReliabilityLevel,
        status: SourceVerification,
        at: DateTime<Utc>,
    ) -> bool {
        let mut sources = self.sources.write().unwrap_or_else(|e| e.into_inner());
        let Some(current) = sources.get(id) else {
            return false;
        };
        let mut updated = Source::clone(current);
        updated.reliability_level = level;
        updated.verification_status = status;
        updated.last_verified_at = at;
        info!(
            source_id = id,
            score = reliability_score(&updated),
            "Source re-verified"
        );
        sources.insert(id.to_string(), Arc::new(updated));
        true
    }

    /// All registered sources, sorted by id.
    pub fn sources(&self) -> Vec<Arc<Source>> {
        let sources = self.sources.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<Arc<Source>> = sources.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Average reliability across all registered sources.
    pub fn average_reliability(&self) -> f64 {
        let all = self.sources();
        if all.is_empty() {
            return 0.0;
        }
        all.iter().map(|s| reliability_score(s)).sum::<f64>() / all.len() as f64
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceFlags, SourceType};

    fn make_source(level: ReliabilityLevel, status: SourceVerification, flags: SourceFlags) -> Source {
        Source::from_descriptor(
            &SourceDescriptor::new("s", "Some Outlet", SourceType::News, level)
                .with_status(status)
                .with_flags(flags),
            Utc::now(),
        )
    }

    #[test]
    fn test_base_score_without_adjustments() {
        let s = make_source(
            ReliabilityLevel::Moderate,
            SourceVerification::Pending,
            SourceFlags::default(),
        );
        assert!((reliability_score(&s) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_unverified_status_halves() {
        let s = make_source(
            ReliabilityLevel::Established,
            SourceVerification::Unverified,
            SourceFlags::default(),
        );
        assert!((reliability_score(&s) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_clamped() {
        let s = make_source(
            ReliabilityLevel::Primary,
            SourceVerification::Verified,
            SourceFlags {
                is_government: true,
                ..Default::default()
            },
        );
        assert_eq!(reliability_score(&s), 1.0);
    }

    #[test]
    fn test_adjustments_compound() {
        // 0.6 * 1.3 (fact checker) * 1.1 (academic) = 0.858
        let s = make_source(
            ReliabilityLevel::Corroborated,
            SourceVerification::Pending,
            SourceFlags {
                is_fact_checker: true,
                is_academic: true,
                ..Default::default()
            },
        );
        assert!((reliability_score(&s) - 0.858).abs() < 1e-9);
    }

    #[test]
    fn test_known_fact_checker_bonus() {
        let flags = SourceFlags {
            is_fact_checker: true,
            ..Default::default()
        };
        let generic = Source::from_descriptor(
            &SourceDescriptor::new("fc", "Local Checkers", SourceType::Other, ReliabilityLevel::Corroborated)
                .with_flags(flags),
            Utc::now(),
        );
        let snopes = Source::from_descriptor(
            &SourceDescriptor::new("snopes", "Snopes", SourceType::Other, ReliabilityLevel::Corroborated)
                .with_flags(flags),
            Utc::now(),
        );
        assert!(reliability_score(&snopes) > reliability_score(&generic));
        assert!((reliability_score(&generic) - 0.78).abs() < 1e-9);
    }

    #[test]
    fn test_news_and_reference_combination() {
        let s = make_source(
            ReliabilityLevel::Corroborated,
            SourceVerification::Pending,
            SourceFlags {
                is_news: true,
                is_reference: true,
                ..Default::default()
            },
        );
        assert!((reliability_score(&s) - 0.69).abs() < 1e-9);
    }

    #[test]
    fn test_register_or_get_is_stable() {
        let registry = SourceRegistry::new();
        let d = SourceDescriptor::new("bbc", "BBC News", SourceType::News, ReliabilityLevel::Verified);
        let first = registry.register_or_get(&d);

        let changed = SourceDescriptor::new("bbc", "Renamed", SourceType::Other, ReliabilityLevel::Unverified);
        let second = registry.register_or_get(&changed);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.name, "BBC News");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_update_verification_replaces_snapshot() {
        let registry = SourceRegistry::new();
        let d = SourceDescriptor::new("blog", "A Blog", SourceType::Other, ReliabilityLevel::Moderate);
        let before = registry.register_or_get(&d);

        assert!(registry.update_verification(
            "blog",
            ReliabilityLevel::Unverified,
            SourceVerification::Unverified,
            Utc::now(),
        ));
        let after = registry.get("blog").unwrap();

        assert_eq!(before.reliability_level, ReliabilityLevel::Moderate);
        assert_eq!(after.reliability_level, ReliabilityLevel::Unverified);
        assert!(registry.reliability_score(&after) < registry.reliability_score(&before));
        assert!(!registry.update_verification(
            "missing",
            ReliabilityLevel::Primary,
            SourceVerification::Verified,
            Utc::now(),
        ));
    }

    #[test]
    fn test_canonicalize_registers_unknown_source() {
        let registry = SourceRegistry::new();
        let snapshot = Arc::new(Source::from_descriptor(
            &SourceDescriptor::new("nyt", "New York Times", SourceType::News, ReliabilityLevel::Verified),
            Utc::now(),
        ));
        let canonical = registry.canonicalize(&snapshot);
        assert!(Arc::ptr_eq(&canonical, &snapshot));
        assert!(registry.get("nyt").is_some());
    }

    #[test]
    fn test_average_reliability() {
        let registry = SourceRegistry::with_sources(&[
            SourceDescriptor::new("a", "A", SourceType::Other, ReliabilityLevel::Established),
            SourceDescriptor::new("b", "B", SourceType::Other, ReliabilityLevel::Corroborated),
        ]);
        assert!((registry.average_reliability() - 0.7).abs() < 1e-9);
    }
}
