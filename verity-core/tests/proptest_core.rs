//! Property-based tests for core components using proptest.

use proptest::prelude::*;

use chrono::Utc;
use std::sync::Arc;
use verity_core::aggregator::contradiction_ratio;
use verity_core::classifier::{ClaimClassifier, key_terms};
use verity_core::registry::reliability_score;
use verity_core::types::{
    Evidence, EvidenceFlags, ReliabilityLevel, Source, SourceDescriptor, SourceFlags, SourceType,
    SourceVerification,
};

fn level_strategy() -> impl Strategy<Value = ReliabilityLevel> {
    prop_oneof![
        Just(ReliabilityLevel::Primary),
        Just(ReliabilityLevel::Verified),
        Just(ReliabilityLevel::Established),
        Just(ReliabilityLevel::Moderate),
        Just(ReliabilityLevel::Corroborated),
        Just(ReliabilityLevel::Unverified),
    ]
}

fn status_strategy() -> impl Strategy<Value = SourceVerification> {
    prop_oneof![
        Just(SourceVerification::Verified),
        Just(SourceVerification::Unverified),
        Just(SourceVerification::Pending),
    ]
}

fn flags_strategy() -> impl Strategy<Value = SourceFlags> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>())
        .prop_map(|(g, a, f, n, r, ai)| SourceFlags {
            is_government: g,
            is_academic: a,
            is_fact_checker: f,
            is_news: n,
            is_reference: r,
            is_ai: ai,
        })
}

fn make_source(
    name: &str,
    level: ReliabilityLevel,
    status: SourceVerification,
    flags: SourceFlags,
) -> Source {
    Source::from_descriptor(
        &SourceDescriptor::new("s", name, SourceType::Other, level)
            .with_status(status)
            .with_flags(flags),
        Utc::now(),
    )
}

// --- Reliability score properties ---

proptest! {
    #[test]
    fn reliability_is_within_unit_interval(
        level in level_strategy(),
        status in status_strategy(),
        flags in flags_strategy(),
        name in "[A-Za-z ]{0,20}",
    ) {
        let score = reliability_score(&make_source(&name, level, status, flags));
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn government_flag_never_lowers_reliability(
        level in level_strategy(),
        status in status_strategy(),
        flags in flags_strategy(),
    ) {
        let without = SourceFlags { is_government: false, ..flags };
        let with = SourceFlags { is_government: true, ..flags };
        let base = reliability_score(&make_source("Outlet", level, status, without));
        let boosted = reliability_score(&make_source("Outlet", level, status, with));
        prop_assert!(boosted >= base);
    }
}

// --- Contradiction ratio properties ---

proptest! {
    #[test]
    fn contradiction_ratio_bounds(flags in prop::collection::vec(any::<bool>(), 0..20)) {
        let source = Arc::new(make_source(
            "Outlet",
            ReliabilityLevel::Verified,
            SourceVerification::Pending,
            SourceFlags::default(),
        ));
        let evidence: Vec<Evidence> = flags
            .iter()
            .enumerate()
            .map(|(i, c)| {
                Evidence::new(format!("item {}", i), Arc::clone(&source)).with_flags(EvidenceFlags {
                    is_contradictory: *c,
                    ..Default::default()
                })
            })
            .collect();
        let ratio = contradiction_ratio(&evidence);
        prop_assert!((0.0..=1.0).contains(&ratio));
        if flags.iter().all(|c| !c) {
            prop_assert_eq!(ratio, 0.0);
        }
        if !flags.is_empty() && flags.iter().all(|c| *c) {
            prop_assert_eq!(ratio, 1.0);
        }
    }
}

// --- Classifier properties ---

proptest! {
    #[test]
    fn classifier_is_total_and_preserves_text(text in "\\PC{0,200}") {
        let profile = ClaimClassifier::new().classify(&text);
        prop_assert_eq!(profile.raw_text, text);
    }

    #[test]
    fn key_terms_are_lowercase_unique_and_long(text in "[A-Za-z ,.?]{0,120}") {
        let terms = key_terms(&text);
        let mut seen = std::collections::HashSet::new();
        for term in &terms {
            prop_assert!(term.chars().count() > 2);
            prop_assert_eq!(term.to_lowercase(), term.clone());
            prop_assert!(seen.insert(term.clone()));
        }
    }
}
