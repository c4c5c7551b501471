//! # Verity Core
//!
//! Claim verification decision engine.
//! Provides the source registry, claim classifier, evidence provider fan-out,
//! evidence aggregation, the tiered verification engine with its AI judge
//! ensemble, explanation rendering, and configuration.

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod explanation;
pub mod judges;
pub mod providers;
pub mod registry;
pub mod service;
pub mod types;

// Re-export commonly used types at the crate root.
pub use aggregator::{AggregatedEvidence, EvidenceAggregator, contradiction_ratio};
pub use classifier::ClaimClassifier;
pub use config::{VerityConfig, load_config};
pub use engine::{VerificationEngine, VerificationStrategy};
pub use error::{Result, VerityError};
pub use explanation::ExplanationGenerator;
pub use judges::{Judge, JudgeEnsemble, JudgeVerdict};
pub use providers::{EvidenceProvider, ProviderSet};
pub use registry::SourceRegistry;
pub use service::VerificationService;
pub use types::{
    ClaimProfile, Evidence, EvidenceFlags, EvidenceKind, ReliabilityLevel, Source,
    SourceDescriptor, SourceFlags, SourceType, Tier, VerificationResult, Verdict,
};
