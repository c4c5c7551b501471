//! Subcommand handlers.

use crate::{Commands, ConfigAction};
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use verity_core::config::{JudgesConfig, VerityConfig};
use verity_core::error::JudgeError;
use verity_core::judges::{EntailmentJudge, Judge, JudgeEnsemble, LmJudge};
use verity_core::providers::{EvidenceProvider, FileEvidenceProvider, ProviderSet};
use verity_core::types::{JudgeRole, VerificationResult};
use verity_core::{SourceRegistry, VerificationService};

pub(crate) async fn handle_command(command: Commands, workspace: &Path) -> anyhow::Result<()> {
    let config = verity_core::load_config(Some(workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    match command {
        Commands::Check {
            claim,
            evidence,
            json,
        } => check(&config, &claim, evidence.as_deref(), json).await,
        Commands::Classify { claim } => {
            let profile = verity_core::ClaimClassifier::new().classify(&claim);
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", config.to_toml_string()?);
                Ok(())
            }
            ConfigAction::Path => {
                if let Some(dirs) = directories::ProjectDirs::from("dev", "verity", "verity") {
                    println!("user:      {}", dirs.config_dir().join("config.toml").display());
                }
                println!(
                    "workspace: {}",
                    workspace.join(".verity").join("config.toml").display()
                );
                if !verity_core::config::config_exists(Some(workspace)) {
                    println!("(no configuration file found; using defaults)");
                }
                Ok(())
            }
        },
    }
}

async fn check(
    config: &VerityConfig,
    claim: &str,
    evidence: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let service = build_service(config, evidence)?;
    let result = service.verify_claim(claim).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

/// Wire the verification service around the evidence file, if any.
pub(crate) fn build_service(
    config: &VerityConfig,
    evidence: Option<&Path>,
) -> anyhow::Result<VerificationService> {
    let mut providers = ProviderSet::new(Duration::from_millis(config.providers.timeout_ms));
    if let Some(path) = evidence {
        let loaded = FileEvidenceProvider::load_grouped(path)
            .with_context(|| format!("Failed to load evidence from {}", path.display()))?;
        for provider in loaded {
            info!(
                provider = provider.name(),
                records = provider.record_count(),
                "Loaded evidence provider"
            );
            providers.push(Arc::new(provider));
        }
    } else {
        warn!("No evidence file given; the claim will be reported as Unverified");
    }

    let judges = build_ensemble(config);
    let registry = Arc::new(SourceRegistry::new());
    Ok(VerificationService::from_config(config, registry, providers, judges))
}

/// Build the judge ensemble from whichever judges are configured.
///
/// A remote judge whose API key is missing is skipped rather than failing the
/// whole run; the ensemble renormalizes over the judges that remain.
pub(crate) fn build_ensemble(config: &VerityConfig) -> JudgeEnsemble {
    let mut ensemble = JudgeEnsemble::new(config.ensemble.clone());
    let JudgesConfig {
        primary,
        secondary,
        entailment,
    } = &config.judges;

    for (lm, role) in [
        (primary, JudgeRole::PrimaryLm),
        (secondary, JudgeRole::SecondaryLm),
    ] {
        let Some(lm) = lm else { continue };
        match LmJudge::new(lm, role) {
            Ok(judge) => ensemble.push(Arc::new(judge)),
            Err(JudgeError::AuthFailed { judge }) => {
                warn!(role = %role, judge = %judge, "Skipping judge without credentials");
            }
            Err(e) => warn!(role = %role, error = %e, "Skipping judge"),
        }
    }
    if let Some(nli) = entailment {
        let judge = EntailmentJudge::new(nli);
        info!(judge = judge.name(), "Entailment judge enabled");
        ensemble.push(Arc::new(judge));
    }
    ensemble
}

fn print_result(result: &VerificationResult) {
    println!("Claim:      {}", result.claim);
    println!("Verdict:    {}", result.status);
    println!("Confidence: {:.0}%", result.confidence * 100.0);
    println!("Tier:       {}", result.metadata.tier);
    println!();
    println!("{}", result.explanation);

    if !result.evidence.is_empty() {
        println!();
        println!("Evidence ({}):", result.evidence.len());
        for item in &result.evidence {
            let marker = if item.is_contradictory() { "-" } else { "+" };
            let mut content: String = item.content.chars().take(100).collect();
            if item.content.chars().count() > 100 {
                content.push_str("...");
            }
            println!("  {} [{}] {}", marker, item.source.name, content);
        }
    }
    if !result.metadata.judge_scores.is_empty() {
        println!();
        println!("Judges:");
        for score in &result.metadata.judge_scores {
            println!("  {:<12} {:.2}", score.judge, score.score);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use verity_core::config::{EntailmentJudgeConfig, LmJudgeConfig};
    use verity_core::types::{Tier, Verdict};

    const EVIDENCE: &str = r#"[
        {
            "provider": "factcheck",
            "claims": ["moon is made of cheese"],
            "content": "Claim: the moon is made of cheese. Rating: FALSE",
            "source": {
                "id": "snopes",
                "name": "Snopes",
                "type": "other",
                "reliability_level": "verified",
                "flags": { "is_fact_checker": true }
            },
            "detail": { "kind": "fact_check", "rating": "FALSE", "publisher": "Snopes" }
        }
    ]"#;

    #[tokio::test]
    async fn test_check_uses_evidence_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EVIDENCE.as_bytes()).unwrap();

        let service = build_service(&VerityConfig::default(), Some(file.path())).unwrap();
        let result = service.verify_claim("The moon is made of cheese").await;
        assert_eq!(result.status, Verdict::False);
        assert_eq!(result.metadata.tier, Tier::FactCheck);
        assert_eq!(result.metadata.rating.as_deref(), Some("FALSE"));
    }

    #[tokio::test]
    async fn test_check_without_evidence_is_unverified() {
        let service = build_service(&VerityConfig::default(), None).unwrap();
        let result = service.verify_claim("The moon is made of cheese").await;
        assert_eq!(result.status, Verdict::Unverified);
        assert_eq!(result.metadata.tier, Tier::InsufficientEvidence);
    }

    #[test]
    fn test_unreadable_evidence_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(build_service(&VerityConfig::default(), Some(&missing)).is_err());
    }

    #[test]
    fn test_empty_judges_config_builds_empty_ensemble() {
        let ensemble = build_ensemble(&VerityConfig::default());
        assert!(ensemble.is_empty());
    }

    #[test]
    fn test_missing_key_skips_remote_judge() {
        let mut config = VerityConfig::default();
        config.judges.primary = Some(LmJudgeConfig {
            api_key_env: "VERITY_TEST_KEY_THAT_IS_NEVER_SET".into(),
            base_url: Some("https://api.example.com/v1".into()),
            ..Default::default()
        });
        config.judges.entailment = Some(EntailmentJudgeConfig {
            endpoint: "http://127.0.0.1:9/nli".into(),
            ..Default::default()
        });
        let ensemble = build_ensemble(&config);
        assert_eq!(ensemble.len(), 1);
    }

    #[test]
    fn test_local_judge_needs_no_key() {
        let mut config = VerityConfig::default();
        config.judges.primary = Some(LmJudgeConfig {
            api_key_env: "VERITY_TEST_KEY_THAT_IS_NEVER_SET".into(),
            base_url: Some("http://localhost:11434/v1".into()),
            ..Default::default()
        });
        assert_eq!(build_ensemble(&config).len(), 1);
    }
}
