//! Configuration system for Verity.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from `~/.config/verity/config.toml` and/or `.verity/config.toml`
//! in the workspace directory.
//!
//! Every hand-tuned constant of the decision engine lives here with its documented
//! default, so deployments can retune cutoffs without touching the tier logic.

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for Verity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerityConfig {
    pub engine: EngineConfig,
    pub aggregator: AggregatorConfig,
    pub ensemble: EnsembleConfig,
    pub providers: ProvidersConfig,
    pub office_policy: OfficePolicy,
    pub judges: JudgesConfig,
}

impl VerityConfig {
    /// Reject combinations the engine cannot interpret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.min_evidence_count == 0 {
            return Err(ConfigError::Invalid {
                message: "engine.min_evidence_count must be at least 1".into(),
            });
        }
        let e = &self.ensemble;
        let weights = [e.primary_weight, e.entailment_weight, e.secondary_weight];
        if weights.iter().any(|w| *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigError::Invalid {
                message: "ensemble weights must be non-negative with a positive sum".into(),
            });
        }
        if e.false_cutoff > e.verified_cutoff {
            return Err(ConfigError::Invalid {
                message: format!(
                    "ensemble.false_cutoff ({}) exceeds ensemble.verified_cutoff ({})",
                    e.false_cutoff, e.verified_cutoff
                ),
            });
        }
        let a = &self.aggregator;
        if a.min_content_len > a.max_content_len {
            return Err(ConfigError::Invalid {
                message: "aggregator.min_content_len exceeds aggregator.max_content_len".into(),
            });
        }
        let unit = [
            ("engine.verified_threshold", self.engine.verified_threshold),
            ("engine.contradiction_threshold", self.engine.contradiction_threshold),
            ("engine.similarity_caveat_threshold", self.engine.similarity_caveat_threshold),
            ("aggregator.min_source_reliability", a.min_source_reliability),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    message: format!("{} must be within [0, 1], got {}", name, value),
                });
            }
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }
}

/// Cutoffs and fixed confidences used by the verification tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Evidence items required before any tier may run.
    pub min_evidence_count: usize,
    /// Generic-tier confidence needed for Verified.
    pub verified_threshold: f64,
    /// Contradiction ratio strictly above which the generic tier reports Disputed.
    pub contradiction_threshold: f64,
    /// Fact-check similarity below which explanations add a "related claim" caveat.
    pub similarity_caveat_threshold: f64,
    pub fact_check_confidence: f64,
    pub fact_check_disputed_confidence: f64,
    pub office_match_confidence: f64,
    pub office_mismatch_confidence: f64,
    pub current_event_confidence: f64,
    /// Registry score at or above which a source counts as high reliability.
    pub high_reliability_threshold: f64,
    pub wikipedia_verdict_boost: f64,
    pub boost_cap: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_evidence_count: 1,
            verified_threshold: 0.6,
            contradiction_threshold: 0.2,
            similarity_caveat_threshold: 0.8,
            fact_check_confidence: 0.95,
            fact_check_disputed_confidence: 0.7,
            office_match_confidence: 0.98,
            office_mismatch_confidence: 0.95,
            current_event_confidence: 0.95,
            high_reliability_threshold: 0.8,
            wikipedia_verdict_boost: 1.1,
            boost_cap: 0.95,
        }
    }
}

/// Filtering and scoring parameters for evidence aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub min_content_len: usize,
    pub max_content_len: usize,
    pub min_source_reliability: f64,
    pub max_source_age_days: i64,
    pub biographical_reference_boost: f64,
    pub wikipedia_boost: f64,
    pub primary_source_boost: f64,
    pub boost_cap: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            min_content_len: 20,
            max_content_len: 5000,
            min_source_reliability: 0.5,
            max_source_age_days: 30,
            biographical_reference_boost: 1.2,
            wikipedia_boost: 1.1,
            primary_source_boost: 1.1,
            boost_cap: 0.95,
        }
    }
}

/// Weights and cutoffs for the AI judge ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    pub primary_weight: f64,
    pub entailment_weight: f64,
    pub secondary_weight: f64,
    /// Weighted score strictly above which the ensemble reports Verified.
    pub verified_cutoff: f64,
    /// Weighted score strictly below which the ensemble reports False.
    pub false_cutoff: f64,
    pub judge_timeout_ms: u64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            primary_weight: 0.5,
            entailment_weight: 0.2,
            secondary_weight: 0.3,
            verified_cutoff: 0.7,
            false_cutoff: 0.3,
            judge_timeout_ms: 20_000,
        }
    }
}

/// Evidence provider fan-out settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub timeout_ms: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

/// Curated allow-list of political offices and countries checked by the
/// current-event tier. Extending the list is a policy decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficePolicy {
    pub offices: Vec<String>,
    /// Country names and their common aliases.
    pub countries: Vec<String>,
}

impl Default for OfficePolicy {
    fn default() -> Self {
        let offices = ["president", "prime minister", "chancellor", "premier"];
        let countries = [
            "united states",
            "usa",
            "u.s.",
            "us",
            "america",
            "united kingdom",
            "uk",
            "britain",
            "great britain",
            "germany",
            "france",
            "canada",
            "australia",
        ];
        Self {
            offices: offices.iter().map(|s| s.to_string()).collect(),
            countries: countries.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Optional AI judge endpoints. Absent judges are simply not consulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<LmJudgeConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<LmJudgeConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entailment: Option<EntailmentJudgeConfig>,
}

/// An OpenAI-compatible chat completions judge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmJudgeConfig {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl Default for LmJudgeConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.0,
            max_tokens: 400,
        }
    }
}

/// A hosted natural-language-inference classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntailmentJudgeConfig {
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl Default for EntailmentJudgeConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api-inference.huggingface.co/models/facebook/bart-large-mnli"
                .to_string(),
            api_key_env: Some("HF_API_TOKEN".to_string()),
        }
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `VERITY_`)
/// 3. Workspace-local config (`.verity/config.toml`)
/// 4. User config (`~/.config/verity/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&VerityConfig>,
) -> Result<VerityConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(VerityConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "verity", "verity") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".verity").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // VERITY_ENGINE__VERIFIED_THRESHOLD, VERITY_ENSEMBLE__JUDGE_TIMEOUT_MS, etc.
    figment = figment.merge(Env::prefixed("VERITY_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Check whether any Verity configuration file exists (user-level or workspace-level).
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "verity", "verity") {
        if config_dir.config_dir().join("config.toml").exists() {
            return true;
        }
    }

    if let Some(ws) = workspace {
        if ws.join(".verity").join("config.toml").exists() {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VerityConfig::default();
        assert_eq!(config.engine.verified_threshold, 0.6);
        assert_eq!(config.engine.contradiction_threshold, 0.2);
        assert_eq!(config.aggregator.max_content_len, 5000);
        assert_eq!(config.ensemble.primary_weight, 0.5);
        assert!(config.judges.primary.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_office_policy_is_curated() {
        let policy = OfficePolicy::default();
        assert!(policy.countries.iter().any(|c| c == "germany"));
        assert!(!policy.countries.iter().any(|c| c == "japan"));
        assert!(policy.offices.iter().any(|o| o == "prime minister"));
    }

    #[test]
    fn test_validate_rejects_zero_weights() {
        let mut config = VerityConfig::default();
        config.ensemble.primary_weight = 0.0;
        config.ensemble.entailment_weight = 0.0;
        config.ensemble.secondary_weight = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_cutoffs() {
        let mut config = VerityConfig::default();
        config.ensemble.false_cutoff = 0.8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_workspace_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_dir = dir.path().join(".verity");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(
            cfg_dir.join("config.toml"),
            "[engine]\nverified_threshold = 0.65\n\n[aggregator]\nmax_source_age_days = 7\n",
        )
        .unwrap();

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.engine.verified_threshold, 0.65);
        assert_eq!(config.aggregator.max_source_age_days, 7);
        // Untouched values keep their defaults.
        assert_eq!(config.engine.contradiction_threshold, 0.2);
        assert!(config_exists(Some(dir.path())));
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let config = VerityConfig::default();
        let rendered = config.to_toml_string().unwrap();
        let parsed: VerityConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
