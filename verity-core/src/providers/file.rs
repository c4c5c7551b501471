//! JSON-file evidence provider.
//!
//! Serves pre-fetched evidence records from a local file so the engine can run
//! offline against captured provider output. Records are grouped by their
//! `provider` field; each group becomes one provider in the fan-out.

use super::EvidenceProvider;
use crate::error::ProviderError;
use crate::types::{Evidence, EvidenceFlags, EvidenceKind, Source, SourceDescriptor};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// One evidence item as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// Provider group name; records without one go to "file".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Claims this record answers (case-insensitive); empty means every claim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<String>,
    pub content: String,
    pub source: SourceDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub flags: EvidenceFlags,
    #[serde(default)]
    pub detail: EvidenceKind,
}

impl EvidenceRecord {
    fn applies_to(&self, claim: &str) -> bool {
        if self.claims.is_empty() {
            return true;
        }
        let wanted = claim.trim().to_lowercase();
        self.claims.iter().any(|c| c.trim().to_lowercase() == wanted)
    }

    fn to_evidence(&self, now: DateTime<Utc>) -> Evidence {
        let source = Arc::new(Source::from_descriptor(&self.source, now));
        let mut evidence = Evidence::new(self.content.clone(), source)
            .with_flags(self.flags)
            .with_kind(self.detail.clone())
            .with_categories(self.categories.clone())
            .with_confidence(self.confidence.unwrap_or(1.0));
        if let Some(url) = &self.url {
            evidence = evidence.with_url(url.clone());
        }
        if let Some(ts) = self.timestamp {
            evidence.timestamp = ts;
        }
        evidence
    }
}

/// Provider backed by records loaded from a JSON file.
pub struct FileEvidenceProvider {
    name: String,
    records: Vec<EvidenceRecord>,
}

impl FileEvidenceProvider {
    pub fn new(name: impl Into<String>, records: Vec<EvidenceRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Parse a JSON array of records, one provider per `provider` group.
    pub fn parse_grouped(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        let records: Vec<EvidenceRecord> = serde_json::from_str(json)?;
        let mut groups: BTreeMap<String, Vec<EvidenceRecord>> = BTreeMap::new();
        for record in records {
            let name = record.provider.clone().unwrap_or_else(|| "file".to_string());
            groups.entry(name).or_default().push(record);
        }
        Ok(groups
            .into_iter()
            .map(|(name, records)| Self::new(name, records))
            .collect())
    }

    /// Load and group records from a JSON file.
    pub fn load_grouped(path: &Path) -> anyhow::Result<Vec<Self>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        Ok(Self::parse_grouped(&content)?)
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl EvidenceProvider for FileEvidenceProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn provide(&self, claim: &str) -> Result<Vec<Evidence>, ProviderError> {
        let now = Utc::now();
        Ok(self
            .records
            .iter()
            .filter(|r| r.applies_to(claim))
            .map(|r| r.to_evidence(now))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceType;
    use std::io::Write;

    const RECORDS: &str = r#"[
        {
            "provider": "factcheck",
            "claims": ["The moon is made of cheese"],
            "content": "Claim: the moon is made of cheese. Rating: FALSE",
            "source": {
                "id": "snopes",
                "name": "Snopes",
                "type": "other",
                "reliability_level": "verified",
                "flags": { "is_fact_checker": true }
            },
            "flags": { "is_contradictory": true, "similarity_score": 0.9 },
            "detail": { "kind": "fact_check", "rating": "FALSE", "publisher": "Snopes" }
        },
        {
            "provider": "reference",
            "content": "The Moon is Earth's only natural satellite.",
            "source": {
                "id": "wikipedia",
                "name": "Wikipedia",
                "type": "reference",
                "reliability_level": "established"
            }
        }
    ]"#;

    #[tokio::test]
    async fn test_parse_grouped_and_filter_by_claim() {
        let providers = FileEvidenceProvider::parse_grouped(RECORDS).unwrap();
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0].name(), "factcheck");
        assert_eq!(providers[1].name(), "reference");

        let matched = providers[0].provide("the moon is made of cheese").await.unwrap();
        assert_eq!(matched.len(), 1);
        assert!(matched[0].source.flags.is_fact_checker);
        assert!(matched[0].flags.is_contradictory);
        assert!(matches!(
            matched[0].kind,
            EvidenceKind::FactCheck { ref rating, .. } if rating.as_deref() == Some("FALSE")
        ));

        let other = providers[0].provide("Something else").await.unwrap();
        assert!(other.is_empty());

        let reference = providers[1].provide("anything").await.unwrap();
        assert_eq!(reference[0].source.source_type, SourceType::Reference);
        assert_eq!(reference[0].kind, EvidenceKind::Generic);
    }

    #[test]
    fn test_load_grouped_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RECORDS.as_bytes()).unwrap();
        let providers = FileEvidenceProvider::load_grouped(file.path()).unwrap();
        assert_eq!(providers.iter().map(|p| p.record_count()).sum::<usize>(), 2);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(FileEvidenceProvider::parse_grouped("{not json").is_err());
    }
}
