//! Reference tier for current-event claims.
//!
//! Applies to claims with recency or position wording. Office claims ("is X
//! the president of Y") are checked by finding the named person together with
//! current-position language in a reference text; other current-event claims
//! need every key term to appear in one reference text.

use super::{TierVerdict, VerificationContext, VerificationStrategy, covers_all, term_match};
use crate::classifier::STOP_WORDS;
use crate::config::{EngineConfig, OfficePolicy};
use crate::error::VerityError;
use crate::types::{Evidence, Tier, Verdict};
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

/// Words that start with a capital letter in claims but are never part of a name.
const NAME_STOPWORDS: &[&str] = &[
    "is", "was", "the", "a", "an", "of", "who", "what", "does", "did", "has", "current",
    "currently", "still", "now", "today", "former", "new", "mr", "mrs", "ms", "dr",
];

fn build(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(pattern)
}

/// Alternation of escaped phrases, longest first so "prime minister" beats "minister".
fn alternation(phrases: &[String]) -> String {
    let mut sorted: Vec<&String> = phrases.iter().filter(|p| !p.trim().is_empty()).collect();
    sorted.sort_by_key(|p| std::cmp::Reverse(p.len()));
    sorted
        .iter()
        .map(|p| regex::escape(&p.trim().to_lowercase()))
        .collect::<Vec<_>>()
        .join("|")
}

pub struct CurrentEventStrategy {
    config: EngineConfig,
    /// Recency or position wording that makes a claim about the present.
    position_wording: Regex,
    office: Option<Regex>,
    country: Option<Regex>,
    /// "is <Name> the <office>"
    name_question: Option<Regex>,
    /// "<Name> is the <office>"
    name_statement: Option<Regex>,
    /// Reference wording that places someone in office now.
    current_position: Vec<Regex>,
}

impl CurrentEventStrategy {
    pub fn new(config: EngineConfig, policy: &OfficePolicy) -> Self {
        let offices = alternation(&policy.offices);
        let countries = alternation(&policy.countries);
        let office_set = !offices.is_empty();

        let office = office_set
            .then(|| build(&format!(r"(?i)\b(?:{})\b", offices)).ok())
            .flatten();
        // Country aliases may contain dots ("u.s."), so bound them on non-letters.
        let country = (!countries.is_empty())
            .then(|| build(&format!(r"(?i)(?:^|[^a-z])(?:{})(?:$|[^a-z])", countries)).ok())
            .flatten();
        let name_question = office_set
            .then(|| {
                build(&format!(
                    r"(?i)^\s*(?:is|was)\s+(.+?)\s+(?:still\s+|currently\s+)?(?:the\s+)?(?:current\s+|sitting\s+)?(?:{})\b",
                    offices
                ))
                .ok()
            })
            .flatten();
        let name_statement = office_set
            .then(|| {
                build(&format!(
                    r"(?i)^\s*(.+?)\s+(?:is|was)\s+(?:still\s+|currently\s+)?(?:the\s+)?(?:current\s+|sitting\s+)?(?:{})\b",
                    offices
                ))
                .ok()
            })
            .flatten();

        let office_words = if office_set { offices.clone() } else { "president".to_string() };
        let current_position = [
            format!(r"(?i)\bcurrent(?:ly)?\b.{{0,60}}\b(?:{})\b", office_words),
            format!(r"(?i)\b\d+(?:st|nd|rd|th)\b.{{0,30}}\b(?:{})\b", office_words),
            r"(?i)\binaugurated\b.{0,60}\b\d{4}\b".to_string(),
            r"(?i)\b(?:sworn in|took office|assumed office)\b.{0,60}\b\d{4}\b".to_string(),
            r"(?i)\bincumbent\b".to_string(),
        ]
        .iter()
        .filter_map(|p| build(p).ok())
        .collect();

        let position_wording = Regex::new(
            r"(?i)\b(president|prime minister|chancellor|premier|minister|governor|mayor|ceo|chairman|leader|head of state|champion|incumbent|current|currently|now|today|latest|still)\b",
        )
        .expect("position pattern is static and valid");

        Self {
            config,
            position_wording,
            office,
            country,
            name_question,
            name_statement,
            current_position,
        }
    }

    /// Whether the claim talks about the present state of affairs. Dated claims
    /// only qualify through the classifier's present-tense year check.
    pub fn is_current_event(&self, claim: &str, is_temporal: bool) -> bool {
        is_temporal || self.position_wording.is_match(claim)
    }

    /// Office keyword plus an allow-listed country.
    pub fn is_office_claim(&self, claim: &str) -> bool {
        match (&self.office, &self.country) {
            (Some(office), Some(country)) => office.is_match(claim) && country.is_match(claim),
            _ => false,
        }
    }

    /// Lowercase name tokens of the person the claim is about. Office and
    /// country words are never part of the name.
    pub fn extract_name(&self, claim: &str) -> Vec<String> {
        for pattern in [&self.name_question, &self.name_statement].into_iter().flatten() {
            if let Some(name) = pattern.captures(claim).and_then(|c| c.get(1)) {
                let tokens = self.without_office_words(name_tokens(name.as_str(), false));
                if !tokens.is_empty() {
                    return tokens;
                }
            }
        }
        let mut tokens = self.without_office_words(name_tokens(claim, true));
        tokens.truncate(2);
        tokens
    }

    fn without_office_words(&self, tokens: Vec<String>) -> Vec<String> {
        tokens.into_iter().filter(|t| !self.is_office_word(t)).collect()
    }

    fn is_office_word(&self, word: &str) -> bool {
        self.office.as_ref().is_some_and(|o| o.is_match(word))
            || self.country.as_ref().is_some_and(|c| c.is_match(word))
    }

    fn confirms_office(&self, name: &[String], text_lower: &str) -> bool {
        if !covers_all(name, text_lower) {
            return false;
        }
        self.current_position.iter().any(|p| p.is_match(text_lower))
            || self.office.as_ref().is_some_and(|o| o.is_match(text_lower))
    }

    fn verify_office(&self, claim: &str, references: &[&Evidence]) -> Option<TierVerdict> {
        let name = self.extract_name(claim);
        if name.is_empty() {
            debug!("Office claim without a recognisable name");
            return None;
        }

        let scores: Vec<f64> = references
            .iter()
            .map(|e| {
                if self.confirms_office(&name, &e.content.to_lowercase()) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        let matched = scores.iter().position(|s| *s > 0.0);
        debug!(name = ?name, matched = matched.is_some(), "Office claim checked");

        Some(match matched {
            Some(i) => TierVerdict::new(
                Tier::CurrentEvent,
                Verdict::Verified,
                self.config.office_match_confidence,
            )
            .with_scores(scores)
            .with_decisive(references[i]),
            None => TierVerdict::new(
                Tier::CurrentEvent,
                Verdict::False,
                self.config.office_mismatch_confidence,
            )
            .with_scores(scores)
            .with_decisive(references[0]),
        })
    }

    fn verify_terms(&self, terms: &[String], references: &[&Evidence]) -> Option<TierVerdict> {
        if terms.is_empty() {
            return None;
        }
        let lowered: Vec<String> = references.iter().map(|e| e.content.to_lowercase()).collect();
        let scores: Vec<f64> = lowered.iter().map(|t| term_match(terms, t)).collect();
        let covering = lowered.iter().position(|t| covers_all(terms, t));
        let (status, decisive) = match covering {
            Some(i) => (Verdict::Verified, references[i]),
            None => (Verdict::False, references[0]),
        };
        Some(
            TierVerdict::new(Tier::CurrentEvent, status, self.config.current_event_confidence)
                .with_scores(scores)
                .with_decisive(decisive),
        )
    }
}

/// Capitalised, non-stopword tokens of `text`, lowercased. With `require_capital`
/// unset every token of the span counts.
fn name_tokens(text: &str, require_capital: bool) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .filter(|w| !require_capital || w.chars().next().is_some_and(|c| c.is_uppercase()))
        .map(|w| w.to_lowercase())
        .filter(|w| !NAME_STOPWORDS.contains(&w.as_str()) && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

#[async_trait]
impl VerificationStrategy for CurrentEventStrategy {
    fn tier(&self) -> Tier {
        Tier::CurrentEvent
    }

    async fn try_verify(
        &self,
        ctx: &VerificationContext<'_>,
    ) -> Result<Option<TierVerdict>, VerityError> {
        if !self.is_current_event(ctx.claim, ctx.profile.is_temporal) {
            return Ok(None);
        }
        let references: Vec<&Evidence> = ctx
            .evidence()
            .iter()
            .filter(|e| e.source.is_reference())
            .collect();
        if references.is_empty() {
            return Ok(None);
        }

        if self.is_office_claim(ctx.claim)
            && let Some(verdict) = self.verify_office(ctx.claim, &references)
        {
            return Ok(Some(verdict));
        }
        Ok(self.verify_terms(&ctx.key_terms, &references))
    }
}
