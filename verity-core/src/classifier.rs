//! Rule-based claim classification.
//!
//! Labels a claim's type (temporal, factual, predictive, biographical,
//! historical) and its topic categories from keyword and pattern sets. The
//! resulting `ClaimProfile` gates which verification tier applies.

use crate::types::ClaimProfile;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

/// Words ignored when extracting key terms from a claim.
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "shall", "should", "may", "might", "must", "can",
    "could", "of", "in", "to", "for", "with", "on", "at", "from", "by", "about", "as", "into",
    "through", "during", "before", "after", "above", "below", "between", "this", "that",
    "these", "those", "it", "its", "and", "but", "or", "not", "than", "then", "there",
    "their", "they", "them", "his", "her", "him", "she", "you", "your", "our", "who", "what",
    "which", "when", "where", "why", "how", "also", "only", "very", "just", "all", "any",
    "some", "such", "current", "currently", "now", "today", "still", "latest", "true",
    "false", "really", "indeed",
];

/// Lowercase content words of a claim (length > 2, stopwords removed), in first-seen order.
pub fn key_terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        .filter(|w| seen.insert(w.to_string()))
        .map(String::from)
        .collect()
}

/// Count of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("classifier patterns are static and valid")
}

/// Topic category rules: a pattern and the categories it implies.
struct CategoryRule {
    pattern: Regex,
    categories: &'static [&'static str],
}

/// Classifies claims into a `ClaimProfile`.
pub struct ClaimClassifier {
    temporal: Regex,
    factual: Regex,
    predictive: Regex,
    biographical_guard: Regex,
    biographical: Regex,
    historical: Regex,
    category_rules: Vec<CategoryRule>,
}

impl ClaimClassifier {
    pub fn new() -> Self {
        let category_rules = vec![
            CategoryRule {
                pattern: pattern(
                    r"(?i)\b(president|prime minister|senator|congress|parliament|election|government|minister|governor|mayor|chancellor|politician)s?\b",
                ),
                categories: &["politics", "government"],
            },
            CategoryRule {
                pattern: pattern(r"(?i)\b(actor|actress|movie|film|starred|hollywood|oscar)s?\b"),
                categories: &["entertainment", "film"],
            },
            CategoryRule {
                pattern: pattern(r"(?i)\b(singer|album|song|band|musician|rapper|grammy)s?\b"),
                categories: &["entertainment", "music"],
            },
            CategoryRule {
                pattern: pattern(
                    r"(?i)\b(study|studies|research|researchers|scientists|university|journal|peer-reviewed)\b",
                ),
                categories: &["research", "academic"],
            },
            CategoryRule {
                pattern: pattern(
                    r"(?i)\b(physics|chemistry|biology|planet|earth|asteroid|climate|species|space|nasa)\b",
                ),
                categories: &["science"],
            },
            CategoryRule {
                pattern: pattern(
                    r"(?i)\b(vaccines?|disease|virus|covid(-19)?|cancer|health|medicine|drugs?|hospital)\b",
                ),
                categories: &["health"],
            },
            CategoryRule {
                pattern: pattern(
                    r"(?i)\b(economy|inflation|gdp|stocks?|market|unemployment|tax(es)?|recession)\b",
                ),
                categories: &["economy"],
            },
            CategoryRule {
                pattern: pattern(
                    r"(?i)\b(football|soccer|nba|nfl|olympics?|championship|world cup|tennis|cricket)\b",
                ),
                categories: &["sports"],
            },
            CategoryRule {
                pattern: pattern(
                    r"(?i)\b(software|ai|artificial intelligence|computers?|internet|smartphones?|technology)\b",
                ),
                categories: &["technology"],
            },
        ];

        Self {
            // A year alone dates a past event; it only counts alongside present-tense wording.
            temporal: pattern(
                r"(?i)\b(current|currently|now|today|yesterday|tomorrow|presently|nowadays|latest|recent|recently|incumbent|sitting|ongoing|as of|this (year|month|week)|last (year|month|week))\b|\b(is|are|remains?|serves?|holds?|has been|have been)\b[^.?!]{0,60}\b(1[5-9]|20)\d{2}\b",
            ),
            factual: pattern(
                r"(?i)\b(is|are|was|were|has|have|had|contains?|consists? of|includes?|comprises?|equals?|measures?)\b",
            ),
            predictive: pattern(
                r"(?i)\b(will|shall|going to|gonna|predicts?|predicted|forecasts?|expected to|projected to|in the future|someday|next (year|decade|century)|by (the year )?2[01]\d{2})\b",
            ),
            biographical_guard: pattern(
                r"(?i)\b(born|birth|died|career|starred in|appeared in|played in|(actor|actress|singer|author|writer|athlete|politician|director) (who|known))\b|\b(1[89]|20)\d{2}\s*(-|–|to)\s*((1[89]|20)\d{2}|present)\b",
            ),
            biographical: pattern(
                r"(?i)\b(born|birth(day|date|place)?|died|death|years old|grew up|married|biography|childhood|starred in|appeared in|actor|actress|singer|songwriter|musician|rapper|author|novelist|poet|painter|athlete|footballer|physicist|chemist|inventor|entrepreneur|businessman|businesswoman|politician|composer|comedian|journalist)\b",
            ),
            historical: pattern(
                r"(?i)\b(centur(y|ies)|ancient|medieval|empire|dynasty|kingdom|monarchy|monarch|reign(ed)?|wars?|battle|revolution|colonial|renaissance|victorian|ottoman|roman|byzantine|pharaoh|bc|bce|treaty|historic(al|ally)?|history)\b",
            ),
            category_rules,
        }
    }

    /// Classify a claim. Total: any input, including the empty string, yields a profile.
    pub fn classify(&self, text: &str) -> ClaimProfile {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return ClaimProfile {
                raw_text: text.to_string(),
                ..Default::default()
            };
        }

        let is_biographical = self.biographical.is_match(trimmed);
        // A biography mentioning "will" or a career span is not a prediction.
        let is_predictive =
            self.predictive.is_match(trimmed) && !self.biographical_guard.is_match(trimmed);
        let is_historical = self.historical.is_match(trimmed);

        let mut categories = BTreeSet::new();
        for rule in &self.category_rules {
            if rule.pattern.is_match(trimmed) {
                categories.extend(rule.categories.iter().map(|c| c.to_string()));
            }
        }
        if is_biographical {
            categories.insert("biography".to_string());
            categories.insert("person".to_string());
        }
        if is_historical {
            categories.insert("history".to_string());
        }

        ClaimProfile {
            raw_text: text.to_string(),
            is_temporal: self.temporal.is_match(trimmed),
            is_factual: self.factual.is_match(trimmed),
            is_predictive,
            is_biographical,
            is_historical,
            categories,
        }
    }
}

impl Default for ClaimClassifier {
    fn default() -> Self {
        Self::new()
    }
}
