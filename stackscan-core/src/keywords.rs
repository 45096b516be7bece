// Keyword dictionary and whole-word matcher

use crate::normalize::normalize;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Dictionary shipped with the binary, also written out by `stackscan init`.
pub const DEFAULT_KEYWORDS: &str = include_str!("../keywords/default.json");

/// Canonical label -> number of distinct dictionary tokens that matched.
pub type KeywordHits = BTreeMap<String, usize>;

#[derive(Error, Debug)]
pub enum KeywordError {
    #[error("Failed to read keyword file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Keyword file is not a JSON object of token -> label: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Token for label '{0}' is empty after normalization")]
    EmptyToken(String),

    #[error("Token '{token}' maps to both '{first}' and '{second}'")]
    ConflictingToken {
        token: String,
        first: String,
        second: String,
    },

    #[error("Failed to compile pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Keyword dictionary is empty")]
    Empty,
}

#[derive(Debug, Clone)]
struct KeywordEntry {
    token: String,
    label: String,
    pattern: Regex,
}

/// Static mapping from surface tokens to canonical technology labels.
#[derive(Debug, Clone)]
pub struct KeywordDictionary {
    entries: Vec<KeywordEntry>,
}

impl KeywordDictionary {
    pub fn builtin() -> Result<Self, KeywordError> {
        Self::from_json(DEFAULT_KEYWORDS)
    }

    pub fn load(path: &Path) -> Result<Self, KeywordError> {
        let content = fs::read_to_string(path).map_err(|source| KeywordError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, KeywordError> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)?;
        Self::from_pairs(raw)
    }

    /// Build a dictionary from (token, label) pairs.
    ///
    /// Tokens go through the same normalizer as listing text, so `ci/cd`
    /// is stored as `ci cd`. Two tokens that normalize to the same string must
    /// agree on their label.
    pub fn from_pairs<I, T, L>(pairs: I) -> Result<Self, KeywordError>
    where
        I: IntoIterator<Item = (T, L)>,
        T: AsRef<str>,
        L: Into<String>,
    {
        let mut seen: BTreeMap<String, String> = BTreeMap::new();
        let mut entries = Vec::new();

        for (token, label) in pairs {
            let label = label.into();
            let token = canonical_token(token.as_ref());
            if token.is_empty() {
                return Err(KeywordError::EmptyToken(label));
            }

            if let Some(existing) = seen.get(&token) {
                if *existing != label {
                    return Err(KeywordError::ConflictingToken {
                        token,
                        first: existing.clone(),
                        second: label,
                    });
                }
                continue;
            }

            let pattern = word_pattern(&token)?;
            seen.insert(token.clone(), label.clone());
            entries.push(KeywordEntry {
                token,
                label,
                pattern,
            });
        }

        if entries.is_empty() {
            return Err(KeywordError::Empty);
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (token, label) pairs in dictionary order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.token.as_str(), e.label.as_str()))
    }

    pub fn labels(&self) -> BTreeSet<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    /// Tokens grouped under their label.
    pub fn grouped(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for entry in &self.entries {
            groups
                .entry(entry.label.as_str())
                .or_default()
                .push(entry.token.as_str());
        }
        groups
    }

    /// Count whole-word token matches in already normalized text.
    ///
    /// Each token contributes at most 1 to its label, so a label reached
    /// through two synonyms (`postgres`, `postgresql`) counts 2.
    pub fn count_keywords(&self, normalized: &str) -> KeywordHits {
        let mut hits = KeywordHits::new();
        for entry in &self.entries {
            if entry.pattern.is_match(normalized) {
                *hits.entry(entry.label.clone()).or_insert(0) += 1;
            }
        }
        hits
    }

    /// Normalize raw listing text and count matches.
    pub fn match_text(&self, text: &str) -> KeywordHits {
        self.count_keywords(&normalize(text))
    }
}

fn canonical_token(token: &str) -> String {
    normalize(token)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Token bounded by a non-word character or the text edge on both sides.
/// Interior spaces match any whitespace run.
fn word_pattern(token: &str) -> Result<Regex, regex::Error> {
    let body = token
        .split(' ')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    Regex::new(&format!(r"(?:^|\W){}(?:\W|$)", body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> KeywordDictionary {
        KeywordDictionary::builtin().unwrap()
    }

    fn hits(pairs: &[(&str, usize)]) -> KeywordHits {
        pairs.iter().map(|(l, c)| (l.to_string(), *c)).collect()
    }

    #[test]
    fn test_builtin_dictionary_loads() {
        let dict = dictionary();
        assert!(dict.len() > 60);
        assert!(dict.labels().contains("PostgreSQL"));
    }

    #[test]
    fn test_russian_posting() {
        let result = dictionary().match_text("Требуется Python разработчик, опыт Django, PostgreSQL");
        assert_eq!(
            result,
            hits(&[("Django", 1), ("PostgreSQL", 1), ("Python", 1)])
        );
    }

    #[test]
    fn test_synonyms_count_per_token() {
        let result = dictionary().match_text("postgres and postgresql experience required");
        assert_eq!(result, hits(&[("PostgreSQL", 2)]));
    }

    #[test]
    fn test_repeated_token_counts_once() {
        let result = dictionary().match_text("python python python");
        assert_eq!(result, hits(&[("Python", 1)]));
    }

    #[test]
    fn test_no_partial_word_match() {
        let result = dictionary().match_text("javascriptish gitlab pythonic");
        assert!(result.is_empty(), "unexpected hits: {:?}", result);
    }

    #[test]
    fn test_tokens_with_punctuation() {
        let result = dictionary().match_text("Знание C++ и C#");
        assert_eq!(result, hits(&[("C#", 1), ("C++", 1)]));
    }

    #[test]
    fn test_slash_tokens_match_after_normalization() {
        let result = dictionary().match_text("Настройка CI/CD");
        assert_eq!(result, hits(&[("CI/CD", 1)]));
    }

    #[test]
    fn test_multi_word_token_spans_punctuation() {
        let result = dictionary().match_text("Работа в команде; SQL Server");
        assert_eq!(
            result,
            hits(&[("MS SQL Server", 1), ("SQL", 1), ("Teamwork", 1)])
        );
    }

    #[test]
    fn test_cyrillic_and_latin_1c() {
        let cyrillic = dictionary().match_text("1С:Предприятие");
        let latin = dictionary().match_text("1C developer");
        assert_eq!(cyrillic, hits(&[("1С", 1)]));
        assert_eq!(latin, hits(&[("1С", 1)]));
    }

    #[test]
    fn test_empty_text() {
        assert!(dictionary().match_text("").is_empty());
        assert!(dictionary().match_text(" ").is_empty());
    }

    #[test]
    fn test_matching_is_idempotent() {
        let dict = dictionary();
        let text = normalize("Docker, Kubernetes (k8s), Grafana и немного Linux");
        assert_eq!(dict.count_keywords(&text), dict.count_keywords(&text));
    }

    #[test]
    fn test_hits_are_dictionary_labels() {
        let dict = dictionary();
        let labels = dict.labels();
        let result = dict.match_text("Python Django Docker SQL REST API English ООП");
        assert!(!result.is_empty());
        assert!(result.keys().all(|l| labels.contains(l.as_str())));
    }

    #[test]
    fn test_from_json_custom() {
        let dict = KeywordDictionary::from_json(r#"{"Rust": "Rust", "tokio": "Tokio"}"#).unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.match_text("RUST with Tokio"), hits(&[("Rust", 1), ("Tokio", 1)]));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let result = KeywordDictionary::from_json(r#"["python"]"#);
        assert!(matches!(result, Err(KeywordError::Json(_))));
    }

    #[test]
    fn test_empty_dictionary_rejected() {
        let result = KeywordDictionary::from_json("{}");
        assert!(matches!(result, Err(KeywordError::Empty)));
    }

    #[test]
    fn test_empty_token_rejected() {
        let result = KeywordDictionary::from_pairs([("!!!", "Bang")]);
        assert!(matches!(result, Err(KeywordError::EmptyToken(label)) if label == "Bang"));
    }

    #[test]
    fn test_conflicting_tokens_rejected() {
        let result = KeywordDictionary::from_pairs([("ci/cd", "CI/CD"), ("ci cd", "Pipelines")]);
        assert!(matches!(result, Err(KeywordError::ConflictingToken { .. })));
    }

    #[test]
    fn test_duplicate_tokens_with_same_label_merge() {
        let dict = KeywordDictionary::from_pairs([("ci/cd", "CI/CD"), ("CI CD", "CI/CD")]).unwrap();
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_grouped_by_label() {
        let dict = dictionary();
        let groups = dict.grouped();
        assert_eq!(groups["PostgreSQL"], vec!["postgres", "postgresql"]);
    }
}
