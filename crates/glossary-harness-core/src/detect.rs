//! Candidate term detection.
//!
//! The detector applies a fixed, ordered list of independent pattern rules
//! to each line of a document and filters the raw matches through the
//! allow-list and deny-list. Matching never crosses a line boundary, so a
//! partial re-scan of a file yields the same occurrences for the lines it
//! covers.
//!
//! # Rules
//!
//! | Category | Shape |
//! |----------|-------|
//! | [`Category::Equation`] | `Ψx = …` (two-character symbol before `=`) |
//! | [`Category::Phrase`] | `Lowe Coherence Lagrangian` |
//! | [`Category::Acronym`] | `PEAR`, `GCP` |
//! | [`Category::Citation`] | `John 1:1`, `Genesis 1:1-3` |
//! | [`Category::Technical`] | `Noether theorem`, `Logos field` |
//! | [`Category::Math`] | `$E = mc^2$`, `$$\chi$$` (off by default) |
//!
//! # Filtering
//!
//! A match whose lowercase form is on the allow-list is always kept.
//! Otherwise it is dropped when its lowercase form is a stop word (or a
//! configured extra deny term), or when it is shorter than the minimum
//! term length.

use std::collections::HashSet;

use anyhow::Result;
use regex::Regex;

use crate::models::{CandidateOccurrence, Category};
use crate::terms::{lowercase_set, TermMatcher};

/// Stop words that are never candidates unless explicitly allowed.
pub const STOP_WORDS: &[&str] = &[
    "the", "and", "is", "was", "are", "were", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "system", "framework", "process", "method",
];

/// Matches shorter than this many characters are dropped by default.
pub const DEFAULT_MIN_TERM_LENGTH: usize = 3;

/// Which rules run and how matches are filtered.
#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub equations: bool,
    pub phrases: bool,
    pub acronyms: bool,
    pub citations: bool,
    pub technical: bool,
    pub math: bool,
    pub min_term_length: usize,
    /// Extra deny terms on top of [`STOP_WORDS`].
    pub deny: Vec<String>,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            equations: true,
            phrases: true,
            acronyms: true,
            citations: true,
            technical: true,
            math: false,
            min_term_length: DEFAULT_MIN_TERM_LENGTH,
            deny: Vec::new(),
        }
    }
}

struct Rule {
    category: Category,
    regex: Regex,
    /// Capture group holding the term (0 = whole match).
    group: usize,
}

/// Compiled detection rules plus the deny-list.
pub struct Detector {
    rules: Vec<Rule>,
    deny: HashSet<String>,
    min_term_length: usize,
}

impl Detector {
    pub fn new(settings: &DetectorSettings) -> Result<Self> {
        let specs: [(bool, Category, &str, usize); 6] = [
            (settings.equations, Category::Equation, r"([A-Z]\w)\s*=\s*", 1),
            (
                settings.phrases,
                Category::Phrase,
                r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)+)\b",
                1,
            ),
            (settings.acronyms, Category::Acronym, r"\b([A-Z]{2,})\b", 1),
            (
                settings.citations,
                Category::Citation,
                r"\b([A-Z][a-z]+\s+\d+:\d+(?:-\d+)?)\b",
                1,
            ),
            (
                settings.technical,
                Category::Technical,
                r"(?i)\b(\w+\s+(?:theorem|law|principle|equation|framework|field|coherence))\b",
                1,
            ),
            (settings.math, Category::Math, r"\$\$?[^$]+\$\$?", 0),
        ];

        let mut rules = Vec::new();
        for (enabled, category, pattern, group) in specs {
            if enabled {
                rules.push(Rule {
                    category,
                    regex: Regex::new(pattern)?,
                    group,
                });
            }
        }

        let mut deny = lowercase_set(STOP_WORDS);
        deny.extend(lowercase_set(&settings.deny));

        Ok(Self {
            rules,
            deny,
            min_term_length: settings.min_term_length,
        })
    }

    /// Detect candidate terms in `text`.
    ///
    /// `allow` must hold lowercased terms (see [`lowercase_set`]).
    pub fn detect(&self, text: &str, allow: &HashSet<String>) -> Vec<CandidateOccurrence> {
        self.detect_document("", text, allow)
    }

    /// Like [`detect`](Self::detect), stamping each occurrence with `path`.
    pub fn detect_document(
        &self,
        path: &str,
        text: &str,
        allow: &HashSet<String>,
    ) -> Vec<CandidateOccurrence> {
        let mut occurrences = Vec::new();

        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            // The phrase and technical rules often hit the same span; count it once.
            let mut spans: HashSet<(usize, usize)> = HashSet::new();

            for rule in &self.rules {
                for caps in rule.regex.captures_iter(line) {
                    let Some(m) = caps.get(rule.group) else {
                        continue;
                    };
                    let term = m.as_str();
                    if term.is_empty() || !self.accepts(term, allow) {
                        continue;
                    }
                    if !spans.insert((m.start(), m.end())) {
                        continue;
                    }
                    occurrences.push(CandidateOccurrence {
                        term: term.to_string(),
                        category: rule.category,
                        document_path: path.to_string(),
                        line_number: index + 1,
                        context_line: line.trim().to_string(),
                    });
                }
            }
        }

        occurrences
    }

    /// Allow-list first, then deny-list and minimum length.
    pub fn accepts(&self, term: &str, allow: &HashSet<String>) -> bool {
        let lower = term.to_lowercase();
        if allow.contains(&lower) {
            return true;
        }
        if self.deny.contains(&lower) {
            return false;
        }
        term.chars().count() >= self.min_term_length
    }
}

/// Count every word-bounded, case-insensitive mention of the listed terms.
///
/// Used in custom-terms-only mode, where the automatic rules are skipped.
/// The occurrence carries the listed spelling, not the document's casing.
pub fn detect_listed(
    path: &str,
    text: &str,
    matchers: &[TermMatcher],
) -> Vec<CandidateOccurrence> {
    let mut occurrences = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        for matcher in matchers {
            for _ in matcher.find_all(line) {
                occurrences.push(CandidateOccurrence {
                    term: matcher.term().to_string(),
                    category: Category::Listed,
                    document_path: path.to_string(),
                    line_number: index + 1,
                    context_line: line.trim().to_string(),
                });
            }
        }
    }
    occurrences
}
