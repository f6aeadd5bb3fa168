//! Core data models used throughout Glossary Harness.
//!
//! These types represent the candidate occurrences, per-term aggregates,
//! review-queue entries, and glossary entries that flow through the
//! detection → review → promotion → linking pipeline.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which detection rule produced a [`CandidateOccurrence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// A symbol on the left-hand side of an assignment (`Ψ = …`, `Ab = …`).
    Equation,
    /// A run of two or more capitalized words.
    Phrase,
    /// Two or more consecutive capital letters.
    Acronym,
    /// A `Label NN:NN` style reference.
    Citation,
    /// `<word> theorem|law|principle|equation|framework|field|coherence`.
    Technical,
    /// An inline (`$…$`) or display (`$$…$$`) math span.
    Math,
    /// A custom-list term counted verbatim in custom-terms-only mode.
    Listed,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Equation => "equation",
            Category::Phrase => "phrase",
            Category::Acronym => "acronym",
            Category::Citation => "citation",
            Category::Technical => "technical",
            Category::Math => "math",
            Category::Listed => "listed",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single raw term match on one line of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateOccurrence {
    pub term: String,
    pub category: Category,
    pub document_path: String,
    /// 1-based line number.
    pub line_number: usize,
    /// The trimmed source line, kept as a review example.
    pub context_line: String,
}

/// Per-term summary of one scan pass.
///
/// `count` counts every occurrence; `document_paths` records each owning
/// document once.
#[derive(Debug, Clone, Serialize)]
pub struct TermAggregate {
    pub term: String,
    pub count: usize,
    pub document_paths: BTreeSet<String>,
    #[serde(skip)]
    pub occurrences: Vec<CandidateOccurrence>,
}

impl TermAggregate {
    pub fn new(term: &str) -> Self {
        Self {
            term: term.to_string(),
            count: 0,
            document_paths: BTreeSet::new(),
            occurrences: Vec::new(),
        }
    }

    pub fn record(&mut self, occurrence: CandidateOccurrence) {
        self.count += 1;
        self.document_paths.insert(occurrence.document_path.clone());
        self.occurrences.push(occurrence);
    }

    /// First recorded context line, used as the review example.
    pub fn example(&self) -> Option<&str> {
        self.occurrences
            .first()
            .map(|o| o.context_line.as_str())
            .filter(|s| !s.is_empty())
    }
}

/// Result of one scan pass over the vault.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub aggregates: Vec<TermAggregate>,
    pub documents_scanned: usize,
    pub documents_skipped: usize,
    pub total_occurrences: usize,
    pub scanned_at: DateTime<Utc>,
}

/// One checkable line item of the review queue document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewEntry {
    pub term: String,
    pub count: usize,
    pub document_paths: Vec<String>,
    pub approved: bool,
}

/// A parsed entry of the glossary document.
///
/// `brief` and `definition` are `None` while the entry still carries the
/// "needs content" placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub brief: Option<String>,
    pub definition: Option<String>,
    pub usages: Vec<String>,
}

impl GlossaryEntry {
    pub fn is_complete(&self) -> bool {
        self.brief.is_some() && self.definition.is_some()
    }
}
