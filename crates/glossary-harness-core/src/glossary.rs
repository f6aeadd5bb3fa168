//! The canonical glossary document.
//!
//! The glossary is a markdown document with one level-2 heading per accepted
//! term. Each heading is followed by a stub body that humans fill in:
//!
//! ```markdown
//! ## Master Equation
//! Used in: papers/a.md, papers/b.md
//! Frequency: 7 occurrences
//! Brief: [Add short description]
//! Full Definition: [To be expanded]
//! External Links:
//! -
//! ```
//!
//! The `Brief:` and `Full Definition:` lines, and their placeholders, are
//! load-bearing: completeness reporting compares against them.
//!
//! Automated writes are append-only. An entry whose heading already exists
//! is never rewritten or reordered, and nothing is ever removed.

use std::collections::HashSet;

use anyhow::{Context, Result};

use crate::models::{GlossaryEntry, ReviewEntry};
use crate::store::DocumentStore;

/// Written when the glossary document does not exist yet.
pub const GLOSSARY_HEADER: &str = "# Central Glossary\n\n";
pub const BRIEF_PLACEHOLDER: &str = "[Add short description]";
pub const DEFINITION_PLACEHOLDER: &str = "[To be expanded]";
const PENDING_USAGE: &str = "(pending scan)";
const NO_FILES: &[String] = &[];

/// Parse `## <term>` headings, in document order.
pub fn parse_terms(content: &str) -> Vec<String> {
    content.lines().filter_map(heading_term).collect()
}

fn heading_term(line: &str) -> Option<String> {
    let rest = line.strip_prefix("##")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let term = rest.trim();
    (!term.is_empty()).then(|| term.to_string())
}

/// Parse every entry with its completeness fields.
pub fn parse_entries(content: &str) -> Vec<GlossaryEntry> {
    let mut entries: Vec<GlossaryEntry> = Vec::new();
    for line in content.lines() {
        if let Some(term) = heading_term(line) {
            entries.push(GlossaryEntry {
                term,
                brief: None,
                definition: None,
                usages: Vec::new(),
            });
            continue;
        }
        let Some(entry) = entries.last_mut() else {
            continue;
        };
        let line = line.trim();
        if let Some(value) = line.strip_prefix("Brief:") {
            entry.brief = filled(value, BRIEF_PLACEHOLDER);
        } else if let Some(value) = line.strip_prefix("Full Definition:") {
            entry.definition = filled(value, DEFINITION_PLACEHOLDER);
        } else if let Some(value) = line.strip_prefix("Used in:") {
            let value = value.trim();
            if value != PENDING_USAGE {
                entry.usages = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
        }
    }
    entries
}

fn filled(value: &str, placeholder: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty() && value != placeholder).then(|| value.to_string())
}

/// Render the stub appended for a newly accepted term.
pub fn render_stub(term: &str, count: usize, files: &[String]) -> String {
    let used_in = if files.is_empty() {
        format!("Used in: {}", PENDING_USAGE)
    } else {
        format!("Used in: {}", files.join(", "))
    };
    format!(
        "## {}\n{}\nFrequency: {} occurrences\nBrief: {}\nFull Definition: {}\nExternal Links:\n- \n",
        term, used_in, count, BRIEF_PLACEHOLDER, DEFINITION_PLACEHOLDER
    )
}

/// Collapse whitespace runs, line breaks included, into single spaces.
fn single_line(term: &str) -> String {
    term.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Heading anchor for `term`. Characters with a meaning inside `[[...]]`
/// markup are dropped.
fn anchor(term: &str) -> String {
    single_line(&term.replace(['[', ']', '|', '#', '^'], " "))
}

/// The glossary document, accessed through a [`DocumentStore`].
pub struct GlossaryStore<'a> {
    store: &'a dyn DocumentStore,
    path: String,
}

impl<'a> GlossaryStore<'a> {
    pub fn new(store: &'a dyn DocumentStore, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Create the glossary with its header if it does not exist.
    ///
    /// Returns `true` if the document was created.
    pub async fn ensure_exists(&self) -> Result<bool> {
        if self.store.exists(&self.path).await? {
            return Ok(false);
        }
        self.store
            .create(&self.path, GLOSSARY_HEADER)
            .await
            .with_context(|| format!("Failed to create glossary: {}", self.path))?;
        Ok(true)
    }

    /// All accepted terms, verbatim.
    ///
    /// A missing or unreadable glossary yields no terms so the rest of the
    /// pipeline keeps working.
    pub async fn terms(&self) -> Vec<String> {
        match self.read_if_present().await {
            Some(content) => parse_terms(&content),
            None => Vec::new(),
        }
    }

    /// All entries with their completeness fields.
    pub async fn entries(&self) -> Vec<GlossaryEntry> {
        match self.read_if_present().await {
            Some(content) => parse_entries(&content),
            None => Vec::new(),
        }
    }

    async fn read_if_present(&self) -> Option<String> {
        match self.store.exists(&self.path).await {
            Ok(false) => return None,
            Ok(true) => {}
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "glossary unavailable, treating as empty");
                return None;
            }
        }
        match self.store.read(&self.path).await {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "glossary unreadable, treating as empty");
                None
            }
        }
    }

    /// Append stubs for terms that have no heading yet.
    ///
    /// Returns the number of entries added.
    pub async fn add_terms(&self, terms: &[String]) -> Result<usize> {
        let stubs: Vec<(&str, usize, &[String])> =
            terms.iter().map(|t| (t.as_str(), 0, NO_FILES)).collect();
        self.append(&stubs).await
    }

    /// Append stubs for approved review entries, carrying their count and
    /// owning documents into the stub.
    pub async fn add_entries(&self, entries: &[ReviewEntry]) -> Result<usize> {
        let stubs: Vec<(&str, usize, &[String])> = entries
            .iter()
            .map(|e| (e.term.as_str(), e.count, e.document_paths.as_slice()))
            .collect();
        self.append(&stubs).await
    }

    async fn append(&self, stubs: &[(&str, usize, &[String])]) -> Result<usize> {
        self.ensure_exists().await?;
        let content = self
            .store
            .read(&self.path)
            .await
            .with_context(|| format!("Failed to read glossary: {}", self.path))?;

        let mut known: HashSet<String> = parse_terms(&content).into_iter().collect();
        let mut updated = content.clone();
        let mut added = 0usize;

        for (term, count, files) in stubs {
            // A line break would split the heading into two entries.
            let term = single_line(term);
            if term.is_empty() || !known.insert(term.clone()) {
                continue;
            }
            if !updated.is_empty() && !updated.ends_with('\n') {
                updated.push('\n');
            }
            updated.push('\n');
            updated.push_str(&render_stub(&term, *count, files));
            added += 1;
        }

        if updated != content {
            self.store
                .write(&self.path, &updated)
                .await
                .with_context(|| format!("Failed to write glossary: {}", self.path))?;
        }
        Ok(added)
    }

    /// Link markup pointing at `term`'s heading, showing `display`.
    pub fn link_target(&self, term: &str, display: &str) -> String {
        let page = self.path.strip_suffix(".md").unwrap_or(&self.path);
        format!("[[{}#{}|{}]]", page, anchor(term), display)
    }
}
