//! The human-in-the-loop review queue.
//!
//! Each scan regenerates the queue document from scratch. Terms already in
//! the glossary are left out; the rest are rendered as unchecked list items,
//! grouped into a section for custom-list terms and confidence bands for
//! auto-detected ones:
//!
//! ```markdown
//! ## Auto-Detected (high confidence)
//!
//! - [ ] **Logos Field** (12 occurrences)
//!   - Files: papers/a.md, papers/b.md
//!   - Example: "The Logos Field couples matter and information."
//! ```
//!
//! A reviewer ticks a box (`[x]` or `[X]`) to approve a term. The bolded
//! text after the checkbox is the canonical term used for promotion. Inside
//! it, `*` and `\` are backslash-escaped, so `a**b` is written `a\*\*b`.
//!
//! Ticks made before a rescan are carried over to the regenerated document
//! for any term whose exact string is still queued, whatever its new count.

use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;

use crate::models::{ReviewEntry, ScanReport, TermAggregate};
use crate::store::DocumentStore;

const ITEM_PATTERN: &str =
    r"^- \[([ xX])\] \*\*((?:\\.|[^\\*])+)\*\*(?:\s*\((\d+)(?: occurrences?)?\))?";

/// Count thresholds for the auto-detected sections.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceBands {
    /// Counts at or above this are "high confidence".
    pub high: usize,
    /// Counts at or above this (and below `high`) are "medium confidence".
    pub medium: usize,
}

impl Default for ConfidenceBands {
    fn default() -> Self {
        Self { high: 10, medium: 5 }
    }
}

/// Outcome of regenerating the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSummary {
    /// Entries written to the queue.
    pub queued: usize,
    /// Aggregates left out because the glossary already has them.
    pub already_known: usize,
    /// Entries whose earlier approval was carried over.
    pub approvals_kept: usize,
}

/// Parse every checkbox item of a queue document.
pub fn parse_entries(content: &str) -> Result<Vec<ReviewEntry>> {
    let item = Regex::new(ITEM_PATTERN)?;
    let mut entries: Vec<ReviewEntry> = Vec::new();
    let mut last_was_item = false;

    for line in content.lines() {
        if let Some(caps) = item.captures(line) {
            entries.push(ReviewEntry {
                term: unescape_term(&caps[2]),
                count: caps
                    .get(3)
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(0),
                document_paths: Vec::new(),
                approved: &caps[1] != " ",
            });
            last_was_item = true;
            continue;
        }
        let trimmed = line.trim();
        if let Some(files) = trimmed.strip_prefix("- Files:") {
            if let (true, Some(entry)) = (last_was_item, entries.last_mut()) {
                entry.document_paths = files
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            continue;
        }
        if !trimmed.starts_with("- ") {
            last_was_item = false;
        }
    }

    Ok(entries)
}

fn escape_term(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if c == '*' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn unescape_term(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.extend(chars.next());
        } else {
            out.push(c);
        }
    }
    out
}

fn render_section(
    out: &mut String,
    title: &str,
    terms: &[&TermAggregate],
    approved: &HashSet<String>,
) {
    if terms.is_empty() {
        return;
    }
    out.push_str(&format!("## {}\n\n", title));
    for agg in terms {
        let mark = if approved.contains(&agg.term) { "x" } else { " " };
        out.push_str(&format!(
            "- [{}] **{}** ({} occurrences)\n",
            mark,
            escape_term(&agg.term),
            agg.count
        ));
        let files: Vec<&str> = agg.document_paths.iter().map(String::as_str).collect();
        out.push_str(&format!("  - Files: {}\n", files.join(", ")));
        if let Some(example) = agg.example() {
            out.push_str(&format!("  - Example: \"{}\"\n", example));
        }
        out.push('\n');
    }
}

/// Render the queue document for the given (already filtered) aggregates.
pub fn render_queue(
    report: &ScanReport,
    queued: &[&TermAggregate],
    custom_terms: &[String],
    bands: ConfidenceBands,
    approved: &HashSet<String>,
) -> String {
    let custom: HashSet<String> = custom_terms.iter().map(|t| t.to_lowercase()).collect();
    let (from_custom, auto): (Vec<&TermAggregate>, Vec<&TermAggregate>) = queued
        .iter()
        .copied()
        .partition(|agg| custom.contains(&agg.term.to_lowercase()));

    let high: Vec<&TermAggregate> = auto
        .iter()
        .copied()
        .filter(|a| a.count >= bands.high)
        .collect();
    let medium: Vec<&TermAggregate> = auto
        .iter()
        .copied()
        .filter(|a| a.count >= bands.medium && a.count < bands.high)
        .collect();
    let low: Vec<&TermAggregate> = auto
        .iter()
        .copied()
        .filter(|a| a.count < bands.medium)
        .collect();

    let mut out = String::from("# Terms Detected - Needs Review\n");
    out.push_str(&format!(
        "Last Scan: {}\n",
        report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("Files Scanned: {}\n", report.documents_scanned));
    out.push_str(&format!("Total Occurrences: {}\n", report.total_occurrences));
    out.push_str(&format!("Unique Terms Found: {}\n\n", queued.len()));

    render_section(
        &mut out,
        "From Custom Terms List (user-specified)",
        &from_custom,
        approved,
    );
    render_section(&mut out, "Auto-Detected (high confidence)", &high, approved);
    render_section(&mut out, "Auto-Detected (medium confidence)", &medium, approved);
    render_section(&mut out, "Auto-Detected (low confidence)", &low, approved);
    out
}

/// The review queue document, accessed through a [`DocumentStore`].
pub struct ReviewQueue<'a> {
    store: &'a dyn DocumentStore,
    path: String,
    bands: ConfidenceBands,
}

impl<'a> ReviewQueue<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        path: impl Into<String>,
        bands: ConfidenceBands,
    ) -> Self {
        Self {
            store,
            path: path.into(),
            bands,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Replace the queue document with the aggregates of `report`.
    ///
    /// Aggregates whose term matches a known glossary term (ignoring case)
    /// are not queued. With `preserve_approvals`, items ticked in the
    /// current document stay ticked when their term is queued again.
    pub async fn generate(
        &self,
        report: &ScanReport,
        known_terms: &[String],
        custom_terms: &[String],
        preserve_approvals: bool,
    ) -> Result<QueueSummary> {
        let known: HashSet<String> = known_terms.iter().map(|t| t.to_lowercase()).collect();
        let queued: Vec<&TermAggregate> = report
            .aggregates
            .iter()
            .filter(|agg| !known.contains(&agg.term.to_lowercase()))
            .collect();

        let approved: HashSet<String> = if preserve_approvals {
            match self.approved().await {
                Ok(terms) => terms.into_iter().collect(),
                Err(e) => {
                    tracing::warn!(path = %self.path, error = %e, "previous approvals unreadable, starting fresh");
                    HashSet::new()
                }
            }
        } else {
            HashSet::new()
        };
        let approvals_kept = queued.iter().filter(|a| approved.contains(&a.term)).count();

        let content = render_queue(report, &queued, custom_terms, self.bands, &approved);
        self.store
            .write(&self.path, &content)
            .await
            .with_context(|| format!("Failed to write review queue: {}", self.path))?;

        Ok(QueueSummary {
            queued: queued.len(),
            already_known: report.aggregates.len() - queued.len(),
            approvals_kept,
        })
    }

    /// All items of the current queue document (empty if it does not exist).
    pub async fn entries(&self) -> Result<Vec<ReviewEntry>> {
        if !self.store.exists(&self.path).await? {
            return Ok(Vec::new());
        }
        let content = self
            .store
            .read(&self.path)
            .await
            .with_context(|| format!("Failed to read review queue: {}", self.path))?;
        parse_entries(&content)
    }

    /// Ticked items, in document order.
    pub async fn approved_entries(&self) -> Result<Vec<ReviewEntry>> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .filter(|e| e.approved)
            .collect())
    }

    /// Terms of the ticked items, in document order.
    pub async fn approved(&self) -> Result<Vec<String>> {
        Ok(self
            .approved_entries()
            .await?
            .into_iter()
            .map(|e| e.term)
            .collect())
    }

    /// Delete the queue document.
    pub async fn clear(&self) -> Result<()> {
        self.store
            .delete(&self.path)
            .await
            .with_context(|| format!("Failed to delete review queue: {}", self.path))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;

    use super::*;
    use crate::models::{CandidateOccurrence, Category};
    use crate::store::memory::InMemoryStore;

    const PATH: &str = "_term_review_queue.md";

    fn aggregate(term: &str, count: usize, files: &[&str]) -> TermAggregate {
        TermAggregate {
            term: term.to_string(),
            count,
            document_paths: files.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            occurrences: vec![CandidateOccurrence {
                term: term.to_string(),
                category: Category::Phrase,
                document_path: files[0].to_string(),
                line_number: 1,
                context_line: format!("About the {}.", term),
            }],
        }
    }

    fn report(aggregates: Vec<TermAggregate>) -> ScanReport {
        ScanReport {
            total_occurrences: aggregates.iter().map(|a| a.count).sum(),
            aggregates,
            documents_scanned: 2,
            documents_skipped: 0,
            scanned_at: Utc::now(),
        }
    }

    fn queue(store: &InMemoryStore) -> ReviewQueue<'_> {
        ReviewQueue::new(store, PATH, ConfidenceBands::default())
    }

    #[tokio::test]
    async fn test_approved_scenario() {
        let content = "# Terms\n\n- [x] **Master Equation** (7 occurrences)\n- [ ] **Grace Function** (3 occurrences)\n";
        let store = InMemoryStore::with_documents([(PATH, content)]);
        assert_eq!(queue(&store).approved().await.unwrap(), vec!["Master Equation"]);
    }

    #[tokio::test]
    async fn test_uppercase_marker_and_any_section() {
        let content = "## Custom\n\n- [X] **Logos Field** (2)\n\n## Auto\n\n- [x] **PEAR**\n- [ ] **GCP** (3 occurrences)\n";
        let store = InMemoryStore::with_documents([(PATH, content)]);
        assert_eq!(queue(&store).approved().await.unwrap(), vec!["Logos Field", "PEAR"]);
    }

    #[tokio::test]
    async fn test_missing_queue_has_nothing_approved() {
        let store = InMemoryStore::new();
        assert!(queue(&store).approved().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_sections_and_known_filter() {
        let store = InMemoryStore::new();
        let r = report(vec![
            aggregate("Logos Field", 12, &["a.md", "b.md"]),
            aggregate("Grace Function", 6, &["a.md"]),
            aggregate("Trinity Observer", 3, &["b.md"]),
            aggregate("Master Equation", 9, &["a.md"]),
            aggregate("PEAR Lab", 4, &["b.md"]),
        ]);
        let known = vec!["master equation".to_string()];
        let custom = vec!["pear lab".to_string()];
        let summary = queue(&store)
            .generate(&r, &known, &custom, true)
            .await
            .unwrap();
        assert_eq!(summary.queued, 4);
        assert_eq!(summary.already_known, 1);

        let content = store.get(PATH).unwrap();
        assert!(content.starts_with("# Terms Detected - Needs Review\nLast Scan: "));
        assert!(content.contains("Files Scanned: 2\n"));
        assert!(content.contains("Unique Terms Found: 4\n"));
        assert!(!content.contains("Master Equation"));

        let custom = content.find("## From Custom Terms List (user-specified)").unwrap();
        let high = content.find("## Auto-Detected (high confidence)").unwrap();
        let medium = content.find("## Auto-Detected (medium confidence)").unwrap();
        let low = content.find("## Auto-Detected (low confidence)").unwrap();
        assert!(custom < high && high < medium && medium < low);

        assert!(content[custom..high].contains("- [ ] **PEAR Lab** (4 occurrences)"));
        assert!(content[high..medium].contains(
            "- [ ] **Logos Field** (12 occurrences)\n  - Files: a.md, b.md\n  - Example: \"About the Logos Field.\"\n"
        ));
        assert!(content[medium..low].contains("**Grace Function**"));
        assert!(content[low..].contains("**Trinity Observer**"));
    }

    #[tokio::test]
    async fn test_regenerate_keeps_approvals() {
        let store = InMemoryStore::new();
        let q = queue(&store);
        q.generate(
            &report(vec![
                aggregate("Logos Field", 5, &["a.md"]),
                aggregate("Grace Function", 3, &["a.md"]),
            ]),
            &[],
            &[],
            true,
        )
        .await
        .unwrap();

        let ticked = store
            .get(PATH)
            .unwrap()
            .replace("- [ ] **Logos Field**", "- [x] **Logos Field**");
        store.write(PATH, &ticked).await.unwrap();

        let summary = q
            .generate(
                &report(vec![
                    aggregate("Logos Field", 11, &["a.md", "c.md"]),
                    aggregate("Grace Function", 4, &["a.md"]),
                ]),
                &[],
                &[],
                true,
            )
            .await
            .unwrap();
        assert_eq!(summary.approvals_kept, 1);

        let entries = q.entries().await.unwrap();
        let logos = entries.iter().find(|e| e.term == "Logos Field").unwrap();
        assert!(logos.approved);
        assert_eq!(logos.count, 11);
        assert_eq!(logos.document_paths, vec!["a.md", "c.md"]);
        assert_eq!(q.approved().await.unwrap(), vec!["Logos Field"]);
    }

    #[tokio::test]
    async fn test_regenerate_without_preserving() {
        let store =
            InMemoryStore::with_documents([(PATH, "- [x] **Logos Field** (5 occurrences)\n")]);
        let q = queue(&store);
        q.generate(&report(vec![aggregate("Logos Field", 5, &["a.md"])]), &[], &[], false)
            .await
            .unwrap();
        assert!(q.approved().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_document() {
        let store = InMemoryStore::with_documents([(PATH, "- [x] **A** (1)\n")]);
        let q = queue(&store);
        q.clear().await.unwrap();
        assert!(!store.exists(PATH).await.unwrap());
        assert!(q.approved().await.unwrap().is_empty());
        q.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_emphasis_characters_in_terms_survive_approval() {
        let store = InMemoryStore::new();
        let q = queue(&store);
        let names = ["a**b", "x*", "C:\\dir", "Logos Field"];
        q.generate(
            &report(names.iter().map(|t| aggregate(t, 6, &["a.md"])).collect()),
            &[],
            &[],
            true,
        )
        .await
        .unwrap();

        let content = store.get(PATH).unwrap();
        assert!(content.contains("- [ ] **a\\*\\*b** (6 occurrences)"));
        let terms: Vec<String> = q.entries().await.unwrap().into_iter().map(|e| e.term).collect();
        assert_eq!(terms, names);

        store
            .write(PATH, &content.replace("- [ ] **a\\*\\*b**", "- [x] **a\\*\\*b**"))
            .await
            .unwrap();
        assert_eq!(q.approved().await.unwrap(), vec!["a**b"]);
    }

    #[test]
    fn test_parse_entries_reads_files() {
        let content = "- [ ] **A B** (3 occurrences)\n  - Files: x.md, y.md\n  - Example: \"A B\"\n\n- [x] **C** (1 occurrence)\n";
        let entries = parse_entries(content).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].document_paths, vec!["x.md", "y.md"]);
        assert_eq!(entries[0].count, 3);
        assert!(!entries[0].approved);
        assert!(entries[1].approved);
        assert_eq!(entries[1].count, 1);
        assert!(entries[1].document_paths.is_empty());
    }
}
