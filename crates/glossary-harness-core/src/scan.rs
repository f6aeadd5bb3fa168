//! Vault-wide term frequency aggregation.
//!
//! The scanner narrows the corpus to the requested scope, runs the
//! [`Detector`] over each document's current text, and folds the resulting
//! occurrences into one [`TermAggregate`] per exact term string.
//!
//! A document that cannot be read is logged and counted as skipped; it never
//! aborts the pass. Aggregates below `min_frequency` are dropped and the rest
//! are ordered by count, highest first. Ties are broken by term so output is
//! stable between runs, but that order is not part of the contract.

use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;

use crate::detect::{detect_listed, Detector, DetectorSettings};
use crate::models::{ScanReport, TermAggregate};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::store::DocumentStore;
use crate::terms::{lowercase_set, TermMatcher};

/// Inputs for one scan pass.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Only documents under this folder are scanned (`None` = whole vault).
    pub scope: Option<String>,
    /// Documents under any of these folders are skipped.
    pub excluded_prefixes: Vec<String>,
    /// Exact paths never scanned (the pipeline's own control documents).
    pub skip_paths: Vec<String>,
    /// Terms that bypass the deny-list and length filters.
    pub allow_list: Vec<String>,
    pub min_frequency: usize,
    /// Count only allow-list terms and skip the automatic rules.
    pub custom_terms_only: bool,
    pub detector: DetectorSettings,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            scope: None,
            excluded_prefixes: Vec::new(),
            skip_paths: Vec::new(),
            allow_list: Vec::new(),
            min_frequency: 3,
            custom_terms_only: false,
            detector: DetectorSettings::default(),
        }
    }
}

/// Whether `path` lies inside the folder `prefix`.
///
/// Matching is component-aligned: `notes` covers `notes/a.md` but not
/// `notes-old/a.md`. Backslashes and surrounding slashes in the prefix are
/// normalized; an empty prefix covers everything.
pub fn is_under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.replace('\\', "/");
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return true;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Apply scope, exclusions, and skip paths to a corpus listing.
pub fn select_documents(corpus: &[String], options: &ScanOptions) -> Vec<String> {
    corpus
        .iter()
        .filter(|path| options.scope.as_deref().map_or(true, |s| is_under(path, s)))
        .filter(|path| !options.excluded_prefixes.iter().any(|p| is_under(path, p)))
        .filter(|path| !options.skip_paths.iter().any(|p| p == *path))
        .cloned()
        .collect()
}

/// Scan `corpus` and aggregate candidate terms.
pub async fn scan(
    store: &dyn DocumentStore,
    corpus: &[String],
    options: &ScanOptions,
    progress: &dyn ProgressReporter,
) -> Result<ScanReport> {
    let detector = Detector::new(&options.detector)?;
    let allow = lowercase_set(&options.allow_list);
    let listed = if options.custom_terms_only {
        options
            .allow_list
            .iter()
            .map(|t| TermMatcher::new(t))
            .collect::<Result<Vec<_>>>()?
    } else {
        Vec::new()
    };

    let documents = select_documents(corpus, options);
    let total = documents.len() as u64;

    let mut by_term: HashMap<String, TermAggregate> = HashMap::new();
    let mut documents_scanned = 0usize;
    let mut documents_skipped = 0usize;
    let mut total_occurrences = 0usize;

    for (i, path) in documents.iter().enumerate() {
        match store.read(path).await {
            Ok(text) => {
                let occurrences = if options.custom_terms_only {
                    detect_listed(path, &text, &listed)
                } else {
                    detector.detect_document(path, &text, &allow)
                };
                total_occurrences += occurrences.len();
                for occ in occurrences {
                    by_term
                        .entry(occ.term.clone())
                        .or_insert_with(|| TermAggregate::new(&occ.term))
                        .record(occ);
                }
                documents_scanned += 1;
            }
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "skipping unreadable document");
                documents_skipped += 1;
            }
        }
        progress.report(ProgressEvent::Processing {
            pass: "scan",
            n: i as u64 + 1,
            total,
        });
    }

    let mut aggregates: Vec<TermAggregate> = by_term
        .into_values()
        .filter(|agg| agg.count >= options.min_frequency)
        .collect();
    aggregates.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));

    tracing::debug!(
        documents_scanned,
        documents_skipped,
        terms = aggregates.len(),
        "scan finished"
    );

    Ok(ScanReport {
        aggregates,
        documents_scanned,
        documents_skipped,
        total_occurrences,
        scanned_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::store::memory::InMemoryStore;

    fn logos_store() -> InMemoryStore {
        InMemoryStore::with_documents([
            (
                "notes/a.md",
                "we study Logos Field\nagain Logos Field\nand Logos Field",
            ),
            (
                "notes/b.md",
                "one Logos Field\ntwo Logos Field\nthree Logos Field\nfour Logos Field",
            ),
        ])
    }

    async fn run(store: &InMemoryStore, options: &ScanOptions) -> ScanReport {
        let corpus = store.list().await.unwrap();
        scan(store, &corpus, options, &NoProgress).await.unwrap()
    }

    #[test]
    fn test_is_under() {
        assert!(is_under("notes/a.md", "notes"));
        assert!(is_under("notes/a.md", "/notes/"));
        assert!(is_under("notes/deep/a.md", "notes\\deep"));
        assert!(!is_under("notes-old/a.md", "notes"));
        assert!(is_under("anything.md", ""));
    }

    #[tokio::test]
    async fn test_frequency_threshold() {
        let store = logos_store();

        let report = run(&store, &ScanOptions { min_frequency: 5, ..Default::default() }).await;
        let logos = report
            .aggregates
            .iter()
            .find(|a| a.term == "Logos Field")
            .unwrap();
        assert_eq!(logos.count, 7);
        assert_eq!(logos.document_paths.len(), 2);
        assert_eq!(logos.occurrences.len(), 7);

        let report = run(&store, &ScanOptions { min_frequency: 8, ..Default::default() }).await;
        assert!(report.aggregates.iter().all(|a| a.term != "Logos Field"));
        assert!(report.aggregates.iter().all(|a| a.count >= 8));
        assert_eq!(report.documents_scanned, 2);
    }

    #[tokio::test]
    async fn test_scope_and_exclusions() {
        let store = InMemoryStore::with_documents([
            ("papers/a.md", "Grace Function here"),
            ("papers/Assets/b.md", "Grace Function here"),
            ("drafts/c.md", "Grace Function here"),
        ]);
        let options = ScanOptions {
            scope: Some("papers".to_string()),
            excluded_prefixes: vec!["papers/Assets".to_string()],
            min_frequency: 1,
            ..Default::default()
        };
        let report = run(&store, &options).await;
        assert_eq!(report.documents_scanned, 1);
        assert_eq!(report.aggregates[0].term, "Grace Function");
        assert_eq!(report.aggregates[0].count, 1);
    }

    #[tokio::test]
    async fn test_unreadable_document_is_skipped() {
        let store = logos_store();
        store.mark_unreadable("notes/b.md");
        let report = run(&store, &ScanOptions { min_frequency: 1, ..Default::default() }).await;
        assert_eq!(report.documents_scanned, 1);
        assert_eq!(report.documents_skipped, 1);
        let logos = report
            .aggregates
            .iter()
            .find(|a| a.term == "Logos Field")
            .unwrap();
        assert_eq!(logos.count, 3);
    }

    #[tokio::test]
    async fn test_sorted_by_count_descending() {
        let store = InMemoryStore::with_documents([(
            "a.md",
            "NASA\nNASA\nNASA\nCERN\nCERN\nOther Thing",
        )]);
        let report = run(&store, &ScanOptions { min_frequency: 1, ..Default::default() }).await;
        let counts: Vec<usize> = report.aggregates.iter().map(|a| a.count).collect();
        let mut sorted = counts.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(counts, sorted);
        assert_eq!(report.aggregates[0].term, "NASA");
    }

    #[tokio::test]
    async fn test_custom_terms_only() {
        let store = logos_store();
        let options = ScanOptions {
            custom_terms_only: true,
            allow_list: vec!["logos field".to_string()],
            min_frequency: 1,
            ..Default::default()
        };
        let report = run(&store, &options).await;
        assert_eq!(report.aggregates.len(), 1);
        assert_eq!(report.aggregates[0].term, "logos field");
        assert_eq!(report.aggregates[0].count, 7);
    }

    #[tokio::test]
    async fn test_skip_paths() {
        let store = logos_store();
        let options = ScanOptions {
            skip_paths: vec!["notes/b.md".to_string()],
            min_frequency: 1,
            ..Default::default()
        };
        let report = run(&store, &options).await;
        assert_eq!(report.documents_scanned, 1);
    }
}
