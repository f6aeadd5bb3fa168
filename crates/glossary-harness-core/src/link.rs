//! Idempotent cross-linking of glossary terms.
//!
//! The linker rewrites bare mentions of glossary terms into links to the
//! term's glossary heading. It works line by line:
//!
//! 1. A line starting with three or more backticks or tildes opens a fenced
//!    block. The block is closed only by a bare run of the same character at
//!    least as long as the opening run, so a `~~~` line inside a backtick
//!    fence (or a shorter run) is fenced content.
//! 2. Fence lines, lines inside a fence, lines inside the leading
//!    frontmatter block and lines starting with `---` are left alone.
//! 3. For every other line, each term (longest first) is linked at most
//!    once: if a link on the line already mentions the term the term is
//!    skipped, otherwise its first mention outside links and inline code is
//!    wrapped, keeping the mention's original casing as display text.
//!
//! Every link produced contains the term it was made for, so a second pass
//! finds nothing left to do: `link(link(t)) == link(t)`. A wiki link runs
//! from `[[` to the first run of two or more `]`, which keeps terms with
//! single brackets inside the span. Terms containing `[[` or `]]` cannot be
//! written inside link markup and are skipped.
//!
//! The pipeline's own control documents (glossary, review queue, custom
//! terms list) are never rewritten.

use std::collections::HashSet;
use std::ops::Range;

use anyhow::Result;
use regex::Regex;

use crate::glossary::GlossaryStore;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::store::DocumentStore;
use crate::terms::{linking_order, TermMatcher};

/// Compiled term matchers plus the patterns for existing link constructs.
pub struct LinkRewriter {
    matchers: Vec<TermMatcher>,
    wiki_link: Regex,
    markdown_link: Regex,
    inline_code: Regex,
}

impl LinkRewriter {
    /// Build a rewriter for `terms`, deduplicated and ordered longest first.
    pub fn new<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let matchers = linking_order(terms)
            .iter()
            .filter(|t| {
                let ok = linkable(t);
                if !ok {
                    tracing::warn!(term = %t, "term cannot be written inside link markup, skipping");
                }
                ok
            })
            .map(|t| TermMatcher::new(t))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            matchers,
            wiki_link: Regex::new(r"\[\[.*?\]{2,}")?,
            markdown_link: Regex::new(r"\[[^\]]*\]\([^)]*\)")?,
            inline_code: Regex::new(r"`[^`]*`")?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Rewrite `text`, producing links with `make_link(term, display)`.
    pub fn rewrite<F>(&self, text: &str, make_link: F) -> String
    where
        F: Fn(&str, &str) -> String,
    {
        let mut out: Vec<String> = Vec::new();
        let mut fence: Option<(char, usize)> = None;
        let mut in_frontmatter = false;

        for (index, line) in text.split('\n').enumerate() {
            let trimmed = line.trim();

            if index == 0 && trimmed == "---" {
                in_frontmatter = true;
                out.push(line.to_string());
                continue;
            }
            if in_frontmatter {
                if trimmed == "---" || trimmed == "..." {
                    in_frontmatter = false;
                }
                out.push(line.to_string());
                continue;
            }
            if let Some((marker, run)) = fence_marker(trimmed) {
                match fence {
                    None => fence = Some((marker, run)),
                    Some((open, open_run))
                        if marker == open && run >= open_run && trimmed.len() == run =>
                    {
                        fence = None;
                    }
                    Some(_) => {}
                }
                out.push(line.to_string());
                continue;
            }
            if fence.is_some() || trimmed.starts_with("---") {
                out.push(line.to_string());
                continue;
            }
            out.push(self.rewrite_line(line, &make_link));
        }

        out.join("\n")
    }

    fn rewrite_line<F>(&self, line: &str, make_link: &F) -> String
    where
        F: Fn(&str, &str) -> String,
    {
        let mut result = line.to_string();

        for matcher in &self.matchers {
            let links = self.link_spans(&result);
            let already_linked = links
                .iter()
                .any(|span| !matcher.find_all(&result[span.clone()]).is_empty());
            if already_linked {
                continue;
            }

            let mut protected = links;
            protected.extend(self.inline_code.find_iter(&result).map(|m| m.range()));

            let Some(hit) = matcher
                .find_all(&result)
                .into_iter()
                .find(|hit| !protected.iter().any(|span| overlaps(span, hit)))
            else {
                continue;
            };

            let link = make_link(matcher.term(), &result[hit.clone()]);
            result.replace_range(hit, &link);
        }

        result
    }

    fn link_spans(&self, line: &str) -> Vec<Range<usize>> {
        self.wiki_link
            .find_iter(line)
            .chain(self.markdown_link.find_iter(line))
            .map(|m| m.range())
            .collect()
    }
}

/// Link `terms` in `text` without touching any store.
pub fn link_text<I, S, F>(text: &str, terms: I, make_link: F) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: Fn(&str, &str) -> String,
{
    Ok(LinkRewriter::new(terms)?.rewrite(text, make_link))
}

/// Leading fence run of a trimmed line: its character and length.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    let marker = line.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let run = line.chars().take_while(|c| *c == marker).count();
    (run >= 3).then_some((marker, run))
}

fn linkable(term: &str) -> bool {
    !term.contains("[[") && !term.contains("]]")
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Outcome of a corpus-wide link pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkReport {
    pub documents_checked: usize,
    pub documents_modified: usize,
    /// Documents that failed to read or write.
    pub documents_failed: usize,
}

/// Applies a [`LinkRewriter`] to documents in a [`DocumentStore`].
pub struct Linker<'a> {
    store: &'a dyn DocumentStore,
    glossary: &'a GlossaryStore<'a>,
    protected: HashSet<String>,
}

impl<'a> Linker<'a> {
    /// `protected` lists paths that are never rewritten; the glossary's own
    /// path is always protected.
    pub fn new(
        store: &'a dyn DocumentStore,
        glossary: &'a GlossaryStore<'a>,
        protected: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut protected: HashSet<String> = protected.into_iter().collect();
        protected.insert(glossary.path().to_string());
        Self {
            store,
            glossary,
            protected,
        }
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.contains(path)
    }

    /// Link `terms` in one document. Returns whether the document changed.
    pub async fn link_document(&self, path: &str, terms: &[String]) -> Result<bool> {
        let rewriter = LinkRewriter::new(terms)?;
        self.link_with(path, &rewriter).await
    }

    /// Link one document with a prepared rewriter.
    ///
    /// Store errors propagate unchanged.
    pub async fn link_with(&self, path: &str, rewriter: &LinkRewriter) -> Result<bool> {
        if self.is_protected(path) || rewriter.is_empty() {
            return Ok(false);
        }
        let content = self.store.read(path).await?;
        let updated = rewriter.rewrite(&content, |term, display| {
            self.glossary.link_target(term, display)
        });
        if updated == content {
            return Ok(false);
        }
        self.store.write(path, &updated).await?;
        tracing::debug!(path = %path, "linked document");
        Ok(true)
    }

    /// Link every document of `corpus` in order.
    ///
    /// A document that fails to read or write is logged and counted; the
    /// pass continues with the next one.
    pub async fn link_all(
        &self,
        corpus: &[String],
        terms: &[String],
        progress: &dyn ProgressReporter,
    ) -> Result<LinkReport> {
        let rewriter = LinkRewriter::new(terms)?;
        let total = corpus.len() as u64;
        let mut report = LinkReport::default();

        for (i, path) in corpus.iter().enumerate() {
            if !self.is_protected(path) {
                report.documents_checked += 1;
                match self.link_with(path, &rewriter).await {
                    Ok(true) => report.documents_modified += 1,
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(path = %path, error = %e, "failed to link document");
                        report.documents_failed += 1;
                    }
                }
            }
            progress.report(ProgressEvent::Processing {
                pass: "link",
                n: i as u64 + 1,
                total,
            });
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::store::memory::InMemoryStore;

    fn wiki(term: &str, display: &str) -> String {
        format!("[[Glossary#{}|{}]]", term, display)
    }

    fn link(text: &str, terms: &[&str]) -> String {
        link_text(text, terms, wiki).unwrap()
    }

    #[test]
    fn test_master_equation_scenario() {
        let out = link("The Master Equation predicts X.", &["Master Equation"]);
        assert_eq!(out, "The [[Glossary#Master Equation|Master Equation]] predicts X.");
    }

    #[test]
    fn test_display_keeps_original_casing() {
        let out = link("the logos FIELD hums", &["Logos Field"]);
        assert_eq!(out, "the [[Glossary#Logos Field|logos FIELD]] hums");
    }

    #[test]
    fn test_only_first_mention_per_line() {
        let out = link("Logos Field and Logos Field\nLogos Field", &["Logos Field"]);
        assert_eq!(
            out,
            "[[Glossary#Logos Field|Logos Field]] and Logos Field\n[[Glossary#Logos Field|Logos Field]]"
        );
    }

    #[test]
    fn test_idempotent() {
        let terms = ["Logos Field", "Field", "Master Equation", "PEAR"];
        let text = "The Master Equation and the Logos Field.\nA Field near PEAR.\n\nfield work, PEAR again\n";
        let once = link(text, &terms);
        let twice = link(&once, &terms);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_longest_term_first() {
        let out = link("The Logos Field is a field.", &["Field", "Logos Field"]);
        assert_eq!(out, "The [[Glossary#Logos Field|Logos Field]] is a field.");
    }

    #[test]
    fn test_existing_links_are_respected() {
        let text = "See [[Master Equation]] and the Master Equation.";
        assert_eq!(link(text, &["Master Equation"]), text);

        let text = "See [the Master Equation](https://example.com) and Master Equation.";
        assert_eq!(link(text, &["Master Equation"]), text);
    }

    #[test]
    fn test_inline_code_is_not_linked() {
        let out = link("`PEAR` then PEAR", &["PEAR"]);
        assert_eq!(out, "`PEAR` then [[Glossary#PEAR|PEAR]]");
    }

    #[test]
    fn test_fenced_code_untouched() {
        let text = "Logos Field\n```\nLogos Field inside\n```\n~~~\nLogos Field\n~~~\nLogos Field";
        let out = link(text, &["Logos Field"]);
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines[1..7], ["```", "Logos Field inside", "```", "~~~", "Logos Field", "~~~"]);
        assert!(lines[0].starts_with("[[Glossary#"));
        assert!(lines[7].starts_with("[[Glossary#"));
    }

    #[test]
    fn test_tilde_line_inside_backtick_fence() {
        let text = "```markdown\n~~~\nLogos Field inside\n```\nLogos Field";
        assert_eq!(
            link(text, &["Logos Field"]),
            "```markdown\n~~~\nLogos Field inside\n```\n[[Glossary#Logos Field|Logos Field]]"
        );
    }

    #[test]
    fn test_backtick_line_inside_tilde_fence() {
        let text = "~~~\n```\nLogos Field inside\n```\n~~~\nLogos Field";
        assert_eq!(
            link(text, &["Logos Field"]),
            "~~~\n```\nLogos Field inside\n```\n~~~\n[[Glossary#Logos Field|Logos Field]]"
        );
    }

    #[test]
    fn test_fence_closes_only_on_long_enough_bare_run() {
        let text = "````\n```\nPEAR\n```\n````\nPEAR";
        assert_eq!(link(text, &["PEAR"]), "````\n```\nPEAR\n```\n````\n[[Glossary#PEAR|PEAR]]");

        // A run with an info string cannot close a fence.
        let text = "```\n```python\nPEAR\n```\nPEAR";
        assert_eq!(link(text, &["PEAR"]), "```\n```python\nPEAR\n```\n[[Glossary#PEAR|PEAR]]");

        // Two backticks are not a fence.
        assert_eq!(link("``\nPEAR", &["PEAR"]), "``\n[[Glossary#PEAR|PEAR]]");
    }

    #[test]
    fn test_bracketed_term_links_once() {
        let once = link("See Laws [I-X] here", &["Laws [I-X]"]);
        assert_eq!(once, "See [[Glossary#Laws [I-X]|Laws [I-X]]] here");
        assert_eq!(link(&once, &["Laws [I-X]"]), once);
    }

    #[test]
    fn test_terms_with_double_brackets_are_skipped() {
        let text = "a]]b and c[[d";
        assert_eq!(link(text, &["a]]b", "c[[d"]), text);
    }

    #[test]
    fn test_markup_characters_in_terms_stay_idempotent() {
        let special = ["Laws [I-X]", "[Draft]", "a|b", "C#", "x`y", "f(x)", "end]", "Ω-field"];
        let combined = "Laws [I-X], [Draft], a|b, C# and f(x) near end] and Ω-field";

        for term in special {
            let texts = [
                format!("See {} here and {} again.", term, term),
                format!("- {}\n```\n{}\n```\n{}", term, term, term),
                format!("[[{}]] then {}", term, term),
                combined.to_string(),
            ];
            for text in &texts {
                let once = link(text, &[term]);
                assert_eq!(link(&once, &[term]), once, "term {:?} in {:?}", term, text);
            }
        }

        let once = link(combined, &special);
        assert_eq!(link(&once, &special), once);
        assert_eq!(once.matches("[[Glossary#").count(), 7);
    }

    #[test]
    fn test_frontmatter_untouched() {
        let text = "---\ntitle: Logos Field\n---\nLogos Field\n--- Logos Field";
        let out = link(text, &["Logos Field"]);
        assert_eq!(
            out,
            "---\ntitle: Logos Field\n---\n[[Glossary#Logos Field|Logos Field]]\n--- Logos Field"
        );
    }

    #[test]
    fn test_preserves_trailing_newline_and_blank_lines() {
        let out = link("\nPEAR\n\n", &["PEAR"]);
        assert_eq!(out, "\n[[Glossary#PEAR|PEAR]]\n\n");
    }

    #[test]
    fn test_word_boundaries() {
        let text = "Fielding the subfield";
        assert_eq!(link(text, &["Field"]), text);
    }

    #[tokio::test]
    async fn test_link_document_reports_modification() {
        let store = InMemoryStore::with_documents([
            ("notes/a.md", "The Master Equation predicts X."),
            ("Glossary.md", "## Master Equation\n"),
        ]);
        let glossary = GlossaryStore::new(&store, "Glossary.md");
        let linker = Linker::new(&store, &glossary, Vec::new());
        let terms = glossary.terms().await;

        assert!(linker.link_document("notes/a.md", &terms).await.unwrap());
        assert_eq!(
            store.get("notes/a.md").unwrap(),
            "The [[Glossary#Master Equation|Master Equation]] predicts X."
        );
        assert!(!linker.link_document("notes/a.md", &terms).await.unwrap());
        assert!(!linker.link_document("Glossary.md", &terms).await.unwrap());
        assert_eq!(store.get("Glossary.md").unwrap(), "## Master Equation\n");
    }

    #[tokio::test]
    async fn test_link_document_with_bracketed_glossary_term() {
        let store = InMemoryStore::with_documents([
            ("a.md", "The Laws [I-X] hold."),
            ("Glossary.md", "## Laws [I-X]\n"),
        ]);
        let glossary = GlossaryStore::new(&store, "Glossary.md");
        let linker = Linker::new(&store, &glossary, Vec::new());
        let terms = glossary.terms().await;

        assert!(linker.link_document("a.md", &terms).await.unwrap());
        assert_eq!(
            store.get("a.md").unwrap(),
            "The [[Glossary#Laws I-X|Laws [I-X]]] hold."
        );
        assert!(!linker.link_document("a.md", &terms).await.unwrap());
    }

    #[tokio::test]
    async fn test_link_all_skips_protected_and_counts_failures() {
        let store = InMemoryStore::with_documents([
            ("a.md", "PEAR data"),
            ("b.md", "nothing here"),
            ("c.md", "PEAR again"),
            ("queue.md", "- [ ] **PEAR** (3 occurrences)"),
        ]);
        store.mark_unreadable("c.md");
        let glossary = GlossaryStore::new(&store, "Glossary.md");
        let linker = Linker::new(&store, &glossary, vec!["queue.md".to_string()]);
        let corpus = store.list().await.unwrap();
        let terms = vec!["PEAR".to_string()];

        let report = linker.link_all(&corpus, &terms, &NoProgress).await.unwrap();
        assert_eq!(report.documents_checked, 3);
        assert_eq!(report.documents_modified, 1);
        assert_eq!(report.documents_failed, 1);
        assert_eq!(store.get("queue.md").unwrap(), "- [ ] **PEAR** (3 occurrences)");
    }

    #[tokio::test]
    async fn test_missing_document_error_propagates() {
        let store = InMemoryStore::new();
        let glossary = GlossaryStore::new(&store, "Glossary.md");
        let linker = Linker::new(&store, &glossary, Vec::new());
        let terms = vec!["PEAR".to_string()];
        assert!(linker.link_document("missing.md", &terms).await.is_err());
    }
}
