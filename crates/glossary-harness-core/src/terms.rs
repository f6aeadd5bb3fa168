//! Term list helpers shared by the detector, scanner, and linker.
//!
//! The custom terms document is a plain list with one literal term per line.
//! Lines starting with `#`, `//`, or `---` are comments or frontmatter
//! delimiters and are ignored, as are blank lines.

use std::collections::HashSet;
use std::ops::Range;

use anyhow::Result;
use regex::{Regex, RegexBuilder};

/// Parse a custom terms document into its literal terms, in file order.
pub fn parse_term_list(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with('#')
                && !line.starts_with("//")
                && !line.starts_with("---")
        })
        .filter(|line| seen.insert(line.to_string()))
        .map(str::to_string)
        .collect()
}

/// Lowercased set used for allow/deny membership tests.
pub fn lowercase_set<I, S>(terms: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    terms
        .into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Merge several term sources into the order the linker applies them.
///
/// Terms are deduplicated case-insensitively (first spelling wins) and
/// sorted longest first so that "Logos Field" is tried before "Field".
/// Ties keep their merge order.
pub fn linking_order<I, S>(terms: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut merged: Vec<String> = terms
        .into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect();
    merged.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
    merged
}

/// Word character as understood by `\b` in the detection patterns.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Case-insensitive, word-bounded matcher for one literal term.
///
/// A boundary is only required on an edge whose term character is itself a
/// word character, so terms such as `χ (chi operator)` still match.
#[derive(Debug, Clone)]
pub struct TermMatcher {
    term: String,
    regex: Regex,
    bounded_start: bool,
    bounded_end: bool,
}

impl TermMatcher {
    pub fn new(term: &str) -> Result<Self> {
        let regex = RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            term: term.to_string(),
            regex,
            bounded_start: term.chars().next().is_some_and(is_word_char),
            bounded_end: term.chars().last().is_some_and(is_word_char),
        })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// All word-bounded matches in `line`, left to right.
    pub fn find_all(&self, line: &str) -> Vec<Range<usize>> {
        let mut found = Vec::new();
        let mut pos = 0;
        while pos <= line.len() {
            let Some(m) = self.regex.find_at(line, pos) else {
                break;
            };
            if self.is_bounded(line, m.start(), m.end()) {
                found.push(m.range());
                pos = m.end().max(m.start() + 1);
            } else {
                pos = m.start() + line[m.start()..].chars().next().map_or(1, char::len_utf8);
            }
            while pos < line.len() && !line.is_char_boundary(pos) {
                pos += 1;
            }
        }
        found
    }

    fn is_bounded(&self, line: &str, start: usize, end: usize) -> bool {
        let before_ok = !self.bounded_start
            || line[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !is_word_char(c));
        let after_ok = !self.bounded_end
            || line[end..]
                .chars()
                .next()
                .map_or(true, |c| !is_word_char(c));
        before_ok && after_ok
    }
}
