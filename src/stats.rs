//! Glossary completeness and review backlog overview.
//!
//! Used by `gloss stats` to show how much of the glossary still carries
//! placeholder text and how many queued terms await review.

use anyhow::Result;
use glossary_harness_core::models::GlossaryEntry;

use crate::vault::{Outcome, Vault};

/// Counts shown by `gloss stats`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GlossaryStats {
    pub entries: usize,
    pub complete: usize,
    pub missing_brief: usize,
    pub missing_definition: usize,
    pub queued: usize,
    pub approved: usize,
    pub custom_terms: usize,
}

pub fn summarize(entries: &[GlossaryEntry]) -> GlossaryStats {
    GlossaryStats {
        entries: entries.len(),
        complete: entries.iter().filter(|e| e.is_complete()).count(),
        missing_brief: entries.iter().filter(|e| e.brief.is_none()).count(),
        missing_definition: entries.iter().filter(|e| e.definition.is_none()).count(),
        ..Default::default()
    }
}

pub async fn run_stats(vault: &Vault) -> Result<Outcome> {
    let glossary = vault.glossary();
    let entries = glossary.entries().await;
    let queue_entries = vault.queue().entries().await?;

    let mut stats = summarize(&entries);
    stats.queued = queue_entries.len();
    stats.approved = queue_entries.iter().filter(|e| e.approved).count();
    stats.custom_terms = vault.custom_terms().await.len();

    println!("Glossary Harness: Vault Stats");
    println!("=============================");
    println!();
    println!("  Vault:       {}", vault.store.root().display());
    println!("  Glossary:    {}", glossary.path());
    println!();
    println!("  Entries:     {}", stats.entries);
    println!(
        "  Complete:    {} / {} ({}%)",
        stats.complete,
        stats.entries,
        if stats.entries > 0 {
            (stats.complete * 100) / stats.entries
        } else {
            0
        }
    );
    println!("  No brief:    {}", stats.missing_brief);
    println!("  No definition: {}", stats.missing_definition);
    println!();
    println!("  Review queue: {} queued, {} approved", stats.queued, stats.approved);
    println!("  Custom terms: {}", stats.custom_terms);

    let incomplete: Vec<&str> = entries
        .iter()
        .filter(|e| !e.is_complete())
        .map(|e| e.term.as_str())
        .collect();
    if !incomplete.is_empty() {
        println!();
        println!("  Needs content:");
        for term in incomplete.iter().take(20) {
            println!("    - {}", term);
        }
        if incomplete.len() > 20 {
            println!("    ... and {} more", incomplete.len() - 20);
        }
    }
    println!();

    Ok(Outcome::Done)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(term: &str, brief: Option<&str>, definition: Option<&str>) -> GlossaryEntry {
        GlossaryEntry {
            term: term.to_string(),
            brief: brief.map(str::to_string),
            definition: definition.map(str::to_string),
            usages: Vec::new(),
        }
    }

    #[test]
    fn test_summarize_counts_placeholders() {
        let entries = vec![
            entry("PEAR", Some("Princeton lab"), Some("Long text")),
            entry("Logos Field", None, None),
            entry("Grace Function", Some("Short"), None),
        ];
        let stats = summarize(&entries);
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.complete, 1);
        assert_eq!(stats.missing_brief, 1);
        assert_eq!(stats.missing_definition, 2);
    }
}
