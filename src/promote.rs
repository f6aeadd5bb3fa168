//! `gloss promote`: move approved review entries into the glossary.
//!
//! Approved entries already present in the glossary are not pending, so
//! running promotion twice reports "no pending terms" the second time even
//! when `review.clear_after_promote` is off.

use anyhow::Result;
use glossary_harness_core::models::ReviewEntry;

use crate::vault::{Outcome, Vault};

pub async fn run_promote(vault: &Vault) -> Result<Outcome> {
    let queue = vault.queue();
    let glossary = vault.glossary();

    let known = glossary.terms().await;
    let pending: Vec<ReviewEntry> = queue
        .approved_entries()
        .await?
        .into_iter()
        .filter(|e| !known.contains(&e.term))
        .collect();

    println!("promote");
    if pending.is_empty() {
        println!("  no pending terms");
        return Ok(Outcome::NothingToDo);
    }

    let added = glossary.add_entries(&pending).await?;
    for entry in &pending {
        println!("  + {} ({} occurrences)", entry.term, entry.count);
    }
    println!("  added to {}: {}", glossary.path(), added);

    if vault.config.review.clear_after_promote {
        queue.clear().await?;
        println!("  cleared {}", queue.path());
    }
    println!("ok");

    Ok(Outcome::Done)
}
