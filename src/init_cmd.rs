//! `gloss init`: create the glossary and the custom terms template.

use anyhow::{Context, Result};
use glossary_harness_core::store::DocumentStore;

use crate::vault::{Outcome, Vault};

pub const CUSTOM_TERMS_TEMPLATE: &str = "# Custom Terms
# One term per line. These are always detected, even when short or common,
# and are linked like glossary terms.
# Lines starting with # or // are ignored.

";

/// Idempotent: existing documents are left untouched.
pub async fn run_init(vault: &Vault) -> Result<Outcome> {
    let glossary = vault.glossary();
    let glossary_created = glossary.ensure_exists().await?;

    let custom_path = &vault.config.files.custom_terms;
    let custom_created = if vault.store.exists(custom_path).await? {
        false
    } else {
        vault
            .store
            .create(custom_path, CUSTOM_TERMS_TEMPLATE)
            .await
            .with_context(|| format!("Failed to create custom terms list: {}", custom_path))?;
        true
    };

    println!("init {}", vault.store.root().display());
    println!(
        "  glossary: {} ({})",
        glossary.path(),
        if glossary_created { "created" } else { "exists" }
    );
    println!(
        "  custom terms: {} ({})",
        custom_path,
        if custom_created { "created" } else { "exists" }
    );
    println!("ok");

    Ok(Outcome::Done)
}
