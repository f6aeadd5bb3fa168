//! `gloss link`: link glossary terms in one document or the whole vault.

use anyhow::Result;
use glossary_harness_core::link::Linker;
use glossary_harness_core::progress::{ProgressEvent, ProgressReporter};
use std::path::Path;

use crate::vault::{Outcome, Vault};

/// Accept either a vault-relative path or a path inside the vault root.
pub fn vault_relative(vault: &Vault, path: &str) -> String {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        let resolved = candidate
            .canonicalize()
            .unwrap_or_else(|_| candidate.to_path_buf());
        if let Some(relative) = vault.store.relative_path(&resolved) {
            return relative;
        }
    }
    path.replace('\\', "/").trim_start_matches("./").to_string()
}

pub async fn run_link(
    vault: &Vault,
    path: Option<&str>,
    progress: &dyn ProgressReporter,
) -> Result<Outcome> {
    let terms = vault.link_terms().await;
    let glossary = vault.glossary();
    let linker = Linker::new(&vault.store, &glossary, vault.config.files.control_documents());

    match path {
        Some(path) => {
            let path = vault_relative(vault, path);
            println!("link {}", path);
            if terms.is_empty() {
                println!("  nothing to link");
                return Ok(Outcome::NothingToDo);
            }
            if linker.is_protected(&path) {
                println!("  protected document, not linked");
                return Ok(Outcome::NothingToDo);
            }
            if linker.link_document(&path, &terms).await? {
                println!("  modified");
                println!("ok");
                Ok(Outcome::Done)
            } else {
                println!("  not modified");
                Ok(Outcome::NothingToDo)
            }
        }
        None => {
            println!("link {}", vault.store.root().display());
            if terms.is_empty() {
                println!("  nothing to link");
                return Ok(Outcome::NothingToDo);
            }

            progress.report(ProgressEvent::Discovering { pass: "link" });
            let corpus = vault.link_corpus().await?;
            let report = linker.link_all(&corpus, &terms, progress).await?;

            println!("  terms: {}", terms.len());
            println!("  documents checked: {}", report.documents_checked);
            println!("  documents modified: {}", report.documents_modified);
            if report.documents_failed > 0 {
                println!("  documents failed: {}", report.documents_failed);
            }

            if report.documents_modified == 0 {
                println!("  nothing to link");
                return Ok(Outcome::NothingToDo);
            }
            println!("ok");
            Ok(Outcome::Done)
        }
    }
}
