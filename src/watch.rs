//! `gloss watch`: link documents as they change.
//!
//! A `notify` watcher runs on its own thread and forwards changed paths into
//! a tokio channel. Paths are collected until the vault has been quiet for
//! `linking.debounce_ms`, then the batch is linked sequentially with the
//! terms current at that moment. An edit to the glossary or the custom
//! terms list relinks the whole vault.
//!
//! The linker's own writes raise another event for the same documents; the
//! follow-up pass finds nothing to change, so the loop settles.

use anyhow::{Context, Result};
use glossary_harness_core::link::{LinkReport, Linker};
use glossary_harness_core::progress::NoProgress;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::vault::{Outcome, Vault};

/// What a debounced batch of filesystem events asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Batch {
    /// A term source changed: relink every document.
    RelinkAll,
    /// Link these vault-relative documents.
    Documents(Vec<String>),
    Nothing,
}

/// Classify the changed absolute paths of one batch.
pub fn plan(vault: &Vault, changed: &BTreeSet<PathBuf>) -> Batch {
    let files = &vault.config.files;
    let excluded = &vault.config.scan.excluded_prefixes;
    let mut documents = Vec::new();

    for path in changed {
        let Some(relative) = vault.store.relative_path(path) else {
            continue;
        };
        if relative == files.glossary || relative == files.custom_terms {
            return Batch::RelinkAll;
        }
        if relative == files.review_queue || !vault.store.is_candidate(&relative) {
            continue;
        }
        if excluded
            .iter()
            .any(|p| glossary_harness_core::scan::is_under(&relative, p))
        {
            continue;
        }
        documents.push(relative);
    }

    if documents.is_empty() {
        Batch::Nothing
    } else {
        Batch::Documents(documents)
    }
}

async fn link_batch(vault: &Vault, batch: &Batch) -> Result<Option<LinkReport>> {
    let corpus = match batch {
        Batch::Nothing => return Ok(None),
        Batch::RelinkAll => vault.link_corpus().await?,
        Batch::Documents(paths) => paths.clone(),
    };
    let terms = vault.link_terms().await;
    if terms.is_empty() {
        return Ok(None);
    }
    let glossary = vault.glossary();
    let linker = Linker::new(&vault.store, &glossary, vault.config.files.control_documents());
    let report = linker.link_all(&corpus, &terms, &NoProgress).await?;
    Ok(Some(report))
}

pub async fn run_watch(vault: &Vault) -> Result<Outcome> {
    let (tx, mut rx) = mpsc::channel::<PathBuf>(256);

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                for path in event.paths {
                    let _ = tx.blocking_send(path);
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "watch error"),
        },
        notify::Config::default(),
    )
    .context("Failed to start file watcher")?;
    watcher
        .watch(vault.store.root(), RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", vault.store.root().display()))?;

    let debounce = Duration::from_millis(vault.config.linking.debounce_ms);
    println!("watch {}", vault.store.root().display());
    println!("  debounce: {} ms (Ctrl-C to stop)", debounce.as_millis());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let first = tokio::select! {
            _ = &mut shutdown => break,
            path = rx.recv() => match path {
                Some(path) => path,
                None => break,
            },
        };

        let mut changed = BTreeSet::new();
        changed.insert(first);
        while let Ok(Some(path)) = tokio::time::timeout(debounce, rx.recv()).await {
            changed.insert(path);
        }

        let batch = plan(vault, &changed);
        tracing::debug!(?batch, "debounced batch");
        match link_batch(vault, &batch).await {
            Ok(Some(report)) if report.documents_modified > 0 || report.documents_failed > 0 => {
                println!(
                    "{}  linked {} of {} documents{}",
                    chrono::Local::now().format("%H:%M:%S"),
                    report.documents_modified,
                    report.documents_checked,
                    if report.documents_failed > 0 {
                        format!(" ({} failed)", report.documents_failed)
                    } else {
                        String::new()
                    }
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "link pass failed"),
        }
    }

    drop(watcher);
    println!("ok");
    Ok(Outcome::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    fn vault(dir: &TempDir) -> Vault {
        Vault::open(Config::minimal(dir.path())).unwrap()
    }

    fn changed(dir: &TempDir, paths: &[&str]) -> BTreeSet<PathBuf> {
        let root = dir.path().canonicalize().unwrap();
        paths.iter().map(|p| root.join(p)).collect()
    }

    #[test]
    fn test_plan_links_changed_notes() {
        let dir = TempDir::new().unwrap();
        let v = vault(&dir);
        let batch = plan(&v, &changed(&dir, &["notes/a.md", "notes/.a.md.tmp", "img.png"]));
        assert_eq!(batch, Batch::Documents(vec!["notes/a.md".to_string()]));
    }

    #[test]
    fn test_plan_relinks_on_glossary_change() {
        let dir = TempDir::new().unwrap();
        let v = vault(&dir);
        assert_eq!(plan(&v, &changed(&dir, &["a.md", "Glossary.md"])), Batch::RelinkAll);
        assert_eq!(plan(&v, &changed(&dir, &["Custom_Terms.md"])), Batch::RelinkAll);
    }

    #[test]
    fn test_plan_ignores_queue_and_excluded_folders() {
        let dir = TempDir::new().unwrap();
        let v = vault(&dir);
        let batch = plan(&v, &changed(&dir, &["_term_review_queue.md", "Assets/x.md"]));
        assert_eq!(batch, Batch::Nothing);
    }

    #[tokio::test]
    async fn test_link_batch_is_idempotent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Glossary.md"), "# Central Glossary\n\n## PEAR\n").unwrap();
        fs::write(dir.path().join("a.md"), "PEAR results").unwrap();
        let v = vault(&dir);
        let batch = Batch::Documents(vec!["a.md".to_string()]);

        let first = link_batch(&v, &batch).await.unwrap().unwrap();
        assert_eq!(first.documents_modified, 1);
        let second = link_batch(&v, &batch).await.unwrap().unwrap();
        assert_eq!(second.documents_modified, 0);
        assert_eq!(
            fs::read_to_string(dir.path().join("a.md")).unwrap(),
            "[[Glossary#PEAR|PEAR]] results"
        );
    }
}
