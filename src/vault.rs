//! Shared command context: the configured vault and its control documents.

use anyhow::Result;
use glossary_harness_core::glossary::GlossaryStore;
use glossary_harness_core::queue::ReviewQueue;
use glossary_harness_core::scan::is_under;
use glossary_harness_core::store::DocumentStore;
use glossary_harness_core::terms::{linking_order, parse_term_list};

use crate::config::Config;
use crate::store_fs::FsStore;

/// Result of a command, mapped to the process exit status by `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command did its work (exit 0).
    Done,
    /// There was nothing to do, e.g. no approved terms (exit 1).
    NothingToDo,
}

pub struct Vault {
    pub config: Config,
    pub store: FsStore,
}

impl Vault {
    pub fn open(config: Config) -> Result<Self> {
        let store = FsStore::from_config(&config)?;
        Ok(Self { config, store })
    }

    pub fn glossary(&self) -> GlossaryStore<'_> {
        GlossaryStore::new(&self.store, self.config.files.glossary.clone())
    }

    pub fn queue(&self) -> ReviewQueue<'_> {
        ReviewQueue::new(
            &self.store,
            self.config.files.review_queue.clone(),
            self.config.review.bands(),
        )
    }

    /// Terms listed in the custom terms document. Missing or unreadable
    /// documents yield an empty list.
    pub async fn custom_terms(&self) -> Vec<String> {
        let path = &self.config.files.custom_terms;
        match self.store.exists(path).await {
            Ok(true) => {}
            Ok(false) => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "custom terms unavailable");
                return Vec::new();
            }
        }
        match self.store.read(path).await {
            Ok(content) => parse_term_list(&content),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "custom terms unreadable");
                Vec::new()
            }
        }
    }

    /// Custom terms document plus `detection.allow`, in that order.
    pub async fn allow_list(&self) -> Vec<String> {
        let mut terms = self.custom_terms().await;
        for term in &self.config.detection.allow {
            if !terms.contains(term) {
                terms.push(term.clone());
            }
        }
        terms
    }

    /// Terms the linker applies: glossary terms, plus the allow-list when
    /// `linking.include_allow_list` is set.
    pub async fn link_terms(&self) -> Vec<String> {
        let mut terms = self.glossary().terms().await;
        if self.config.linking.include_allow_list {
            terms.extend(self.allow_list().await);
        }
        linking_order(terms)
    }

    /// Documents eligible for linking: every listed document outside the
    /// excluded folders. Control documents are filtered by the linker.
    pub async fn link_corpus(&self) -> Result<Vec<String>> {
        let excluded = &self.config.scan.excluded_prefixes;
        Ok(self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|path| !excluded.iter().any(|p| is_under(path, p)))
            .collect())
    }
}
