//! In-memory [`DocumentStore`] implementation for tests and embedding.
//!
//! Uses a `BTreeMap` behind `std::sync::RwLock`, so [`list`](DocumentStore::list)
//! is naturally sorted.

use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use super::DocumentStore;

/// In-memory vault keyed by document path.
pub struct InMemoryStore {
    docs: RwLock<BTreeMap<String, String>>,
    /// Paths whose reads fail, to exercise per-document error handling.
    unreadable: RwLock<HashSet<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
            unreadable: RwLock::new(HashSet::new()),
        }
    }

    /// Build a store from `(path, text)` pairs.
    pub fn with_documents<I, P, T>(documents: I) -> Self
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<String>,
        T: Into<String>,
    {
        let store = Self::new();
        {
            let mut docs = store.docs.write().unwrap();
            for (path, text) in documents {
                docs.insert(path.into(), text.into());
            }
        }
        store
    }

    /// Make reads of `path` fail while the document stays listed.
    pub fn mark_unreadable(&self, path: &str) {
        self.unreadable.write().unwrap().insert(path.to_string());
    }

    /// Synchronous snapshot of a document, for assertions.
    pub fn get(&self, path: &str) -> Option<String> {
        self.docs.read().unwrap().get(path).cloned()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn read(&self, path: &str) -> Result<String> {
        if self.unreadable.read().unwrap().contains(path) {
            bail!("document is unreadable: {}", path);
        }
        self.docs
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("document not found: {}", path))
    }

    async fn write(&self, path: &str, text: &str) -> Result<()> {
        self.docs
            .write()
            .unwrap()
            .insert(path.to_string(), text.to_string());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.docs.read().unwrap().keys().cloned().collect())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.docs.read().unwrap().contains_key(path))
    }

    async fn create(&self, path: &str, initial_text: &str) -> Result<()> {
        let mut docs = self.docs.write().unwrap();
        if docs.contains_key(path) {
            bail!("document already exists: {}", path);
        }
        docs.insert(path.to_string(), initial_text.to_string());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.docs.write().unwrap().remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_read() {
        let store = InMemoryStore::new();
        store.create("notes/a.md", "hello").await.unwrap();
        assert_eq!(store.read("notes/a.md").await.unwrap(), "hello");
        assert!(store.create("notes/a.md", "again").await.is_err());
    }

    #[tokio::test]
    async fn test_list_sorted_and_delete() {
        let store = InMemoryStore::with_documents([("b.md", ""), ("a.md", "")]);
        assert_eq!(store.list().await.unwrap(), vec!["a.md", "b.md"]);
        store.delete("a.md").await.unwrap();
        store.delete("missing.md").await.unwrap();
        assert!(!store.exists("a.md").await.unwrap());
    }

    #[tokio::test]
    async fn test_unreadable_document() {
        let store = InMemoryStore::with_documents([("a.md", "text")]);
        store.mark_unreadable("a.md");
        assert!(store.read("a.md").await.is_err());
        assert!(store.exists("a.md").await.unwrap());
    }
}
