//! Document store abstraction for Glossary Harness.
//!
//! The [`DocumentStore`] trait is the only way the pipeline touches the
//! vault: whole-document reads and writes addressed by a vault-relative
//! path. No component caches document text across operations, so every
//! call observes the store's current content.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

/// Abstract document backend (filesystem vault, in-memory map, …).
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`read`](DocumentStore::read) | Current text of a document |
/// | [`write`](DocumentStore::write) | Replace a document's text atomically |
/// | [`list`](DocumentStore::list) | Paths of all candidate documents |
/// | [`exists`](DocumentStore::exists) | Whether a document exists |
/// | [`create`](DocumentStore::create) | Create a new document |
/// | [`delete`](DocumentStore::delete) | Remove a document if present |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the full text of a document.
    async fn read(&self, path: &str) -> Result<String>;

    /// Replace the full text of an existing or new document.
    ///
    /// Must be an all-or-nothing rewrite: readers never observe a partially
    /// written document.
    async fn write(&self, path: &str, text: &str) -> Result<()>;

    /// List the paths of all documents eligible for scanning and linking,
    /// sorted for deterministic ordering.
    async fn list(&self) -> Result<Vec<String>>;

    /// Whether a document exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Create a document with `initial_text`, creating parent folders as
    /// needed. Fails if the document already exists.
    async fn create(&self, path: &str, initial_text: &str) -> Result<()>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete(&self, path: &str) -> Result<()>;
}
