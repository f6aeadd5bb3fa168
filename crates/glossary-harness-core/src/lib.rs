//! # Glossary Harness Core
//!
//! Storage-agnostic logic for Glossary Harness: candidate term detection,
//! vault scanning, the review queue, the glossary document, and idempotent
//! cross-linking.
//!
//! Every component reads and writes documents through the
//! [`store::DocumentStore`] trait. This crate contains no filesystem I/O;
//! the `glossary-harness` binary crate provides a filesystem store, and
//! [`store::memory::InMemoryStore`] is available for tests and embedding.

pub mod detect;
pub mod glossary;
pub mod link;
pub mod models;
pub mod progress;
pub mod queue;
pub mod scan;
pub mod store;
pub mod terms;
