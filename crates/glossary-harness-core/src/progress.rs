//! Progress events emitted by corpus-wide passes.
//!
//! Scanning and linking walk the vault one document at a time. After each
//! document they emit a [`ProgressEvent`] to a [`ProgressReporter`]; the CLI
//! renders these on stderr so stdout stays parseable.

/// A single progress event for a scan or link pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Listing documents (total unknown).
    Discovering { pass: &'static str },
    /// `n` documents processed out of `total`.
    Processing {
        pass: &'static str,
        n: u64,
        total: u64,
    },
}

/// Receives progress events from a pass.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}
