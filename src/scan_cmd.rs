//! `gloss scan`: aggregate candidate terms and regenerate the review queue.

use anyhow::{bail, Result};
use glossary_harness_core::progress::{ProgressEvent, ProgressReporter};
use glossary_harness_core::scan::{scan, ScanOptions};
use glossary_harness_core::store::DocumentStore;

use crate::vault::{Outcome, Vault};

/// Command-line overrides for the `[scan]` section.
#[derive(Debug, Clone, Default)]
pub struct ScanOverrides {
    /// Restrict to this folder, regardless of `scan.scope`.
    pub scope: Option<String>,
    pub min_frequency: Option<usize>,
}

pub async fn build_options(vault: &Vault, overrides: &ScanOverrides) -> Result<ScanOptions> {
    let cfg = &vault.config;
    let min_frequency = overrides.min_frequency.unwrap_or(cfg.scan.min_frequency);
    if min_frequency == 0 {
        bail!("--min-frequency must be >= 1");
    }

    Ok(ScanOptions {
        scope: overrides.scope.clone().or_else(|| cfg.scan.scope_folder()),
        excluded_prefixes: cfg.scan.excluded_prefixes.clone(),
        skip_paths: cfg.files.control_documents(),
        allow_list: vault.allow_list().await,
        min_frequency,
        custom_terms_only: cfg.detection.custom_terms_only,
        detector: cfg.detection.detector_settings(),
    })
}

pub async fn run_scan(
    vault: &Vault,
    overrides: &ScanOverrides,
    progress: &dyn ProgressReporter,
) -> Result<Outcome> {
    let options = build_options(vault, overrides).await?;

    progress.report(ProgressEvent::Discovering { pass: "scan" });
    let corpus = vault.store.list().await?;
    let report = scan(&vault.store, &corpus, &options, progress).await?;

    let known = vault.glossary().terms().await;
    let queue = vault.queue();
    let summary = queue
        .generate(
            &report,
            &known,
            &options.allow_list,
            vault.config.review.preserve_approvals,
        )
        .await?;

    tracing::info!(
        scanned = report.documents_scanned,
        skipped = report.documents_skipped,
        queued = summary.queued,
        "scan complete"
    );

    println!("scan {}", options.scope.as_deref().unwrap_or("(whole vault)"));
    println!("  documents scanned: {}", report.documents_scanned);
    if report.documents_skipped > 0 {
        println!("  documents skipped: {}", report.documents_skipped);
    }
    println!("  occurrences: {}", report.total_occurrences);
    println!(
        "  terms found: {} (min frequency {})",
        report.aggregates.len(),
        options.min_frequency
    );
    println!("  already in glossary: {}", summary.already_known);
    println!("  queued for review: {}", summary.queued);
    if summary.approvals_kept > 0 {
        println!("  approvals kept: {}", summary.approvals_kept);
    }
    println!("  review queue: {}", queue.path());
    println!("ok");

    Ok(Outcome::Done)
}
