//! TOML configuration for the `gloss` binary.
//!
//! Every section is optional except `[vault]`; missing keys fall back to the
//! defaults below. [`load_config`] validates the result before any command
//! touches the vault, so a bad config never causes a partial write.
//!
//! ```toml
//! [vault]
//! root = "./vault"
//!
//! [scan]
//! scope = "local"
//! scoped_folder = "Research"
//! min_frequency = 5
//! ```

use anyhow::{bail, Context, Result};
use glossary_harness_core::detect::{DetectorSettings, DEFAULT_MIN_TERM_LENGTH};
use glossary_harness_core::queue::ConfidenceBands;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub vault: VaultConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub review: ReviewConfig,
    #[serde(default)]
    pub linking: LinkingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VaultConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string()]
}

/// Vault-relative paths of the pipeline's own documents.
#[derive(Debug, Deserialize, Clone)]
pub struct FilesConfig {
    #[serde(default = "default_glossary")]
    pub glossary: String,
    #[serde(default = "default_review_queue")]
    pub review_queue: String,
    #[serde(default = "default_custom_terms")]
    pub custom_terms: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            glossary: default_glossary(),
            review_queue: default_review_queue(),
            custom_terms: default_custom_terms(),
        }
    }
}

impl FilesConfig {
    /// The control documents, which are never scanned or linked.
    pub fn control_documents(&self) -> Vec<String> {
        vec![
            self.glossary.clone(),
            self.review_queue.clone(),
            self.custom_terms.clone(),
        ]
    }
}

fn default_glossary() -> String {
    "Glossary.md".to_string()
}
fn default_review_queue() -> String {
    "_term_review_queue.md".to_string()
}
fn default_custom_terms() -> String {
    "Custom_Terms.md".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanScope {
    Global,
    Local,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    #[serde(default = "default_scope")]
    pub scope: ScanScope,
    #[serde(default)]
    pub scoped_folder: String,
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,
    #[serde(default = "default_min_frequency")]
    pub min_frequency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scope: default_scope(),
            scoped_folder: String::new(),
            excluded_prefixes: default_excluded_prefixes(),
            min_frequency: default_min_frequency(),
        }
    }
}

impl ScanConfig {
    /// Folder the scan is restricted to, if any.
    pub fn scope_folder(&self) -> Option<String> {
        match self.scope {
            ScanScope::Global => None,
            ScanScope::Local => Some(self.scoped_folder.clone()),
        }
    }
}

fn default_scope() -> ScanScope {
    ScanScope::Global
}
fn default_excluded_prefixes() -> Vec<String> {
    ["Assets", "assets", "_Assets", ".obsidian", "audio", "Audio"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_min_frequency() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectionConfig {
    #[serde(default)]
    pub custom_terms_only: bool,
    #[serde(default = "default_true")]
    pub equations: bool,
    #[serde(default = "default_true")]
    pub phrases: bool,
    #[serde(default = "default_true")]
    pub acronyms: bool,
    #[serde(default = "default_true")]
    pub citations: bool,
    #[serde(default = "default_true")]
    pub technical: bool,
    #[serde(default)]
    pub math: bool,
    #[serde(default = "default_min_term_length")]
    pub min_term_length: usize,
    /// Extra allow-list terms on top of the custom terms document.
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            custom_terms_only: false,
            equations: true,
            phrases: true,
            acronyms: true,
            citations: true,
            technical: true,
            math: false,
            min_term_length: default_min_term_length(),
            allow: Vec::new(),
            deny: Vec::new(),
        }
    }
}

impl DetectionConfig {
    pub fn detector_settings(&self) -> DetectorSettings {
        DetectorSettings {
            equations: self.equations,
            phrases: self.phrases,
            acronyms: self.acronyms,
            citations: self.citations,
            technical: self.technical,
            math: self.math,
            min_term_length: self.min_term_length,
            deny: self.deny.clone(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_min_term_length() -> usize {
    DEFAULT_MIN_TERM_LENGTH
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReviewConfig {
    #[serde(default = "default_high_threshold")]
    pub high_threshold: usize,
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: usize,
    #[serde(default = "default_true")]
    pub preserve_approvals: bool,
    #[serde(default = "default_true")]
    pub clear_after_promote: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            high_threshold: default_high_threshold(),
            medium_threshold: default_medium_threshold(),
            preserve_approvals: true,
            clear_after_promote: true,
        }
    }
}

impl ReviewConfig {
    pub fn bands(&self) -> ConfidenceBands {
        ConfidenceBands {
            high: self.high_threshold,
            medium: self.medium_threshold,
        }
    }
}

fn default_high_threshold() -> usize {
    10
}
fn default_medium_threshold() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct LinkingConfig {
    /// Also link custom terms that are not yet in the glossary.
    #[serde(default = "default_true")]
    pub include_allow_list: bool,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            include_allow_list: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    500
}

impl Config {
    /// All defaults over the given vault root.
    pub fn minimal(root: impl Into<PathBuf>) -> Self {
        Self {
            vault: VaultConfig {
                root: root.into(),
                include_globs: default_include_globs(),
                exclude_globs: Vec::new(),
                follow_symlinks: false,
            },
            files: FilesConfig::default(),
            scan: ScanConfig::default(),
            detection: DetectionConfig::default(),
            review: ReviewConfig::default(),
            linking: LinkingConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Relative vault roots are resolved against the config file's directory.
    if config.vault.root.is_relative() {
        if let Some(parent) = path.parent() {
            config.vault.root = parent.join(&config.vault.root);
        }
    }

    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if !config.vault.root.is_dir() {
        bail!(
            "vault.root does not exist or is not a directory: {}",
            config.vault.root.display()
        );
    }

    if config.vault.include_globs.is_empty() {
        bail!("vault.include_globs must not be empty");
    }

    for (key, value) in [
        ("files.glossary", &config.files.glossary),
        ("files.review_queue", &config.files.review_queue),
        ("files.custom_terms", &config.files.custom_terms),
    ] {
        if value.trim().is_empty() {
            bail!("{} must not be empty", key);
        }
    }

    if config.scan.scope == ScanScope::Local && config.scan.scoped_folder.trim().is_empty() {
        bail!("scan.scoped_folder must be set when scan.scope = \"local\"");
    }

    if config.scan.min_frequency == 0 {
        bail!("scan.min_frequency must be >= 1");
    }

    if config.detection.min_term_length == 0 {
        bail!("detection.min_term_length must be >= 1");
    }

    if config.review.medium_threshold >= config.review.high_threshold {
        bail!(
            "review.medium_threshold ({}) must be below review.high_threshold ({})",
            config.review.medium_threshold,
            config.review.high_threshold
        );
    }

    Ok(())
}
