//! Filesystem-backed [`DocumentStore`] over a vault directory.
//!
//! Documents are addressed by their `/`-separated path relative to the vault
//! root. [`list`](DocumentStore::list) walks the vault with `walkdir` and
//! keeps files matching the include globs and none of the exclude globs
//! (plus the built-in excludes for `.git`, `.obsidian`, `node_modules` and
//! `target`). Writes go to a temporary sibling file that is then renamed
//! over the target, so a crash never leaves a half-written note.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use glossary_harness_core::store::DocumentStore;

use crate::config::Config;

const DEFAULT_EXCLUDES: &[&str] = &[
    "**/.git/**",
    "**/.obsidian/**",
    "**/node_modules/**",
    "**/target/**",
];

pub struct FsStore {
    root: PathBuf,
    include_set: GlobSet,
    exclude_set: GlobSet,
    follow_symlinks: bool,
}

impl FsStore {
    pub fn new(
        root: impl Into<PathBuf>,
        include_globs: &[String],
        exclude_globs: &[String],
        follow_symlinks: bool,
    ) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            bail!("Vault root does not exist: {}", root.display());
        }
        // Watcher events carry canonical paths.
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve vault root: {}", root.display()))?;

        let mut excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
        excludes.extend(exclude_globs.iter().cloned());

        Ok(Self {
            root,
            include_set: build_globset(include_globs)?,
            exclude_set: build_globset(&excludes)?,
            follow_symlinks,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.vault.root,
            &config.vault.include_globs,
            &config.vault.exclude_globs,
            config.vault.follow_symlinks,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a vault-relative path would be listed.
    pub fn is_candidate(&self, relative: &str) -> bool {
        self.include_set.is_match(relative) && !self.exclude_set.is_match(relative)
    }

    /// Vault-relative form of an absolute path inside the vault.
    pub fn relative_path(&self, absolute: &Path) -> Option<String> {
        let relative = absolute.strip_prefix(&self.root).ok()?;
        Some(normalize(relative))
    }

    /// Absolute path for a vault-relative one. Paths that would escape the
    /// vault are rejected.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if path.is_empty() || escapes {
            bail!("Invalid vault path: {}", path);
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DocumentStore for FsStore {
    async fn read(&self, path: &str) -> Result<String> {
        let full = self.resolve(path)?;
        tokio::fs::read_to_string(&full)
            .await
            .with_context(|| format!("Failed to read {}", full.display()))
    }

    async fn write(&self, path: &str, text: &str) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let file_name = full
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let tmp = full.with_file_name(format!(".{}.tmp", file_name));

        tokio::fs::write(&tmp, text)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        if let Err(e) = tokio::fs::rename(&tmp, &full).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("Failed to replace {}", full.display()));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut paths = Vec::new();

        let walker = WalkDir::new(&self.root).follow_links(self.follow_symlinks);
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable vault entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(rel_str) = self.relative_path(entry.path()) else {
                continue;
            };
            if self.is_candidate(&rel_str) {
                paths.push(rel_str);
            }
        }

        paths.sort();
        Ok(paths)
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path)?;
        match tokio::fs::metadata(&full).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to stat {}", full.display())),
        }
    }

    async fn create(&self, path: &str, initial_text: &str) -> Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .await
            .with_context(|| format!("Failed to create {}", full.display()))?;
        file.write_all(initial_text.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", full.display()))?;
        file.flush().await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", full.display())),
        }
    }
}

fn normalize(relative: &Path) -> String {
    relative.to_string_lossy().replace('\\', "/")
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}
