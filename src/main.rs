//! # Glossary Harness CLI (`gloss`)
//!
//! ## Usage
//!
//! ```bash
//! gloss --config ./config/gloss.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `gloss init` | Create the glossary and custom terms list if missing |
//! | `gloss scan` | Detect candidate terms and regenerate the review queue |
//! | `gloss promote` | Move approved terms into the glossary |
//! | `gloss link [PATH]` | Link glossary terms in one note or the whole vault |
//! | `gloss watch` | Link notes as they change |
//! | `gloss stats` | Glossary completeness and review backlog |
//!
//! ## Exit status
//!
//! `0` when the command did work, `1` when there was nothing to do (no
//! approved terms, nothing to link), `2` on any error.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use glossary_harness::config;
use glossary_harness::progress::ProgressMode;
use glossary_harness::scan_cmd::ScanOverrides;
use glossary_harness::vault::{Outcome, Vault};
use glossary_harness::{init_cmd, link_cmd, promote, scan_cmd, stats, watch};

/// Glossary Harness CLI: a term lifecycle and cross-linking pipeline for
/// markdown vaults.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/gloss.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "gloss",
    about = "Glossary Harness: detect, review, promote and link glossary terms in a markdown vault",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/gloss.toml")]
    config: PathBuf,

    /// Progress output on stderr. Defaults to `human` on a terminal, `off` otherwise.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the glossary and the custom terms list if they are missing.
    ///
    /// Safe to run repeatedly; existing documents are never modified.
    Init,

    /// Detect candidate terms and regenerate the review queue.
    ///
    /// Terms already in the glossary are not queued. Ticked items in the
    /// previous queue stay ticked when `review.preserve_approvals` is set.
    Scan {
        /// Only scan notes under this vault folder.
        #[arg(long)]
        scope: Option<String>,

        /// Drop terms seen fewer times than this.
        #[arg(long)]
        min_frequency: Option<usize>,
    },

    /// Move ticked review queue items into the glossary.
    Promote,

    /// Link glossary terms in one note, or in every note of the vault.
    Link {
        /// Vault-relative (or absolute) path of the note to link.
        path: Option<String>,
    },

    /// Watch the vault and link notes as they change.
    Watch,

    /// Show glossary completeness and the review backlog.
    Stats,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GLOSS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run(cli: Cli) -> anyhow::Result<Outcome> {
    let cfg = config::load_config(&cli.config)?;
    let vault = Vault::open(cfg)?;
    let reporter = cli
        .progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .reporter();

    match cli.command {
        Commands::Init => init_cmd::run_init(&vault).await,
        Commands::Scan {
            scope,
            min_frequency,
        } => {
            let overrides = ScanOverrides {
                scope,
                min_frequency,
            };
            scan_cmd::run_scan(&vault, &overrides, reporter.as_ref()).await
        }
        Commands::Promote => promote::run_promote(&vault).await,
        Commands::Link { path } => {
            link_cmd::run_link(&vault, path.as_deref(), reporter.as_ref()).await
        }
        Commands::Watch => watch::run_watch(&vault).await,
        Commands::Stats => stats::run_stats(&vault).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::NothingToDo) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
