//! # Glossary Harness
//!
//! A term lifecycle and cross-linking pipeline for markdown vaults.
//!
//! Glossary Harness finds recurring candidate terms across a vault, queues
//! them for human review, promotes approved terms into a central glossary,
//! and links mentions of glossary terms back to their entries. Linking is
//! idempotent, so it can run on every save.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌────────────┐   ┌──────────┐
//! │   Scan   │──▶│ Review queue │──▶│  Glossary  │──▶│  Linker  │
//! │ (detect) │   │ (human tick) │   │ (promote)  │   │ (notes)  │
//! └──────────┘   └──────────────┘   └────────────┘   └──────────┘
//! ```
//!
//! The pipeline logic lives in `glossary-harness-core`; this crate adds the
//! TOML config, the filesystem store and the `gloss` commands.
//!
//! ## Quick Start
//!
//! ```bash
//! gloss init                    # create Glossary.md and Custom_Terms.md
//! gloss scan                    # write _term_review_queue.md
//! gloss promote                 # move ticked terms into the glossary
//! gloss link                    # link glossary terms across the vault
//! gloss watch                   # keep linking as notes change
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`store_fs`] | Filesystem document store |
//! | [`vault`] | Shared command context |
//! | [`scan_cmd`] | `gloss scan` |
//! | [`promote`] | `gloss promote` |
//! | [`link_cmd`] | `gloss link` |
//! | [`watch`] | `gloss watch` |
//! | [`stats`] | `gloss stats` |
//! | [`progress`] | Progress reporting on stderr |

pub mod config;
pub mod init_cmd;
pub mod link_cmd;
pub mod progress;
pub mod promote;
pub mod scan_cmd;
pub mod stats;
pub mod store_fs;
pub mod vault;
pub mod watch;
