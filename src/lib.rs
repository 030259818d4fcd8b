// shopsync - Shopify bulk export orchestrator
// Copyright (c) 2025 Shopsync Contributors
// Licensed under the MIT License

//! # shopsync - Shopify bulk export orchestrator
//!
//! shopsync pulls entity data out of a Shopify store through GraphQL bulk
//! operations and writes it to local files as nested JSON.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Extracting** entities through bulk operations (submit, poll, download)
//! - **Verifying** the downloaded NDJSON artifact before it is used
//! - **Reconstructing** parent/child hierarchies from the flat `__parentId` stream
//! - **Managing** per-entity checkpoints for incremental sync
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (job, download, reconstruct, transform, state, sync)
//! - [`adapters`] - External integrations (Shopify Admin API, storage)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shopsync::config::load_config;
//! use shopsync::core::sync::SyncCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("shopsync.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//!     let coordinator = SyncCoordinator::from_config(config, shutdown_rx)?;
//!     let summary = coordinator.execute().await;
//!
//!     println!("Synced {} records", summary.total_records());
//!     Ok(())
//! }
//! ```
//!
//! ## Incremental Sync
//!
//! Each entity's checkpoint keeps the start time of its last fully successful
//! cycle. The next cycle asks only for records updated since that time minus
//! `sync.incremental_overlap_minutes`. A failed cycle leaves the time alone, so
//! nothing is skipped.
//!
//! ## Error Handling
//!
//! Library code returns [`domain::Result`], backed by [`domain::SyncError`].
//! [`domain::SyncError::is_retryable`] decides whether the extract unit may be
//! attempted again.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
