//! Core business logic for shopsync.
//!
//! # Modules
//!
//! - [`job`] - Bulk job state machine (slot wait, submit, poll, timeout)
//! - [`download`] - Streaming artifact download and integrity check
//! - [`reconstruct`] - Parent/child tree reconstruction
//! - [`transform`] - Output shaping (preserve and flatten modes)
//! - [`state`] - Per-entity sync checkpoints
//! - [`sync`] - Orchestration across entities
//!
//! # Sync Workflow
//!
//! 1. **Load Checkpoint**: Read the entity's last successful sync
//! 2. **Render Query**: Inject the incremental lower bound
//! 3. **Extract**: Submit the bulk job, poll it and download the result
//! 4. **Reconstruct**: Rebuild nested records from the flat artifact
//! 5. **Write**: Save the processed file and optionally upload it
//! 6. **Checkpoint**: Record success or failure
//!
//! # Example
//!
//! ```rust,no_run
//! use shopsync::config::load_config;
//! use shopsync::core::sync::SyncCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("shopsync.toml")?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let coordinator = SyncCoordinator::from_config(config, shutdown_rx)?;
//! let summary = coordinator.execute().await;
//!
//! println!("Succeeded: {}", summary.succeeded());
//! println!("Failed: {}", summary.failed());
//! # Ok(())
//! # }
//! ```

pub mod download;
pub mod job;
pub mod reconstruct;
pub mod state;
pub mod sync;
pub mod transform;
