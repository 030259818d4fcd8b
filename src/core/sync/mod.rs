//! Sync orchestration
//!
//! - [`coordinator`] - per-entity extract, reconstruct, write, upload, checkpoint
//! - [`paths`] - raw/processed file layout and upload keys
//! - [`summary`] - per-entity reports

pub mod coordinator;
pub mod paths;
pub mod summary;

pub use coordinator::{lower_bound, EntityPlan, SyncCoordinator, SHOP_INFO_ENTITY};
pub use paths::{upload_key, OutputLayout};
pub use summary::{EntityReport, EntityStatus, SyncSummary};
