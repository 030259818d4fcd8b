//! Domain models and types for shopsync.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`JobId`])
//! - **Remote job model** ([`BulkJob`], [`JobStatus`])
//! - **The closed entity catalogue** ([`EntityKind`])
//! - **Error types** ([`SyncError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, SyncError>`]:
//!
//! ```rust
//! use shopsync::domain::{EntityKind, Result};
//! use std::str::FromStr;
//!
//! fn example() -> Result<EntityKind> {
//!     let kind = EntityKind::from_str("orders")?;
//!     Ok(kind)
//! }
//! ```

pub mod entity;
pub mod errors;
pub mod ids;
pub mod job;
pub mod result;

pub use entity::EntityKind;
pub use errors::SyncError;
pub use ids::JobId;
pub use job::{BulkJob, JobStatus};
pub use result::Result;
