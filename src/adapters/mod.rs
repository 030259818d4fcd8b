//! External system integrations for shopsync.
//!
//! - [`shopify`] - Shopify Admin GraphQL client for bulk operations
//! - [`storage`] - Checkpoint persistence and processed-file upload
//!
//! Both sit behind traits ([`shopify::BulkOperationApi`],
//! [`storage::CheckpointStore`], [`storage::ArtifactUploader`]) so the sync
//! loop can be driven by fakes in tests.

pub mod shopify;
pub mod storage;
