//! Shopify Admin API adapter
//!
//! This module provides the remote job client used by the orchestrator: the
//! [`BulkOperationApi`] trait, its reqwest-backed implementation
//! [`ShopifyClient`], wire models, and the built-in GraphQL documents.

pub mod api;
pub mod client;
pub mod models;
pub mod queries;

pub use api::BulkOperationApi;
pub use client::ShopifyClient;
pub use queries::{default_query, render_query, RenderedQuery};
