//! Tree reconstruction of bulk export output
//!
//! Bulk exports flatten nested connections into one JSON object per line,
//! with children pointing at their parent through `__parentId`. This module
//! puts them back together.
//!
//! # Example
//!
//! ```
//! use shopsync::core::reconstruct::reconstruct_reader;
//! use shopsync::domain::EntityKind;
//! use std::io::Cursor;
//!
//! let ndjson = concat!(
//!     "{\"id\":\"gid://shopify/Product/1\",\"title\":\"Hat\"}\n",
//!     "{\"id\":\"gid://shopify/ProductVariant/1\",\"__parentId\":\"gid://shopify/Product/1\"}\n",
//! );
//! let result = reconstruct_reader(EntityKind::Products, Cursor::new(ndjson)).unwrap();
//! assert_eq!(result.roots.len(), 1);
//! assert_eq!(result.roots[0]["variants"].as_array().unwrap().len(), 1);
//! ```

pub mod rules;
pub mod tree;

pub use rules::{ChildRule, Matcher, Role};
pub use tree::{
    reconstruct_file, reconstruct_reader, Reconstruction, ReconstructionStats, TreeBuilder,
    PARENT_ID_FIELD,
};
