//! Bulk job submission and polling

pub mod machine;

pub use machine::{JobOutcome, JobRunner, PollSettings};
