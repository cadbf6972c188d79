//! Error handling for the sync pipeline
//!
//! Every stage reports failures through one error type; nothing is retried or
//! swallowed below the pipeline.

pub mod types;

pub use types::{Error, Result};
