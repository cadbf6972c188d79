//! Command line run logic

pub mod sync;

pub use sync::{SyncArgs, SyncOutcome, run_sync_mode};
