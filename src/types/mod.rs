//! Type definitions for the sync pipeline
//!
//! This module contains the values threaded from login through to the
//! persisted snapshot.

pub mod credentials;
pub mod session;
pub mod snapshot;

pub use credentials::{Credentials, Identity};
pub use session::{Session, TokenBundle};
pub use snapshot::{AuthenticatedProfile, Snapshot, UserRecord};
