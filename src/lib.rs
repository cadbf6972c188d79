//! Sunvoy Sync - Rust Implementation
//!
//! Logs in to the Sunvoy challenge site through a headless browser, exchanges
//! the session for an access token, fetches the user list and the signed
//! profile of the logged-in user, and writes everything to one JSON snapshot.
//!
//! # Architecture
//!
//! A run is a strict sequence of steps, each feeding the next:
//! - **Session**: browser login with the page's CSRF nonce, yielding cookies
//! - **Users**: the cookie-authenticated user list
//! - **Token**: the access token scraped from the token settings page
//! - **Profile**: an HMAC-SHA1 signed call to the settings API
//! - **Persist**: users plus a trailing `authenticatedUser` entry, written once
//!
//! # Usage
//!
//! ```bash
//! USER_NAME=demo@example.org PASSWORD=test sunvoy-sync --output users.json
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sunvoy_sync::{
//!     AggregationPipeline, ChromiumLauncher, Credentials, FileSink, Identity, Settings,
//! };
//!
//! # async fn example() -> sunvoy_sync::Result<()> {
//! let settings = Settings::default();
//! let pipeline = AggregationPipeline::new(
//!     &settings,
//!     Arc::new(ChromiumLauncher::new(settings.browser.clone())),
//!     Identity::from_env()?,
//!     Arc::new(FileSink::new(&settings.output.path)),
//! )?;
//! let snapshot = pipeline.run(&Credentials::from_env()?).await?;
//! println!("{} records", snapshot.len());
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod signing;
pub mod types;
pub mod utils;

pub use browser::{BrowserLauncher, ChromiumLauncher};
pub use config::Settings;
pub use error::{Error, Result};
pub use pipeline::{AggregationPipeline, FileSink, SnapshotSink};
pub use signing::RequestSigner;
pub use types::{Credentials, Identity, Session, Snapshot, TokenBundle};
