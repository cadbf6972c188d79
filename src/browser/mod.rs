//! Browser automation capability
//!
//! Defines the `BrowserLauncher`, `BrowserContext` and `BrowserPage` traits the
//! login flow is written against. The production implementation drives
//! Chromium over the DevTools protocol; tests substitute in-memory fakes.

pub mod chromium;

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use chromium::ChromiumLauncher;

/// When a navigation counts as finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// The `load` event fired
    Load,
    /// `load` fired and no new resources started for `idle`, bounded by `timeout`
    NetworkIdle { idle: Duration, timeout: Duration },
}

/// Cookie as reported by the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
}

impl BrowserCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Starts isolated browser instances
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launch a fresh browser context; nothing is shared with earlier launches
    async fn launch(&self) -> Result<Box<dyn BrowserContext>>;
}

/// A running browser instance owned by one caller
#[async_trait]
pub trait BrowserContext: Send {
    /// Open a new blank page
    async fn new_page(&mut self) -> Result<Box<dyn BrowserPage>>;
    /// Shut the browser down and release its process
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A single tab
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate and wait according to `wait`
    async fn goto(&self, url: &str, wait: WaitPolicy) -> Result<()>;
    /// Evaluate a JavaScript expression, awaiting it if it yields a promise
    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value>;
    /// All cookies visible to the page
    async fn cookies(&self) -> Result<Vec<BrowserCookie>>;
}
