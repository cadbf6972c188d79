//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

/// Test helper functions
pub mod helpers {
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use sunvoy_sync::{
        Result, Settings,
        browser::{BrowserContext, BrowserCookie, BrowserLauncher, BrowserPage, WaitPolicy},
        types::{Credentials, Identity},
    };
    use wiremock::MockServer;

    /// Browser that serves a nonce and hands back fixed cookies after login
    #[derive(Clone)]
    pub struct FakeBrowser {
        cookies: Vec<BrowserCookie>,
        closes: Arc<AtomicUsize>,
    }

    impl FakeBrowser {
        pub fn with_cookies(cookies: &[(&str, &str)]) -> Self {
            Self {
                cookies: cookies
                    .iter()
                    .map(|(name, value)| BrowserCookie::new(*name, *value))
                    .collect(),
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// How many browser contexts were released
        pub fn closes(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BrowserLauncher for FakeBrowser {
        async fn launch(&self) -> Result<Box<dyn BrowserContext>> {
            Ok(Box::new(self.clone()))
        }
    }

    #[async_trait]
    impl BrowserContext for FakeBrowser {
        async fn new_page(&mut self) -> Result<Box<dyn BrowserPage>> {
            Ok(Box::new(self.clone()))
        }

        async fn close(self: Box<Self>) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl BrowserPage for FakeBrowser {
        async fn goto(&self, _url: &str, _wait: WaitPolicy) -> Result<()> {
            Ok(())
        }

        async fn evaluate(&self, expression: &str) -> Result<Value> {
            if expression.contains("querySelector") {
                Ok(json!("test-nonce"))
            } else {
                Ok(json!(302))
            }
        }

        async fn cookies(&self) -> Result<Vec<BrowserCookie>> {
            Ok(self.cookies.clone())
        }
    }

    /// Settings pointing both hosts at the mock server, with no settle delay
    pub fn create_test_settings(server: &MockServer) -> Settings {
        let mut settings = Settings::default();
        settings.endpoints.site_base = server.uri();
        settings.endpoints.api_base = server.uri();
        settings.browser.settle_delay_ms = 0;
        settings
    }

    pub fn test_credentials() -> Credentials {
        Credentials::new("demo@example.org", "test")
    }

    pub fn test_identity() -> Identity {
        Identity::new("demo-api", "user-42", "open-7", "operate-9")
    }
}
