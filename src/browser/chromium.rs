//! Chromium-backed browser using chromiumoxide.

use super::{BrowserContext, BrowserCookie, BrowserLauncher, BrowserPage, WaitPolicy};
use crate::{Error, Result, config::BrowserSettings};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Find a Chromium binary: explicit setting, `CHROME_PATH`, then `PATH`.
///
/// An explicit setting must exist; discovery only runs without one.
pub fn find_chromium(explicit: Option<&PathBuf>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::config(format!(
                "browser.executable {:?} does not exist",
                path
            )));
        }
        return Ok(Some(path.clone()));
    }

    if let Ok(p) = std::env::var("CHROME_PATH") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    Ok(
        ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"]
            .into_iter()
            .find_map(|name| which::which(name).ok()),
    )
}

/// Launches one headless Chromium process per call
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    settings: BrowserSettings,
}

impl ChromiumLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    fn config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(self.settings.navigation_timeout())
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");

        if !self.settings.headless {
            builder = builder.with_head();
        }

        // chromiumoxide falls back to its own lookup when nothing is found
        if let Some(path) = find_chromium(self.settings.executable.as_ref())? {
            debug!("Using Chromium at {:?}", path);
            builder = builder.chrome_executable(path);
        }

        builder
            .build()
            .map_err(|e| Error::browser(format!("failed to build browser config: {e}")))
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserContext>> {
        let (browser, mut handler) = Browser::launch(self.config()?)
            .await
            .map_err(|e| Error::browser(format!("failed to launch Chromium: {e}")))?;

        // The CDP handler must be polled for the browser to make progress
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Box::new(ChromiumContext {
            browser,
            handler_task,
            navigation_timeout: self.settings.navigation_timeout(),
        }))
    }
}

/// One running Chromium process
pub struct ChromiumContext {
    browser: Browser,
    handler_task: JoinHandle<()>,
    navigation_timeout: Duration,
}

#[async_trait]
impl BrowserContext for ChromiumContext {
    async fn new_page(&mut self) -> Result<Box<dyn BrowserPage>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::browser(format!("failed to create new page: {e}")))?;

        Ok(Box::new(ChromiumPage {
            page,
            navigation_timeout: self.navigation_timeout,
        }))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let mut this = self;
        let closed = this.browser.close().await;
        if let Err(e) = this.browser.wait().await {
            warn!("Chromium did not exit cleanly: {}", e);
        }
        this.handler_task.abort();

        closed
            .map(|_| ())
            .map_err(|e| Error::browser(format!("failed to close Chromium: {e}")))
    }
}

/// A single Chromium tab
pub struct ChromiumPage {
    page: Page,
    navigation_timeout: Duration,
}

impl ChromiumPage {
    /// Poll resource timing entries until nothing new appears for `idle`.
    ///
    /// chromiumoxide has no network-idle lifecycle wait, so this runs in the page.
    async fn wait_for_network_idle(&self, idle: Duration, timeout: Duration) -> Result<()> {
        let script = format!(
            r#"(async () => {{
                const idleMs = {idle_ms};
                const timeoutMs = {timeout_ms};
                const interval = 100;
                const start = Date.now();
                const count = () => {{
                    try {{ return performance.getEntriesByType('resource').length; }} catch (_) {{ return 0; }}
                }};
                let last = count();
                let stable = 0;
                while (Date.now() - start < timeoutMs) {{
                    await new Promise(r => setTimeout(r, interval));
                    const now = count();
                    if (document.readyState === 'complete' && now === last) {{
                        stable += interval;
                        if (stable >= idleMs) return {{ idle: true, waitedMs: Date.now() - start }};
                    }} else {{
                        stable = 0;
                    }}
                    last = now;
                }}
                return {{ idle: false, waitedMs: Date.now() - start }};
            }})()"#,
            idle_ms = idle.as_millis(),
            timeout_ms = timeout.as_millis(),
        );

        let outcome = self.evaluate(&script).await?;
        let waited = outcome.get("waitedMs").and_then(|v| v.as_u64()).unwrap_or(0);
        if outcome.get("idle").and_then(|v| v.as_bool()).unwrap_or(false) {
            debug!("Network idle after {}ms", waited);
        } else {
            warn!("Network still busy after {}ms, continuing", waited);
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn goto(&self, url: &str, wait: WaitPolicy) -> Result<()> {
        let navigation = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };

        match tokio::time::timeout(self.navigation_timeout, navigation).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(Error::browser(format!("navigation to {url} failed: {e}"))),
            Err(_) => {
                return Err(Error::browser(format!(
                    "navigation to {url} timed out after {}ms",
                    self.navigation_timeout.as_millis()
                )));
            }
        }

        match wait {
            WaitPolicy::Load => Ok(()),
            WaitPolicy::NetworkIdle { idle, timeout } => {
                self.wait_for_network_idle(idle, timeout).await
            }
        }
    }

    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(|e| Error::browser(format!("invalid evaluate params: {e}")))?;

        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| Error::browser(format!("JS execution failed: {e}")))?;

        // `undefined` has no by-value representation
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn cookies(&self) -> Result<Vec<BrowserCookie>> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(|e| Error::browser(format!("failed to read cookies: {e}")))?;

        Ok(cookies
            .into_iter()
            .map(|c| BrowserCookie::new(c.name, c.value))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_chromium_prefers_existing_explicit_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        assert_eq!(find_chromium(Some(&path)).unwrap(), Some(path));
    }

    #[test]
    fn test_find_chromium_rejects_missing_explicit_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("chrome-typo");

        let err = find_chromium(Some(&missing)).unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("chrome-typo"));
    }

    #[tokio::test]
    async fn test_launch_fails_fast_on_missing_executable() {
        let settings = BrowserSettings {
            executable: Some(PathBuf::from("/nonexistent/sunvoy/chrome")),
            ..BrowserSettings::default()
        };

        let err = ChromiumLauncher::new(settings).launch().await.err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_config_builds_with_defaults() {
        let launcher = ChromiumLauncher::new(BrowserSettings::default());
        // Building only fails when no executable can be located at all
        if matches!(find_chromium(None), Ok(Some(_))) {
            assert!(launcher.config().is_ok());
        }
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_evaluate_and_cookies() {
        let launcher = ChromiumLauncher::new(BrowserSettings::default());
        let mut context = launcher.launch().await.expect("failed to launch");
        let page = context.new_page().await.expect("failed to open page");

        page.goto(
            "data:text/html,<input name=\"nonce\" value=\"abc\">",
            WaitPolicy::NetworkIdle {
                idle: Duration::from_millis(200),
                timeout: Duration::from_secs(5),
            },
        )
        .await
        .expect("navigation failed");

        let nonce = page
            .evaluate("document.querySelector('input[name=\"nonce\"]').value")
            .await
            .expect("evaluate failed");
        assert_eq!(nonce, serde_json::json!("abc"));

        let awaited = page
            .evaluate("new Promise(r => setTimeout(() => r(42), 10))")
            .await
            .expect("promise evaluate failed");
        assert_eq!(awaited, serde_json::json!(42));

        assert!(page.cookies().await.expect("cookies failed").is_empty());

        context.close().await.expect("close failed");
    }
}
