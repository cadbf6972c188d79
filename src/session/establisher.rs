//! Browser-driven login
//!
//! The login form carries a one-time CSRF nonce and the site sets its session
//! cookies from script after the POST, so the form is submitted from inside a
//! real page rather than with a bare HTTP request.

use crate::{
    Error, Result,
    browser::{BrowserContext, BrowserCookie, BrowserLauncher, WaitPolicy},
    client::Endpoints,
    config::BrowserSettings,
    types::{Credentials, Session},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Hidden input holding the CSRF nonce
pub const NONCE_SELECTOR: &str = r#"input[name="nonce"]"#;

/// Expression returning the nonce input's value, or `null` when absent
pub fn nonce_script() -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); return el ? el.value : null; }})()",
        js_string(NONCE_SELECTOR)
    )
}

/// Expression that POSTs the login form from the page and resolves to the HTTP status
pub fn login_script(login_path: &str, nonce: &str, credentials: &Credentials) -> String {
    format!(
        r#"(async () => {{
    const form = new URLSearchParams();
    form.append("nonce", {nonce});
    form.append("username", {username});
    form.append("password", {password});
    const res = await fetch({path}, {{
        method: "POST",
        credentials: "include",
        headers: {{ "Content-Type": "application/x-www-form-urlencoded" }},
        body: form.toString()
    }});
    return res.status;
}})()"#,
        nonce = js_string(nonce),
        username = js_string(credentials.username()),
        password = js_string(credentials.password()),
        path = js_string(login_path),
    )
}

/// Quote a value as a JavaScript string literal
fn js_string(value: &str) -> String {
    // A JSON string is a valid JS string literal
    serde_json::Value::String(value.to_string()).to_string()
}

/// Logs in through a throwaway browser and captures the session cookies
#[derive(Clone)]
pub struct SessionEstablisher {
    launcher: Arc<dyn BrowserLauncher>,
    login_url: String,
    login_path: String,
    settings: BrowserSettings,
}

impl std::fmt::Debug for SessionEstablisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEstablisher")
            .field("login_url", &self.login_url)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl SessionEstablisher {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        endpoints: &Endpoints,
        settings: BrowserSettings,
    ) -> Self {
        Self {
            launcher,
            login_url: endpoints.login.to_string(),
            login_path: endpoints.login.path().to_string(),
            settings,
        }
    }

    /// Log in and return the session cookie header.
    ///
    /// `Ok(None)` means the flow completed but the browser holds no cookies.
    /// Any browser fault is reported as [`Error::LoginFlow`]. The browser is
    /// closed before returning in every case.
    pub async fn establish_session(&self, credentials: &Credentials) -> Result<Option<Session>> {
        info!("Launching browser to log in as {}", credentials.username());

        let mut context = self
            .launcher
            .launch()
            .await
            .map_err(|e| Error::login_flow(format!("browser launch failed: {e}")))?;

        let outcome = self.log_in(context.as_mut(), credentials).await;

        if let Err(e) = context.close().await {
            warn!("Failed to close browser: {}", e);
        }

        let cookies = outcome?;
        match Session::from_cookies(cookies.iter().map(|c| (&c.name, &c.value))) {
            Some(session) => {
                info!("Session established with {} cookies", session.cookie_count());
                Ok(Some(session))
            }
            None => {
                warn!("Login completed but no cookies were set");
                Ok(None)
            }
        }
    }

    async fn log_in(
        &self,
        context: &mut dyn BrowserContext,
        credentials: &Credentials,
    ) -> Result<Vec<BrowserCookie>> {
        let page = context
            .new_page()
            .await
            .map_err(|e| Error::login_flow(format!("could not open page: {e}")))?;

        // The nonce is injected server-side; wait for the page to go quiet first
        page.goto(&self.login_url, self.wait_policy())
            .await
            .map_err(|e| Error::login_flow(format!("could not load login page: {e}")))?;

        let nonce = page
            .evaluate(&nonce_script())
            .await
            .map_err(|e| Error::login_flow(format!("could not read nonce: {e}")))?;
        let nonce = nonce
            .as_str()
            .ok_or_else(|| Error::login_flow("nonce input not found"))?;
        if nonce.is_empty() {
            // Submitted as-is; the server decides whether it is acceptable
            warn!("Nonce input is present but empty");
        }
        debug!("Found login nonce ({} chars)", nonce.len());

        let status = page
            .evaluate(&login_script(&self.login_path, nonce, credentials))
            .await
            .map_err(|e| Error::login_flow(format!("login submission failed: {e}")))?;
        debug!("Login form answered with status {}", status);

        // Cookies are set asynchronously after the POST resolves
        tokio::time::sleep(self.settings.settle_delay()).await;

        page.cookies()
            .await
            .map_err(|e| Error::login_flow(format!("could not read cookies: {e}")))
    }

    fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::NetworkIdle {
            idle: Duration::from_millis(self.settings.network_idle_ms),
            timeout: Duration::from_millis(self.settings.network_idle_timeout_ms),
        }
    }
}
