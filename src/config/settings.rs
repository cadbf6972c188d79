//! Configuration settings structure
//!
//! Defines the main settings structure and loading logic for a sync run.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Mobile Safari user agent sent on every request
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";

/// Main configuration settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Remote endpoints
    pub endpoints: EndpointSettings,
    /// Headless browser configuration
    pub browser: BrowserSettings,
    /// Snapshot output configuration
    pub output: OutputSettings,
    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Remote site and API hosts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    /// Origin serving the login form, token page and user list
    pub site_base: String,
    /// Origin serving the signed settings API
    pub api_base: String,
    /// User agent presented to both hosts
    pub user_agent: String,
}

/// Browser launch and login timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run Chromium without a window
    pub headless: bool,
    /// Explicit Chromium binary, otherwise discovered
    pub executable: Option<PathBuf>,
    /// Pause after submitting the login form before reading cookies
    pub settle_delay_ms: u64,
    /// Upper bound on a single page navigation
    pub navigation_timeout_ms: u64,
    /// Quiet period that counts as network idle
    pub network_idle_ms: u64,
    /// Upper bound on waiting for network idle
    pub network_idle_timeout_ms: u64,
}

/// Snapshot output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// File the snapshot is written to
    pub path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level
    pub level: String,
    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            site_base: "https://challenge.sunvoy.com".to_string(),
            api_base: "https://api.challenge.sunvoy.com".to_string(),
            user_agent: MOBILE_USER_AGENT.to_string(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            settle_delay_ms: 1500,
            navigation_timeout_ms: 30_000,
            network_idle_ms: 500,
            network_idle_timeout_ms: 10_000,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("users.json"),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            verbose: false,
        }
    }
}

impl BrowserSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

impl EndpointSettings {
    /// Parsed site origin
    pub fn site_url(&self) -> crate::Result<Url> {
        parse_base("endpoints.site_base", &self.site_base)
    }

    /// Parsed API origin
    pub fn api_url(&self) -> crate::Result<Url> {
        parse_base("endpoints.api_base", &self.api_base)
    }
}

fn parse_base(name: &str, raw: &str) -> crate::Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| crate::Error::Config(format!("Invalid {}: {}", name, e)))?;
    if url.cannot_be_a_base() {
        return Err(crate::Error::Config(format!(
            "Invalid {}: {} cannot be a base URL",
            name, raw
        )));
    }
    Ok(url)
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file, filling gaps with defaults
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let settings = toml::from_str(&raw)?;
        Ok(settings)
    }

    /// Load settings from environment variables
    pub fn from_env() -> crate::Result<Self> {
        Self::default().merge_with_env()
    }

    /// Apply environment variable overrides on top of these settings
    pub fn merge_with_env(mut self) -> crate::Result<Self> {
        if let Ok(path) = std::env::var("SUNVOY_OUTPUT") {
            self.output.path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("SUNVOY_CHROME_PATH") {
            self.browser.executable = Some(PathBuf::from(path));
        }

        if let Ok(headless) = std::env::var("SUNVOY_HEADLESS") {
            self.browser.headless = headless
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid SUNVOY_HEADLESS: {}", e)))?;
        }

        if let Ok(delay) = std::env::var("SUNVOY_SETTLE_DELAY_MS") {
            self.browser.settle_delay_ms = delay.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid SUNVOY_SETTLE_DELAY_MS: {}", e))
            })?;
        }

        Ok(self)
    }

    /// Check that the settings can drive a run
    pub fn validate(&self) -> crate::Result<()> {
        self.endpoints.site_url()?;
        self.endpoints.api_url()?;

        if self.endpoints.user_agent.trim().is_empty() {
            return Err(crate::Error::config("endpoints.user_agent must not be empty"));
        }

        if self.output.path.as_os_str().is_empty() {
            return Err(crate::Error::config("output.path must not be empty"));
        }

        if let Some(executable) = self.browser.executable.as_ref().filter(|p| !p.exists()) {
            return Err(crate::Error::config(format!(
                "browser.executable {:?} does not exist",
                executable
            )));
        }

        if self.browser.navigation_timeout_ms == 0 {
            return Err(crate::Error::config(
                "browser.navigation_timeout_ms must be greater than zero",
            ));
        }

        Ok(())
    }
}
