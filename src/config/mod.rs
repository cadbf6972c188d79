//! Configuration management
//!
//! Endpoint, browser, output and logging settings, plus the loader that
//! layers a config file and environment overrides on top of the defaults.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::{
    BrowserSettings, EndpointSettings, LoggingSettings, MOBILE_USER_AGENT, OutputSettings,
    Settings,
};
