//! Settings resolution for a run
//!
//! Defaults, then a TOML file, then `SUNVOY_*` variables. Command line flags
//! are layered on by the caller.

use crate::{Error, Result, config::Settings};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolves which config file applies and loads it
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Per-user file consulted when no path is given
    default_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            default_path: default_config_path(),
        }
    }

    /// Loader that only reads an explicitly given file
    pub fn without_default_path() -> Self {
        Self { default_path: None }
    }

    /// Config file for this run.
    ///
    /// An explicit path must exist. The per-user file is optional.
    pub fn resolve(&self, explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        match explicit {
            Some(path) if path.exists() => Ok(Some(path.to_path_buf())),
            Some(path) => Err(Error::config(format!(
                "config file {:?} does not exist",
                path
            ))),
            None => Ok(self.default_path.clone().filter(|p| p.exists())),
        }
    }

    /// Load and validate the settings for a run
    pub fn load(&self, explicit: Option<&Path>) -> Result<Settings> {
        let settings = match self.resolve(explicit)? {
            Some(path) => {
                info!("Loading configuration from {:?}", path);
                Settings::from_file(&path)?
            }
            None => {
                debug!("No config file, starting from defaults");
                Settings::default()
            }
        };

        let settings = settings.merge_with_env()?;
        settings.validate()?;
        Ok(settings)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// `<config dir>/sunvoy-sync/config.toml`, when the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sunvoy-sync").join("config.toml"))
}
