//! Login credentials and the static identity attached to signed requests

use crate::{Error, Result};
use std::fmt;

/// Username and password for the login form
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read `USER_NAME` and `PASSWORD`
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(required_env("USER_NAME")?, required_env("PASSWORD")?))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account identifiers the settings API expects next to the access token.
///
/// These are issued out of band and never derived from a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub apiuser: String,
    pub user_id: String,
    pub open_id: String,
    pub operate_id: String,
}

impl Identity {
    pub fn new(
        apiuser: impl Into<String>,
        user_id: impl Into<String>,
        open_id: impl Into<String>,
        operate_id: impl Into<String>,
    ) -> Self {
        Self {
            apiuser: apiuser.into(),
            user_id: user_id.into(),
            open_id: open_id.into(),
            operate_id: operate_id.into(),
        }
    }

    /// Read `API_USER`, `USER_ID`, `OPEN_ID` and `OPERATE_ID`
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(
            required_env("API_USER")?,
            required_env("USER_ID")?,
            required_env("OPEN_ID")?,
            required_env("OPERATE_ID")?,
        ))
    }
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        Ok(_) => Err(Error::config(format!("{} is set but empty", name))),
        Err(_) => Err(Error::config(format!("{} is not set", name))),
    }
}
