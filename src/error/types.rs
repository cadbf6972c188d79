//! Error type definitions
//!
//! Defines the error taxonomy shared by every stage of the sync run.

use crate::utils::text::excerpt;
use thiserror::Error;

/// Characters of a response body kept on HTTP and parse failures
pub const BODY_EXCERPT_CHARS: usize = 200;

/// Characters of the token page kept when no token pattern matched
pub const TOKEN_PAGE_EXCERPT_CHARS: usize = 2000;

/// Main error type for the sync pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Login finished but the browser cookie jar was empty
    #[error("No session established: login produced no cookies")]
    NoSessionEstablished,

    /// Navigation, evaluation or timeout fault while driving the login page
    #[error("Login flow error: {0}")]
    LoginFlow(String),

    /// Remote endpoint answered with a non-2xx status
    #[error("HTTP error! status: {status}, body: {body_excerpt}")]
    Http { status: u16, body_excerpt: String },

    /// Token page did not match any known token encoding
    #[error("No tokens found in token page")]
    NoTokenFound { body_excerpt: String },

    /// Response body was not the JSON shape we expected
    #[error("Invalid JSON response: {body_excerpt}")]
    MalformedResponse { body_excerpt: String },

    /// A token bundle field was empty
    #[error("Invalid token bundle: {field} is empty")]
    InvalidTokenBundle { field: &'static str },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Browser launch or teardown errors
    #[error("Browser error: {0}")]
    Browser(String),

    /// Network/HTTP client errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an HTTP status error, keeping only the head of the body
    pub fn http(status: u16, body: &str) -> Self {
        Self::Http {
            status,
            body_excerpt: excerpt(body, BODY_EXCERPT_CHARS),
        }
    }

    /// Create a missing-token error carrying the head of the token page
    pub fn no_token_found(body: &str) -> Self {
        Self::NoTokenFound {
            body_excerpt: excerpt(body, TOKEN_PAGE_EXCERPT_CHARS),
        }
    }

    /// Create a malformed response error
    pub fn malformed(body: &str) -> Self {
        Self::MalformedResponse {
            body_excerpt: excerpt(body, BODY_EXCERPT_CHARS),
        }
    }

    /// Create a login flow error
    pub fn login_flow(msg: impl Into<String>) -> Self {
        Self::LoginFlow(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a browser error
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Response body excerpt carried by the error, if any
    pub fn body_excerpt(&self) -> Option<&str> {
        match self {
            Self::Http { body_excerpt, .. }
            | Self::NoTokenFound { body_excerpt }
            | Self::MalformedResponse { body_excerpt } => Some(body_excerpt),
            _ => None,
        }
    }
}
