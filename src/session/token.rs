//! Access token extraction from the token settings page
//!
//! The page does not commit to one encoding for the token. It has been seen
//! as a JSON-ish key, a query string fragment and an HTML attribute, so the
//! extractor tries an ordered list of patterns and the first pattern that
//! matches anywhere in the body wins.

use crate::{
    Error, Result,
    client::{Endpoints, read_success_body},
    types::{Identity, Session, TokenBundle},
};
use regex::Regex;
use reqwest::{
    Client,
    header::{COOKIE, REFERER},
};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// A labelled token pattern; capture group 1 is the token
#[derive(Debug)]
pub struct TokenPattern {
    pub label: &'static str,
    regex: Regex,
}

impl TokenPattern {
    fn new(label: &'static str, pattern: &str) -> Self {
        Self {
            label,
            regex: Regex::new(pattern).expect("token pattern must compile"),
        }
    }

    /// Token captured by this pattern, if it matches and the capture is non-empty
    pub fn capture<'a>(&self, body: &'a str) -> Option<&'a str> {
        self.regex
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|token| !token.is_empty())
    }
}

/// Token encodings in priority order: JSON-style keys, then query strings,
/// then HTML attributes.
pub static TOKEN_PATTERNS: LazyLock<Vec<TokenPattern>> = LazyLock::new(|| {
    vec![
        TokenPattern::new("loose access_token key", r#"(?i)access_token["']?\s*:\s*["']([^"']+)["']"#),
        TokenPattern::new("loose token key", r#"(?i)token["']?\s*:\s*["']([^"']+)["']"#),
        TokenPattern::new("json access_token", r#"(?i)"access_token"\s*:\s*"([^"]+)""#),
        TokenPattern::new("json token", r#"(?i)"token"\s*:\s*"([^"]+)""#),
        TokenPattern::new("query access_token", r#"(?i)access_token=([^&\s"']+)"#),
        TokenPattern::new("query token", r#"(?i)token=([^&\s"']+)"#),
        TokenPattern::new("data-token attribute", r#"(?i)data-token=["']([^"']+)["']"#),
        TokenPattern::new("id=access_token input", r#"(?i)id="access_token"[^>]*value=["']([^"']+)["']"#),
        TokenPattern::new("id=token input", r#"(?i)id="token"[^>]*value=["']([^"']+)["']"#),
        TokenPattern::new("name=access_token input", r#"(?i)name="access_token"[^>]*value=["']([^"']+)["']"#),
        TokenPattern::new("name=token input", r#"(?i)name="token"[^>]*value=["']([^"']+)["']"#),
    ]
});

/// Run the patterns in order and return the first hit with its label
pub fn match_token(body: &str) -> Option<(&'static str, &str)> {
    TOKEN_PATTERNS
        .iter()
        .find_map(|pattern| pattern.capture(body).map(|token| (pattern.label, token)))
}

/// Extract the access token or fail with [`Error::NoTokenFound`]
pub fn extract_token(body: &str) -> Result<String> {
    match match_token(body) {
        Some((label, token)) => {
            debug!("Token matched by {} pattern ({} chars)", label, token.len());
            Ok(token.to_string())
        }
        None => Err(Error::no_token_found(body)),
    }
}

/// Fetches the token page with a session and extracts the access token
#[derive(Debug, Clone)]
pub struct TokenExtractor {
    client: Client,
    endpoints: Endpoints,
}

impl TokenExtractor {
    pub fn new(client: Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    /// Fetch the token page and extract the access token
    pub async fn extract_token(&self, session: &Session) -> Result<String> {
        debug!("Requesting token page {}", self.endpoints.token_page);

        let response = self
            .client
            .get(self.endpoints.token_page.clone())
            .header(COOKIE, session.cookie_header())
            .header(REFERER, self.endpoints.token_referer.as_str())
            .send()
            .await?;

        let body = read_success_body(response).await?;
        extract_token(&body).inspect_err(|e| {
            warn!(
                "No token pattern matched; page starts with: {}",
                e.body_excerpt().unwrap_or_default()
            );
        })
    }

    /// Fetch a fresh token and pair it with the static identity
    pub async fn token_bundle(&self, session: &Session, identity: &Identity) -> Result<TokenBundle> {
        let token = self.extract_token(session).await?;
        let bundle = TokenBundle::new(token, identity.clone())?;
        info!("Token bundle ready");
        Ok(bundle)
    }
}
