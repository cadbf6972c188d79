//! Session acquisition
//!
//! Logging in through a browser to obtain session cookies, then trading the
//! session for an access token from the token settings page.

pub mod establisher;
pub mod token;

pub use establisher::SessionEstablisher;
pub use token::{TOKEN_PATTERNS, TokenExtractor, extract_token, match_token};
