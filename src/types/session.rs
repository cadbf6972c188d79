//! Authenticated session state threaded between pipeline steps

use crate::{Error, Result, types::Identity};
use std::fmt;

/// Cookie header captured from a logged-in browser context
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    cookie_header: String,
}

impl Session {
    /// Join `(name, value)` pairs as `name=value; name=value`.
    ///
    /// Returns `None` when there are no cookies at all.
    pub fn from_cookies<I, N, V>(cookies: I) -> Option<Self>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let header = cookies
            .into_iter()
            .map(|(name, value)| format!("{}={}", name.as_ref(), value.as_ref()))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            Some(Self {
                cookie_header: header,
            })
        }
    }

    /// Wrap an already formatted cookie header
    pub fn from_header(cookie_header: impl Into<String>) -> Self {
        Self {
            cookie_header: cookie_header.into(),
        }
    }

    pub fn cookie_header(&self) -> &str {
        &self.cookie_header
    }

    /// Number of cookies carried by the header
    pub fn cookie_count(&self) -> usize {
        self.cookie_header.split("; ").count()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cookies", &self.cookie_count())
            .finish()
    }
}

/// Access token plus the identity fields the settings API signs over
#[derive(Clone, PartialEq, Eq)]
pub struct TokenBundle {
    token: String,
    identity: Identity,
}

impl TokenBundle {
    /// Build a bundle, rejecting any empty field
    pub fn new(token: impl Into<String>, identity: Identity) -> Result<Self> {
        let token = token.into();
        let fields: [(&'static str, &str); 5] = [
            ("token", token.as_str()),
            ("apiuser", identity.apiuser.as_str()),
            ("userId", identity.user_id.as_str()),
            ("openId", identity.open_id.as_str()),
            ("operateId", identity.operate_id.as_str()),
        ];
        if let Some(&(field, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
            return Err(Error::InvalidTokenBundle { field });
        }

        Ok(Self { token, identity })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn apiuser(&self) -> &str {
        &self.identity.apiuser
    }

    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    pub fn open_id(&self) -> &str {
        &self.identity.open_id
    }

    pub fn operate_id(&self) -> &str {
        &self.identity.operate_id
    }
}

impl fmt::Debug for TokenBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBundle")
            .field("token_len", &self.token.len())
            .field("identity", &self.identity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new("api", "user", "open", "operate")
    }

    #[test]
    fn test_session_from_cookies() {
        let session = Session::from_cookies([("sid", "abc"), ("theme", "dark")]).unwrap();
        assert_eq!(session.cookie_header(), "sid=abc; theme=dark");
        assert_eq!(session.cookie_count(), 2);
    }

    #[test]
    fn test_session_from_no_cookies_is_absent() {
        let cookies: Vec<(String, String)> = Vec::new();
        assert!(Session::from_cookies(cookies).is_none());
    }

    #[test]
    fn test_session_debug_hides_values() {
        let session = Session::from_header("sid=very-secret");
        assert!(!format!("{:?}", session).contains("very-secret"));
    }

    #[test]
    fn test_token_bundle_accessors() {
        let bundle = TokenBundle::new("tok", identity()).unwrap();
        assert_eq!(bundle.token(), "tok");
        assert_eq!(bundle.apiuser(), "api");
        assert_eq!(bundle.user_id(), "user");
        assert_eq!(bundle.open_id(), "open");
        assert_eq!(bundle.operate_id(), "operate");
    }

    #[test]
    fn test_token_bundle_rejects_empty_fields() {
        let err = TokenBundle::new("", identity()).unwrap_err();
        assert!(matches!(err, Error::InvalidTokenBundle { field: "token" }));

        let mut missing = identity();
        missing.open_id.clear();
        let err = TokenBundle::new("tok", missing).unwrap_err();
        assert!(matches!(err, Error::InvalidTokenBundle { field: "openId" }));
    }
}
