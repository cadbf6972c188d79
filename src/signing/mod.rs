//! Request signing for the settings API
//!
//! The settings endpoint authenticates a form body by recomputing an
//! HMAC-SHA1 "checkcode" over the same canonical string we send:
//!
//! 1. keys sorted in ascending byte order
//! 2. each pair rendered as `key=encodeURIComponent(value)`
//! 3. pairs joined with `&`
//!
//! The signature is the uppercase hex digest, appended as `&checkcode=<sig>`.

use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;
use std::collections::BTreeMap;

type HmacSha1 = Hmac<Sha1>;

/// Shared secret the settings API verifies checkcodes with
pub const DEFAULT_SECRET: &str = "mys3cr3t";

/// Bytes left unescaped by JavaScript's `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Canonical string and its checkcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    pub canonical: String,
    pub signature: String,
}

impl SignedPayload {
    /// Form body sent to the API: `canonical&checkcode=SIGNATURE`
    pub fn body(&self) -> String {
        format!("{}&checkcode={}", self.canonical, self.signature)
    }
}

/// HMAC-SHA1 signer keyed with the shared secret
#[derive(Clone)]
pub struct RequestSigner {
    mac: HmacSha1,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner").finish_non_exhaustive()
    }
}

impl RequestSigner {
    /// Create a signer for `secret`
    pub fn new(secret: impl AsRef<[u8]>) -> crate::Result<Self> {
        let mac = HmacSha1::new_from_slice(secret.as_ref())
            .map_err(|e| crate::Error::config(format!("Invalid signing secret: {}", e)))?;
        Ok(Self { mac })
    }

    /// Canonicalize and sign a string-to-string payload.
    ///
    /// Iteration order of `payload` is irrelevant; a repeated key keeps its last value.
    pub fn sign<I, K, V>(&self, payload: I) -> SignedPayload
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let canonical = canonicalize(payload);

        let mut mac = self.mac.clone();
        mac.update(canonical.as_bytes());
        let signature = hex::encode_upper(mac.finalize().into_bytes());

        SignedPayload {
            canonical,
            signature,
        }
    }
}

/// Sorted, URI-component-encoded `key=value&...` form of `payload`
pub fn canonicalize<I, K, V>(payload: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let sorted: BTreeMap<String, String> = payload
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();

    sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, utf8_percent_encode(value, URI_COMPONENT)))
        .collect::<Vec<_>>()
        .join("&")
}
