//! User list and authenticated profile retrieval

use super::{Endpoints, parse_json, read_success_body};
use crate::{
    Result,
    signing::RequestSigner,
    types::{AuthenticatedProfile, Session, TokenBundle, UserRecord},
};
use reqwest::{
    Client,
    header::{CONTENT_TYPE, COOKIE, REFERER},
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Language the settings API is asked to respond in
pub const PROFILE_LANGUAGE: &str = "en_US";

/// Fields signed for the settings call at `timestamp` (Unix seconds)
pub fn build_profile_payload(bundle: &TokenBundle, timestamp: i64) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("access_token".to_string(), bundle.token().to_string()),
        ("apiuser".to_string(), bundle.apiuser().to_string()),
        ("language".to_string(), PROFILE_LANGUAGE.to_string()),
        ("openId".to_string(), bundle.open_id().to_string()),
        ("operateId".to_string(), bundle.operate_id().to_string()),
        ("timestamp".to_string(), timestamp.to_string()),
        ("userId".to_string(), bundle.user_id().to_string()),
    ])
}

/// Client for the user list and the signed settings endpoint
#[derive(Debug, Clone)]
pub struct UserDataClient {
    client: Client,
    endpoints: Endpoints,
    signer: RequestSigner,
}

impl UserDataClient {
    pub fn new(client: Client, endpoints: Endpoints, signer: RequestSigner) -> Self {
        Self {
            client,
            endpoints,
            signer,
        }
    }

    /// Fetch every user visible to the session, in server order
    pub async fn list_users(&self, session: &Session) -> Result<Vec<UserRecord>> {
        debug!("Requesting user list from {}", self.endpoints.user_list);

        let response = self
            .client
            .post(self.endpoints.user_list.clone())
            .header(COOKIE, session.cookie_header())
            .header(REFERER, self.endpoints.user_list_referer.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body("{}")
            .send()
            .await?;

        let body = read_success_body(response).await?;
        let users: Vec<UserRecord> = parse_json(&body)?;

        info!("Fetched {} users", users.len());
        Ok(users)
    }

    /// Fetch the logged-in user's profile, signed with the current time
    pub async fn fetch_authenticated_profile(
        &self,
        bundle: &TokenBundle,
    ) -> Result<AuthenticatedProfile> {
        self.fetch_authenticated_profile_at(bundle, chrono::Utc::now().timestamp())
            .await
    }

    /// Fetch the logged-in user's profile, signed at `timestamp`.
    ///
    /// The API host authenticates by checkcode and token alone; no cookie is sent.
    pub async fn fetch_authenticated_profile_at(
        &self,
        bundle: &TokenBundle,
        timestamp: i64,
    ) -> Result<AuthenticatedProfile> {
        let signed = self.signer.sign(build_profile_payload(bundle, timestamp));
        debug!(
            "Requesting profile from {} (timestamp {})",
            self.endpoints.profile, timestamp
        );

        let response = self
            .client
            .post(self.endpoints.profile.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(REFERER, self.endpoints.profile_referer.as_str())
            .body(signed.body())
            .send()
            .await?;

        let body = read_success_body(response).await?;
        let profile = parse_json(&body)?;

        info!("Fetched authenticated profile");
        Ok(profile)
    }
}
