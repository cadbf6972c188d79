//! HTTP plumbing shared by the token, user list and profile calls
//!
//! All requests go through one `reqwest::Client` carrying the mobile user
//! agent. Cookies are attached by hand per request; the client keeps no
//! cookie store, so nothing leaks onto the API host.

pub mod users;

pub use users::{UserDataClient, build_profile_payload};

use crate::{Error, Result, config::EndpointSettings};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// Resolved URLs for every remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub login: Url,
    pub token_page: Url,
    pub token_referer: Url,
    pub user_list: Url,
    pub user_list_referer: Url,
    pub profile: Url,
    pub profile_referer: Url,
}

impl Endpoints {
    pub fn from_settings(settings: &EndpointSettings) -> Result<Self> {
        let site = settings.site_url()?;
        let api = settings.api_url()?;
        let join = |base: &Url, path: &str| {
            base.join(path)
                .map_err(|e| Error::config(format!("Invalid endpoint path {}: {}", path, e)))
        };

        Ok(Self {
            login: join(&site, "/login")?,
            token_page: join(&site, "/settings/tokens")?,
            token_referer: join(&site, "/settings")?,
            user_list: join(&site, "/api/users")?,
            user_list_referer: join(&site, "/list")?,
            profile: join(&api, "/api/settings")?,
            profile_referer: join(&site, "/")?,
        })
    }
}

/// Build the shared client with the configured user agent
pub fn build_http_client(settings: &EndpointSettings) -> Result<Client> {
    let client = Client::builder().user_agent(&settings.user_agent).build()?;
    Ok(client)
}

/// Read the body of a response, turning non-2xx statuses into [`Error::Http`]
pub async fn read_success_body(response: Response) -> Result<String> {
    let status = response.status();
    let url = response.url().clone();
    let body = response.text().await?;

    debug!("{} answered {} with {} bytes", url, status.as_u16(), body.len());

    if !status.is_success() {
        return Err(Error::http(status.as_u16(), &body));
    }
    Ok(body)
}

/// Parse a JSON body, turning parse failures into [`Error::MalformedResponse`]
pub fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|_| Error::malformed(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_endpoints_from_default_settings() {
        let endpoints = Endpoints::from_settings(&EndpointSettings::default()).unwrap();

        assert_eq!(endpoints.login.as_str(), "https://challenge.sunvoy.com/login");
        assert_eq!(
            endpoints.token_page.as_str(),
            "https://challenge.sunvoy.com/settings/tokens"
        );
        assert_eq!(
            endpoints.token_referer.as_str(),
            "https://challenge.sunvoy.com/settings"
        );
        assert_eq!(
            endpoints.user_list.as_str(),
            "https://challenge.sunvoy.com/api/users"
        );
        assert_eq!(
            endpoints.user_list_referer.as_str(),
            "https://challenge.sunvoy.com/list"
        );
        assert_eq!(
            endpoints.profile.as_str(),
            "https://api.challenge.sunvoy.com/api/settings"
        );
        assert_eq!(endpoints.profile_referer.as_str(), "https://challenge.sunvoy.com/");
    }

    #[test]
    fn test_parse_json_malformed() {
        let err = parse_json::<Value>("<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
        assert_eq!(err.body_excerpt(), Some("<html>maintenance</html>"));
    }

    #[tokio::test]
    async fn test_read_success_body_maps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
            .mount(&server)
            .await;

        let client = build_http_client(&EndpointSettings::default()).unwrap();
        let response = client
            .get(format!("{}/broken", server.uri()))
            .send()
            .await
            .unwrap();

        let err = read_success_body(response).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.body_excerpt(), Some("down for maintenance"));
    }
}
