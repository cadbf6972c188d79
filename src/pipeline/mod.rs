//! End-to-end sync run
//!
//! Wires the session, token, user and profile steps together and hands the
//! merged snapshot to a sink exactly once.

pub mod sink;

pub use sink::{FileSink, SnapshotSink, render_snapshot};

use crate::{
    Error, Result, Settings,
    browser::BrowserLauncher,
    client::{Endpoints, UserDataClient, build_http_client},
    session::{SessionEstablisher, TokenExtractor},
    signing::{DEFAULT_SECRET, RequestSigner},
    types::{Credentials, Identity, Snapshot},
};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

/// Stage of a run, used to give failures context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    EstablishSession,
    ListUsers,
    ExtractToken,
    FetchProfile,
    PersistSnapshot,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::EstablishSession => "establish session",
            Step::ListUsers => "list users",
            Step::ExtractToken => "extract token",
            Step::FetchProfile => "fetch profile",
            Step::PersistSnapshot => "persist snapshot",
        };
        f.write_str(name)
    }
}

fn tag<T>(step: Step, result: Result<T>) -> Result<T> {
    result.inspect_err(|e| error!(%step, "Step failed: {}", e))
}

/// Strictly sequential login, fetch and persist
pub struct AggregationPipeline {
    establisher: SessionEstablisher,
    tokens: TokenExtractor,
    users: UserDataClient,
    identity: Identity,
    sink: Arc<dyn SnapshotSink>,
}

impl AggregationPipeline {
    /// Build a pipeline signing with the default shared secret
    pub fn new(
        settings: &Settings,
        launcher: Arc<dyn BrowserLauncher>,
        identity: Identity,
        sink: Arc<dyn SnapshotSink>,
    ) -> Result<Self> {
        Self::with_signer(
            settings,
            launcher,
            identity,
            sink,
            RequestSigner::new(DEFAULT_SECRET)?,
        )
    }

    pub fn with_signer(
        settings: &Settings,
        launcher: Arc<dyn BrowserLauncher>,
        identity: Identity,
        sink: Arc<dyn SnapshotSink>,
        signer: RequestSigner,
    ) -> Result<Self> {
        let endpoints = Endpoints::from_settings(&settings.endpoints)?;
        let client = build_http_client(&settings.endpoints)?;

        Ok(Self {
            establisher: SessionEstablisher::new(launcher, &endpoints, settings.browser.clone()),
            tokens: TokenExtractor::new(client.clone(), endpoints.clone()),
            users: UserDataClient::new(client, endpoints, signer),
            identity,
            sink,
        })
    }

    /// Run every step in order and persist the result.
    ///
    /// The first failure aborts the run and nothing is persisted.
    pub async fn run(&self, credentials: &Credentials) -> Result<Snapshot> {
        info!("Starting sync run");

        let session = tag(
            Step::EstablishSession,
            self.establisher
                .establish_session(credentials)
                .await
                .and_then(|session| session.ok_or(Error::NoSessionEstablished)),
        )?;

        let users = tag(Step::ListUsers, self.users.list_users(&session).await)?;

        let bundle = tag(
            Step::ExtractToken,
            self.tokens.token_bundle(&session, &self.identity).await,
        )?;

        let profile = tag(
            Step::FetchProfile,
            self.users.fetch_authenticated_profile(&bundle).await,
        )?;

        let snapshot = Snapshot::new(users, profile);
        tag(Step::PersistSnapshot, self.sink.write(&snapshot).await)?;

        info!("Sync run finished with {} records", snapshot.len());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BrowserContext, BrowserCookie, BrowserPage, WaitPolicy};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Browser whose login always yields the given cookies
    struct CannedBrowser {
        cookies: Vec<BrowserCookie>,
    }

    #[async_trait]
    impl BrowserLauncher for CannedBrowser {
        async fn launch(&self) -> Result<Box<dyn BrowserContext>> {
            Ok(Box::new(CannedBrowser {
                cookies: self.cookies.clone(),
            }))
        }
    }

    #[async_trait]
    impl BrowserContext for CannedBrowser {
        async fn new_page(&mut self) -> Result<Box<dyn BrowserPage>> {
            Ok(Box::new(CannedBrowser {
                cookies: self.cookies.clone(),
            }))
        }

        async fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl BrowserPage for CannedBrowser {
        async fn goto(&self, _url: &str, _wait: WaitPolicy) -> Result<()> {
            Ok(())
        }

        async fn evaluate(&self, expression: &str) -> Result<Value> {
            if expression.contains("querySelector") {
                Ok(json!("nonce"))
            } else {
                Ok(json!(200))
            }
        }

        async fn cookies(&self) -> Result<Vec<BrowserCookie>> {
            Ok(self.cookies.clone())
        }
    }

    #[derive(Default)]
    struct MemorySink {
        written: Mutex<Vec<Snapshot>>,
    }

    #[async_trait]
    impl SnapshotSink for MemorySink {
        async fn write(&self, snapshot: &Snapshot) -> Result<()> {
            self.written.lock().unwrap().push(snapshot.clone());
            Ok(())
        }
    }

    fn pipeline(server: &MockServer, cookies: Vec<BrowserCookie>) -> (AggregationPipeline, Arc<MemorySink>) {
        let mut settings = Settings::default();
        settings.endpoints.site_base = server.uri();
        settings.endpoints.api_base = server.uri();
        settings.browser.settle_delay_ms = 0;

        let sink = Arc::new(MemorySink::default());
        let pipeline = AggregationPipeline::new(
            &settings,
            Arc::new(CannedBrowser { cookies }),
            Identity::new("demo", "u-1", "o-1", "op-1"),
            sink.clone(),
        )
        .unwrap();
        (pipeline, sink)
    }

    fn credentials() -> Credentials {
        Credentials::new("demo@example.org", "secret")
    }

    async fn mount_happy_path(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}, {"id": "2"}])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/settings/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"<input name="access_token" value="tk">"#))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/settings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "me"})))
            .mount(server)
            .await;
    }

    #[test]
    fn test_step_names() {
        assert_eq!(Step::EstablishSession.to_string(), "establish session");
        assert_eq!(Step::FetchProfile.to_string(), "fetch profile");
    }

    #[tokio::test]
    async fn test_run_persists_once() {
        let server = MockServer::start().await;
        mount_happy_path(&server).await;
        let (pipeline, sink) = pipeline(&server, vec![BrowserCookie::new("sid", "abc")]);

        let snapshot = pipeline.run(&credentials()).await.unwrap();

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.authenticated_user(), &json!({"id": "me"}));
        let written = sink.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0], snapshot);
    }

    #[tokio::test]
    async fn test_no_cookies_aborts_before_any_request() {
        let server = MockServer::start().await;
        let (pipeline, sink) = pipeline(&server, Vec::new());

        let err = pipeline.run(&credentials()).await.unwrap_err();

        assert!(matches!(err, Error::NoSessionEstablished));
        assert!(server.received_requests().await.unwrap().is_empty());
        assert!(sink.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_skips_profile_and_persistence() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/settings/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>nothing</p>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/settings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;
        let (pipeline, sink) = pipeline(&server, vec![BrowserCookie::new("sid", "abc")]);

        let err = pipeline.run(&credentials()).await.unwrap_err();

        assert!(matches!(err, Error::NoTokenFound { .. }));
        assert!(sink.written.lock().unwrap().is_empty());
    }
}
