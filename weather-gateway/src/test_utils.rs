use crate::config::Settings;
use crate::create_app;
use crate::state::AppState;
use axum::body::{Body, Bytes};
use axum::Router;
use chrono::Duration;
use dev_issuer::{AccessTokenRequest, IssuerState, SigningKey};
use http::{Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Demo secret of the m2m.client registration, as plain text.
const M2M_SECRET: &str = "511536EF-F270-4058-80CA-1C89C192F69A";

/// Overrides for the gateway configuration under test.
#[derive(Debug, Default, Clone)]
pub struct TestOptions {
    pub enforce_sse_token: bool,
    pub require_claim: Option<String>,
}

/// Test fixture that runs a real dev-issuer on an ephemeral port and builds
/// the gateway against it, so token verification exercises the full JWKS
/// fetch path.
pub struct TestFixture {
    /// Base URL of the running issuer
    pub issuer_url: String,
    /// Signing key shared with the issuer, for minting tokens directly
    key: Arc<SigningKey>,
    state: AppState,
}

impl TestFixture {
    pub async fn start() -> Self {
        Self::start_with(TestOptions::default()).await
    }

    pub async fn start_with(options: TestOptions) -> Self {
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();

        // Bind first so the issuer URL is known before the server runs.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind issuer listener");
        let issuer_url = format!("http://{}", listener.local_addr().unwrap());

        let issuer = IssuerState::demo(&issuer_url).expect("Failed to build demo issuer");
        let key = issuer.key.clone();
        let router = issuer.router();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Issuer server failed");
        });

        let mut settings = Settings::for_test(&issuer_url);
        settings.gateway.enforce_sse_token = options.enforce_sse_token;
        settings.gateway.require_claim = options.require_claim;

        let state = AppState::new(settings).expect("Failed to build gateway state");
        Self {
            issuer_url,
            key,
            state,
        }
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// The full gateway application, middleware and all.
    pub fn app(&self) -> Router {
        create_app(self.state())
    }

    /// Mints a user token with the given space-separated scopes, signed by
    /// the issuer's own key.
    pub fn user_token(&self, scope: &str) -> String {
        self.mint(Some("alice"), "interactive", scope, "api", Duration::seconds(300))
    }

    /// A token that expired an hour ago, well past any validation leeway.
    pub fn expired_user_token(&self, scope: &str) -> String {
        self.mint(
            Some("alice"),
            "interactive",
            scope,
            "api",
            Duration::seconds(-3600),
        )
    }

    /// A valid token minted for some other API.
    pub fn token_for_audience(&self, audience: &str, scope: &str) -> String {
        self.mint(Some("alice"), "interactive", scope, audience, Duration::seconds(300))
    }

    fn mint(
        &self,
        subject: Option<&str>,
        client_id: &str,
        scope: &str,
        audience: &str,
        lifetime: Duration,
    ) -> String {
        dev_issuer::token::mint_access_token(
            &self.key,
            &AccessTokenRequest {
                issuer: &self.issuer_url,
                audience,
                subject,
                client_id,
                scope,
                lifetime,
            },
        )
        .expect("Failed to mint test token")
    }

    /// Runs the real client-credentials flow against the issuer and returns
    /// the machine token.
    pub async fn client_credentials_token(&self) -> String {
        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/connect/token", self.issuer_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", "m2m.client"),
                ("client_secret", M2M_SECRET),
                ("scope", "api"),
            ])
            .send()
            .await
            .expect("Token request failed");
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: Value = response.json().await.expect("Token response not JSON");
        body["access_token"]
            .as_str()
            .expect("No access_token in response")
            .to_string()
    }

    pub async fn get(&self, app: &Router, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(app, Method::GET, uri, token, Vec::new()).await
    }

    pub async fn post(
        &self,
        app: &Router,
        uri: &str,
        token: Option<&str>,
        body: Vec<u8>,
    ) -> TestResponse {
        self.send(app, Method::POST, uri, token, body).await
    }

    pub async fn get_json(&self, app: &Router, uri: &str, token: Option<&str>) -> Value {
        let response = self.get(app, uri, token).await;
        response.assert_status(StatusCode::OK);
        response.json()
    }

    /// Sends a request and returns the raw response without reading the
    /// body. Required for the event stream, whose body never ends.
    pub async fn get_head(&self, app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty()).expect("Failed to build request");
        app.clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    async fn send(
        &self,
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Vec<u8>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body)).expect("Failed to build request");

        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        TestResponse { status, body }
    }
}

/// Response from a test request with convenient accessors.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl TestResponse {
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("Response body is not UTF-8")
    }

    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to deserialize response JSON")
    }
}
