//! Shared fixtures for unit tests: an in-memory database and the real router.

use crate::config::Config;
use crate::handlers::auth::USER_ID_KEY;
use crate::routes;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::Path,
    http::{header, Request, StatusCode},
    routing::post,
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};
use webauthn_authenticator_rs::softpasskey::SoftPasskey;
use webauthn_authenticator_rs::WebauthnAuthenticator;
use webauthn_rs::prelude::{
    CreationChallengeResponse, PublicKeyCredential, RegisterPublicKeyCredential,
    RequestChallengeResponse, Url,
};

/// Every connection to `sqlite::memory:` is its own database, so the pool
/// holds exactly one connection and never recycles it.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    pool
}

pub fn test_config() -> Config {
    Config::from_lookup(|_| None).expect("default config")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub headers: axum::http::HeaderMap,
}

impl TestResponse {
    /// `name=value` part of the session cookie, if one was set.
    pub fn cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let state = AppState::with_pool(test_pool().await, &test_config()).expect("state");

        // Stand-in for a completed passkey login, which needs a real authenticator
        let router = routes::router(state.clone())
            .route("/__test/sign-in/{user_id}", post(sign_in))
            .layer(SessionManagerLayer::new(MemoryStore::default()));

        Self { state, router }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("response body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            body,
            headers,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(request("GET", uri, None, cookie)).await
    }

    pub async fn post(&self, uri: &str, body: &str, cookie: Option<&str>) -> TestResponse {
        self.send(request("POST", uri, Some(body), cookie)).await
    }

    /// Sign in as `user_id` and return the session cookie.
    pub async fn sign_in(&self, user_id: &str) -> String {
        let response = self
            .post(&format!("/__test/sign-in/{user_id}"), "", None)
            .await;
        assert_eq!(response.status, StatusCode::OK);
        response.cookie().expect("session cookie")
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.state.db)
            .await
            .expect("count")
    }
}

/// An in-process authenticator holding real key pairs.
pub struct SoftAuthenticator {
    inner: WebauthnAuthenticator<SoftPasskey>,
    origin: Url,
}

impl SoftAuthenticator {
    pub fn new(config: &Config) -> Self {
        Self {
            // `true` reports user verification, which passkey registration requires
            inner: WebauthnAuthenticator::new(SoftPasskey::new(true)),
            origin: Url::parse(&config.rp_origin).expect("rp origin"),
        }
    }

    /// Answer the `options` of `POST /api/auth/register/options`.
    pub fn create(&mut self, options: &Value) -> RegisterPublicKeyCredential {
        let ccr: CreationChallengeResponse =
            serde_json::from_value(json!({ "publicKey": options })).expect("creation options");

        self.inner
            .do_registration(self.origin.clone(), ccr)
            .expect("soft registration")
    }

    /// Answer the `options` of `POST /api/auth/login/options` with `credential_id`.
    ///
    /// The soft passkey cannot discover credentials on its own, so the id is
    /// handed over as `allowCredentials`.
    pub fn sign(&mut self, options: &Value, credential_id: &str) -> PublicKeyCredential {
        let mut options = options.clone();
        options["allowCredentials"] = json!([{ "type": "public-key", "id": credential_id }]);

        let rcr: RequestChallengeResponse =
            serde_json::from_value(json!({ "publicKey": options })).expect("request options");

        self.inner
            .do_authentication(self.origin.clone(), rcr)
            .expect("soft assertion")
    }
}

pub fn request(method: &str, uri: &str, body: Option<&str>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .expect("request")
}

async fn sign_in(session: Session, Path(user_id): Path<String>) -> StatusCode {
    session
        .insert(USER_ID_KEY, user_id)
        .await
        .expect("session insert");
    StatusCode::OK
}
