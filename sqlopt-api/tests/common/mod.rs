/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - In-memory SQLite store and scripted completion client
/// - Router built from the testing configuration
/// - Register/login helpers and a JSON request helper

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use serde_json::{json, Value};
use sqlopt_api::app::{build_router, AppState};
use sqlopt_api::config::Config;
use sqlopt_shared::auth::session::SessionStore;
use sqlopt_shared::llm::MockCompletionClient;
use sqlopt_shared::store::sqlite::SqliteStore;
use sqlopt_shared::store::Store;
use std::sync::Arc;
use tower::Service as _;

/// Allowlisted admin in `Config::for_testing`
pub const ADMIN_EMAIL: &str = "admin@example.com";

pub const PASSWORD: &str = "correct horse battery";

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<dyn Store>,
    pub llm: MockCompletionClient,
    pub sessions: SessionStore,
}

/// Decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl TestContext {
    /// Creates a new test context with a fresh in-memory database
    pub async fn new() -> anyhow::Result<Self> {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().await?);
        let llm = MockCompletionClient::new();

        let state = AppState::new(store.clone(), Arc::new(llm.clone()), Config::for_testing());
        let sessions = state.sessions.clone();
        let app = build_router(state);

        Ok(TestContext {
            app,
            store,
            llm,
            sessions,
        })
    }

    /// Sends a request with an optional bearer token and JSON body
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response: Response<Body> = self
            .app
            .clone()
            .call(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Registers an account and asserts success
    pub async fn register(&self, email: &str, name: &str) {
        let response = self
            .request(
                "POST",
                "/v1/auth/register",
                None,
                Some(json!({ "email": email, "name": name, "password": PASSWORD })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
    }

    /// Logs in and returns the session token
    pub async fn login(&self, email: &str) -> String {
        let response = self
            .request(
                "POST",
                "/v1/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.text());
        response.json()["token"]
            .as_str()
            .map(str::to_string)
            .unwrap()
    }

    /// Registers and logs in
    pub async fn sign_up(&self, email: &str, name: &str) -> String {
        self.register(email, name).await;
        self.login(email).await
    }

    /// Runs one analysis and returns the response
    pub async fn analyze(&self, token: &str, task: &str, sql: &str) -> TestResponse {
        self.request(
            "POST",
            "/v1/optimizer/analyze",
            Some(token),
            Some(json!({ "task": task, "sql": sql })),
        )
        .await
    }
}
