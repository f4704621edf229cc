#![allow(dead_code)]

/// Common test utilities for integration tests
///
/// Every test gets a fresh router over an in-memory store and a recording
/// mailer, so the suite needs no database or network.

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use taskapp_api::app::{build_router, AppState};
use taskapp_api::config::Config;
use taskapp_shared::notify::FakeMailer;
use taskapp_shared::store::InMemoryUserStore;
use tower::Service as _;

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<InMemoryUserStore>,
    pub mailer: Arc<FakeMailer>,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        let config = Config::for_tests();
        let store = Arc::new(InMemoryUserStore::new());
        let mailer = Arc::new(FakeMailer::new());

        let state = AppState::new(store.clone(), mailer.clone(), config.clone());
        let app = build_router(state);

        Self {
            app,
            store,
            mailer,
            config,
        }
    }

    /// Sends a request through the router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().call(request).await.unwrap()
    }

    /// Sends a JSON request, optionally authenticated
    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = self
            .send(builder.body(Body::from(body.to_string())).unwrap())
            .await;
        read_json(response).await
    }

    /// Sends a body-less request, optionally authenticated
    pub async fn empty(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = self.send(builder.body(Body::empty()).unwrap()).await;
        read_json(response).await
    }

    /// Registers a user and returns `(user json, token)`
    pub async fn register(&self, name: &str, email: &str, password: &str) -> (Value, String) {
        let (status, body) = self
            .json(
                "POST",
                "/users",
                None,
                json!({ "name": name, "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        let token = body["token"].as_str().unwrap().to_string();
        (body["user"].clone(), token)
    }

    /// Logs in and returns the new token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .json(
                "POST",
                "/users/login",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        body["token"].as_str().unwrap().to_string()
    }
}

/// Reads a response body as JSON; empty bodies become `Value::Null`
pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    if body.is_empty() {
        return (status, Value::Null);
    }
    (status, serde_json::from_slice(&body).unwrap())
}

/// Helper to wait for condition with timeout
pub async fn wait_for<F>(condition: F, timeout_ms: u64) -> bool
where
    F: Fn() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);

    loop {
        if condition() {
            return true;
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
