//! Shared helpers for integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use sai_core::SaiConfig;
use sai_web::{auth::users::CredentialStore, create_app, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Configuration with a fixed secret and in-memory storage
pub fn test_config() -> SaiConfig {
    let mut config = SaiConfig::default();
    config.auth.jwt_secret = Some(TEST_SECRET.to_string());
    config.storage.database_url = None;
    config
}

/// Test application instance
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let state = AppState::new(test_config()).await.unwrap();
        Self::from_state(state)
    }

    pub async fn with_store(store: Arc<dyn CredentialStore>) -> Self {
        let state = AppState::with_store(test_config(), store).await.unwrap();
        Self::from_state(state)
    }

    fn from_state(state: AppState) -> Self {
        let router = create_app(state.clone());
        Self { state, router }
    }

    /// Send one request through the full middleware stack
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a JSON-typed request with an arbitrary (possibly broken) body
    pub async fn send_raw(&self, uri: &str, body: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn send_with_header(&self, uri: &str, authorization: &str) -> Response {
        let request = Request::builder()
            .uri(uri)
            .header("Authorization", authorization)
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn register(&self, login: &str, password: &str, role: Option<&str>) -> Response {
        let mut body = json!({ "login": login, "password": password });
        if let Some(role) = role {
            body["role"] = json!(role);
        }
        self.send("POST", "/api/v1/auth/register", Some(body), None)
            .await
    }

    pub async fn login(&self, login: &str, password: &str) -> Response {
        self.send(
            "POST",
            "/api/v1/auth/login",
            Some(json!({ "login": login, "password": password })),
            None,
        )
        .await
    }

    /// Log in and return the token, panicking on failure
    pub async fn token_for(&self, login: &str, password: &str) -> String {
        let response = self.login(login, password).await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.token_for("admin", "123456").await
    }

    /// Register a USER and return its token
    pub async fn user_token(&self, login: &str) -> String {
        let response = self.register(login, "password123", None).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        self.token_for(login, "password123").await
    }
}

/// Field names listed in a validation error body
pub fn error_fields(body: &Value) -> Vec<String> {
    body["validation_errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Extract JSON response body
pub async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
