use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::database::memory::MemoryStore;
use crate::database::models::{NewRecipe, Recipe, User};
use crate::database::repository::RecipeRepository;
use crate::server;
use crate::state::AppState;

/// Router over a fresh in-memory store with one user holding a token
pub struct TestContext {
    pub store: MemoryStore,
    pub user: User,
    pub token: String,
    app: Router,
}

/// Status and decoded JSON body of a test request (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestContext {
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        let user = store.create_user("testuser").await.expect("seed user");
        let token = store.issue_token("testuser").await.expect("seed token").key;

        let mut config = AppConfig::development();
        config.api.enable_request_logging = false;
        let app = server::app(AppState::from_store(store.clone()), &config);

        Self { store, user, token, app }
    }

    pub fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Insert a recipe straight into the store
    pub async fn create_recipe(&self, title: &str) -> Recipe {
        self.store
            .create(NewRecipe::new(title, "Beschreibung", self.user.id))
            .await
            .expect("seed recipe")
    }

    pub async fn recipe_count(&self) -> i64 {
        self.store.count().await.expect("count")
    }

    /// Send a request authenticated as the seeded user
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let auth = self.auth_header();
        self.send_with(method, uri, Some(&auth), body).await
    }

    /// Send a request with an explicit (or no) Authorization header
    pub async fn send_with(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = authorization {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        self.dispatch(request).await
    }

    /// Send a prepared request
    pub async fn dispatch(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.expect("infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, body }
    }
}
