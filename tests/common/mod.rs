#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

use recipes_api::config::AppConfig;
use recipes_api::database::models::User;
use recipes_api::database::{MemoryStore, RecipeRepository};
use recipes_api::server;
use recipes_api::state::AppState;

/// A server bound to a free local port, backed by its own in-memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: MemoryStore,
    pub user: User,
    pub token: String,
    client: reqwest::Client,
}

impl TestServer {
    async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let store = MemoryStore::new();
        let user = store.create_user("testuser").await?;
        let token = store.issue_token("testuser").await?.key;

        let mut config = AppConfig::development();
        config.server.port = port;
        config.api.enable_request_logging = false;

        let app = server::app(AppState::from_store(store.clone()), &config);
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            port,
            base_url,
            store,
            user,
            token,
            client: reqwest::Client::new(),
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = self.client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Request builder that already carries the seeded user's token
    pub fn authed(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
    }

    /// Request builder without credentials
    pub fn anonymous(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, self.url(path))
    }

    pub async fn recipe_count(&self) -> Result<i64> {
        Ok(self.store.count().await?)
    }

    /// Create a recipe through the API and return its JSON representation
    pub async fn create_recipe(&self, title: &str, description: &str) -> Result<Value> {
        let res = self
            .authed(reqwest::Method::POST, "/recipes-list/")
            .json(&serde_json::json!({
                "title": title,
                "description": description,
                "author": self.user.id,
            }))
            .send()
            .await?;
        anyhow::ensure!(
            res.status() == StatusCode::CREATED,
            "create returned {}",
            res.status()
        );
        Ok(res.json().await?)
    }
}

/// Start a fresh server for the calling test
pub async fn start_server() -> Result<TestServer> {
    let server = TestServer::spawn().await?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
