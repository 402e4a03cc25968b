use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, StoreBackend};
use crate::database::{DatabaseManager, MemoryStore, PgStore};
use crate::handlers::{protected, public};
use crate::middleware::token_auth_middleware;
use crate::state::AppState;

/// Build the full router for the given state
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        // Public
        .merge(public_routes())
        // Protected
        .merge(recipe_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if let Some(cors) = cors_layer(config) {
        router = router.layer(cors);
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
}

fn recipe_routes(state: AppState) -> Router<AppState> {
    use protected::recipes;

    let collection = || get(recipes::list).post(recipes::create);
    let record = || {
        get(recipes::retrieve)
            .put(recipes::update)
            .patch(recipes::partial_update)
            .delete(recipes::destroy)
    };

    Router::new()
        .route("/recipes-list/", collection())
        .route("/recipes-list", collection())
        .route("/recipes-list/:id/", record())
        .route("/recipes-list/:id", record())
        // route_layer: authentication runs only for matched routes, ahead of extractors
        .route_layer(middleware::from_fn_with_state(state, token_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }
    if config.security.cors_origins.is_empty() {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    )
}

/// Open the configured store and wrap it as handler state
pub async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    match config.store {
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to PostgreSQL")?;
            if config.database.run_migrations {
                DatabaseManager::migrate(&pool)
                    .await
                    .context("failed to apply migrations")?;
            }
            Ok(AppState::from_store(PgStore::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on shutdown");
            let store = MemoryStore::new();
            if let Some(username) = &config.server.dev_user {
                store.create_user(username).await?;
                let token = store.issue_token(username).await?;
                // Development only: the memory store never persists this key
                tracing::warn!(
                    "Seeded development user '{}' (id {}) with token {} (development only, do not use in shared environments)",
                    token.username,
                    token.user_id,
                    token.key
                );
            }
            Ok(AppState::from_store(store))
        }
    }
}

/// Bind the listener and serve until Ctrl-C
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let state = build_state(config).await?;
    let app = app(state, config);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Recipes API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
