//! Store and admin CLI checks against a real PostgreSQL database.
//!
//! Every test returns early unless `DATABASE_URL` points at a disposable
//! database; migrations are applied on first use.

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use clap::Parser;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use tokio::sync::{Mutex, MutexGuard};
use tower::ServiceExt;

use recipes_api::auth::IdentityProvider;
use recipes_api::cli::{self, Cli};
use recipes_api::config::AppConfig;
use recipes_api::database::models::{NewRecipe, RecipeChanges, USERNAME_MAX_LENGTH};
use recipes_api::database::{DatabaseError, DatabaseManager, PgStore, RecipeRepository};
use recipes_api::server;
use recipes_api::state::AppState;

// Tests share one database; counts are only meaningful one test at a time
static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct PgFixture {
    store: PgStore,
    url: String,
    _guard: MutexGuard<'static, ()>,
}

async fn pg_fixture() -> Result<Option<PgFixture>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping PostgreSQL test");
        return Ok(None);
    };
    let guard = DB_LOCK.lock().await;

    let mut config = AppConfig::development().database;
    config.url = Some(url.clone());
    let pool = DatabaseManager::connect(&config).await?;
    DatabaseManager::migrate(&pool).await?;

    Ok(Some(PgFixture {
        store: PgStore::new(pool),
        url,
        _guard: guard,
    }))
}

fn unique_name(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

#[tokio::test]
async fn recipe_lifecycle_round_trips_through_postgres() -> Result<()> {
    let Some(fx) = pg_fixture().await? else { return Ok(()) };
    let store = &fx.store;
    let author = store.create_user(&unique_name("author")).await?;
    let other = store.create_user(&unique_name("other")).await?;
    let before = store.count().await?;

    let created = store.create(NewRecipe::new("Soup", "Warm", author.id)).await?;
    assert_eq!(store.count().await?, before + 1);
    assert_eq!(store.get(created.id).await?, created);
    assert!(store.list().await?.contains(&created));

    // Unset fields keep their stored values
    let patched = store
        .update(
            created.id,
            RecipeChanges {
                title: Some("Stew".to_string()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(patched.title, "Stew");
    assert_eq!(patched.description, "Warm");
    assert_eq!(patched.created_at, created.created_at);

    let reassigned = store
        .update(
            created.id,
            RecipeChanges {
                author_id: Some(other.id),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(reassigned.author_id, other.id);
    assert_eq!(reassigned.title, "Stew");

    assert_eq!(store.update(created.id, RecipeChanges::default()).await?, reassigned);

    store.delete(created.id).await?;
    assert_eq!(store.count().await?, before);
    assert!(matches!(store.get(created.id).await, Err(DatabaseError::NotFound(_))));
    assert!(matches!(store.delete(created.id).await, Err(DatabaseError::NotFound(_))));
    assert!(matches!(
        store.update(created.id, RecipeChanges::default()).await,
        Err(DatabaseError::NotFound(_))
    ));

    for name in [&author.username, &other.username] {
        store.delete_user(name).await?;
    }
    Ok(())
}

#[tokio::test]
async fn missing_author_maps_to_foreign_key_error() -> Result<()> {
    let Some(fx) = pg_fixture().await? else { return Ok(()) };
    let store = &fx.store;
    let author = store.create_user(&unique_name("author")).await?;
    let ghost = i64::MAX;

    let err = store.create(NewRecipe::new("Soup", "Warm", ghost)).await.unwrap_err();
    assert!(matches!(err, DatabaseError::ForeignKey { field: "author", pk: Some(pk) } if pk == ghost));

    let created = store.create(NewRecipe::new("Soup", "Warm", author.id)).await?;
    let err = store
        .update(
            created.id,
            RecipeChanges {
                author_id: Some(ghost),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::ForeignKey { field: "author", pk: Some(pk) } if pk == ghost));
    assert_eq!(store.get(created.id).await?.author_id, author.id);

    store.delete_user(&author.username).await?;
    Ok(())
}

#[tokio::test]
async fn usernames_are_unique_and_bounded() -> Result<()> {
    let Some(fx) = pg_fixture().await? else { return Ok(()) };
    let store = &fx.store;
    let name = unique_name("dup");

    store.create_user(&name).await?;
    assert!(matches!(store.create_user(&name).await, Err(DatabaseError::Conflict(_))));

    let too_long = "u".repeat(USERNAME_MAX_LENGTH + 1);
    assert!(matches!(
        store.create_user(&too_long).await,
        Err(DatabaseError::InvalidValue(_))
    ));

    store.delete_user(&name).await?;
    Ok(())
}

#[tokio::test]
async fn reissued_token_replaces_previous_and_revoke_removes_it() -> Result<()> {
    let Some(fx) = pg_fixture().await? else { return Ok(()) };
    let store = &fx.store;
    let user = store.create_user(&unique_name("holder")).await?;

    let old = store.issue_token(&user.username).await?;
    let new = store.issue_token(&user.username).await?;
    assert_ne!(old.key, new.key);
    assert!(store.user_for_token(&old.key).await?.is_none());
    assert_eq!(store.user_for_token(&new.key).await?, Some(user.clone()));

    assert!(store.revoke_token(&user.username).await?);
    assert!(store.user_for_token(&new.key).await?.is_none());
    assert!(!store.revoke_token(&user.username).await?);

    let deactivated = store.set_active(&user.username, false).await?;
    assert!(!deactivated.is_active);

    store.delete_user(&user.username).await?;
    assert!(matches!(
        store.issue_token(&user.username).await,
        Err(DatabaseError::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn deleting_a_user_cascades_to_token_and_recipes() -> Result<()> {
    let Some(fx) = pg_fixture().await? else { return Ok(()) };
    let store = &fx.store;
    let user = store.create_user(&unique_name("leaving")).await?;
    let token = store.issue_token(&user.username).await?;
    let recipe = store.create(NewRecipe::new("Soup", "Warm", user.id)).await?;

    store.delete_user(&user.username).await?;

    assert!(matches!(store.get(recipe.id).await, Err(DatabaseError::NotFound(_))));
    assert!(store.user_for_token(&token.key).await?.is_none());
    assert!(!store.user_exists(user.id).await?);
    assert!(matches!(
        store.delete_user(&user.username).await,
        Err(DatabaseError::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn admin_cli_manages_users_and_tokens() -> Result<()> {
    let Some(fx) = pg_fixture().await? else { return Ok(()) };
    let config = AppConfig::development();
    let name = unique_name("cli");
    let run = |args: &[&str]| {
        let mut argv: Vec<String> = ["recipes", "--json", "--database-url", fx.url.as_str()]
            .iter()
            .map(|arg| arg.to_string())
            .collect();
        argv.extend(args.iter().map(|arg| arg.to_string()));
        Cli::try_parse_from(argv)
    };

    cli::run(run(&["migrate"])?, &config).await?;
    cli::run(run(&["user", "create", &name])?, &config).await?;
    let user = fx.store.find_user(&name).await?.expect("created by cli");
    assert!(user.is_active);

    cli::run(run(&["token", "create", &name])?, &config).await?;
    cli::run(run(&["user", "deactivate", &name])?, &config).await?;
    assert!(!fx.store.find_user(&name).await?.expect("still present").is_active);
    cli::run(run(&["user", "activate", &name])?, &config).await?;

    assert!(fx.store.revoke_token(&name).await?, "cli should have issued a token");
    cli::run(run(&["token", "revoke", &name])?, &config).await?;

    cli::run(run(&["user", "delete", &name])?, &config).await?;
    assert!(fx.store.find_user(&name).await?.is_none());
    assert!(cli::run(run(&["user", "delete", &name])?, &config).await.is_err());
    Ok(())
}

#[tokio::test]
async fn null_character_in_title_is_rejected_before_reaching_postgres() -> Result<()> {
    let Some(fx) = pg_fixture().await? else { return Ok(()) };
    let user = fx.store.create_user(&unique_name("writer")).await?;
    let token = fx.store.issue_token(&user.username).await?;
    let before = fx.store.count().await?;

    let mut config = AppConfig::development();
    config.api.enable_request_logging = false;
    let app = server::app(AppState::from_store(fx.store.clone()), &config);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/recipes-list/")
        .header(header::AUTHORIZATION, format!("Token {}", token.key))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "title": "So\u{0}up", "description": "Warm", "author": user.id }).to_string(),
        ))?;
    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await?)?;
    assert_eq!(body["field_errors"]["title"], "Null characters are not allowed.");
    assert_eq!(fx.store.count().await?, before);

    fx.store.delete_user(&user.username).await?;
    Ok(())
}
