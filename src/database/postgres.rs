//! PostgreSQL store backed by a sqlx pool.
//!
//! Implements both the recipe repository and the identity provider, plus the
//! user and token administration used by the `recipes` CLI.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::{generate_token_key, token_digest, IdentityProvider, IssuedToken};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{validate_username, NewRecipe, Recipe, RecipeChanges, User};
use crate::database::repository::{recipe_not_found, RecipeRepository};

const RECIPE_COLUMNS: &str = "id, title, description, created_at, author_id";
const USER_COLUMNS: &str = "id, username, is_active, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create_user(&self, username: &str) -> Result<User, DatabaseError> {
        validate_username(username)?;
        let sql = format!(
            "INSERT INTO users (username) VALUES ($1) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    pub async fn set_active(&self, username: &str, is_active: bool) -> Result<User, DatabaseError> {
        let sql = format!(
            "UPDATE users SET is_active = $2 WHERE username = $1 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| user_not_found(username))
    }

    /// Delete a user; their token and recipes go with them
    pub async fn delete_user(&self, username: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(user_not_found(username));
        }
        Ok(())
    }

    /// Issue a new token for the user, replacing any previous one
    pub async fn issue_token(&self, username: &str) -> Result<IssuedToken, DatabaseError> {
        let user = self
            .find_user(username)
            .await?
            .ok_or_else(|| user_not_found(username))?;

        let key = generate_token_key();
        sqlx::query(
            "INSERT INTO auth_tokens (user_id, key_digest) VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE
             SET key_digest = EXCLUDED.key_digest, created_at = now()",
        )
        .bind(user.id)
        .bind(token_digest(&key))
        .execute(&self.pool)
        .await?;

        Ok(IssuedToken {
            user_id: user.id,
            username: user.username,
            key,
        })
    }

    /// Returns whether a token existed
    pub async fn revoke_token(&self, username: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "DELETE FROM auth_tokens t USING users u WHERE t.user_id = u.id AND u.username = $1",
        )
        .bind(username)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RecipeRepository for PgStore {
    async fn list(&self) -> Result<Vec<Recipe>, DatabaseError> {
        let sql = format!("SELECT {} FROM recipes ORDER BY id", RECIPE_COLUMNS);
        let recipes = sqlx::query_as::<_, Recipe>(&sql).fetch_all(&self.pool).await?;
        Ok(recipes)
    }

    async fn get(&self, id: i64) -> Result<Recipe, DatabaseError> {
        let sql = format!("SELECT {} FROM recipes WHERE id = $1", RECIPE_COLUMNS);
        sqlx::query_as::<_, Recipe>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| recipe_not_found(id))
    }

    async fn create(&self, recipe: NewRecipe) -> Result<Recipe, DatabaseError> {
        let sql = format!(
            "INSERT INTO recipes (title, description, author_id) VALUES ($1, $2, $3) RETURNING {}",
            RECIPE_COLUMNS
        );
        let created = sqlx::query_as::<_, Recipe>(&sql)
            .bind(&recipe.title)
            .bind(&recipe.description)
            .bind(recipe.author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(e).with_referenced_pk(recipe.author_id))?;
        Ok(created)
    }

    async fn update(&self, id: i64, changes: RecipeChanges) -> Result<Recipe, DatabaseError> {
        if changes.is_empty() {
            return self.get(id).await;
        }

        let sql = format!(
            "UPDATE recipes SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                author_id = COALESCE($4, author_id)
             WHERE id = $1
             RETURNING {}",
            RECIPE_COLUMNS
        );
        let author_id = changes.author_id;
        sqlx::query_as::<_, Recipe>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.author_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match author_id {
                Some(author_id) => DatabaseError::from(e).with_referenced_pk(author_id),
                None => DatabaseError::from(e),
            })?
            .ok_or_else(|| recipe_not_found(id))
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(recipe_not_found(id));
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

#[async_trait]
impl IdentityProvider for PgStore {
    async fn user_for_token(&self, key: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.is_active, u.created_at
             FROM users u
             JOIN auth_tokens t ON t.user_id = u.id
             WHERE t.key_digest = $1",
        )
        .bind(token_digest(key))
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn user_exists(&self, user_id: i64) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

pub(crate) fn user_not_found(username: &str) -> DatabaseError {
    DatabaseError::NotFound(format!("User '{}' not found", username))
}
