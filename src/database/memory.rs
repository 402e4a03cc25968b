//! In-process store for development runs and tests.
//!
//! Mirrors the PostgreSQL schema's constraints: usernames are unique and fit
//! their column, each user holds at most one token, recipes must reference an
//! existing author, and deleting a user cascades to their token and recipes.

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::{generate_token_key, token_digest, IdentityProvider, IssuedToken};
use crate::database::manager::DatabaseError;
use crate::database::models::{validate_username, NewRecipe, Recipe, RecipeChanges, User};
use crate::database::postgres::user_not_found;
use crate::database::repository::{recipe_not_found, RecipeRepository};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    /// token digest -> user id
    tokens: HashMap<String, i64>,
    recipes: BTreeMap<i64, Recipe>,
    last_user_id: i64,
    last_recipe_id: i64,
}

impl Tables {
    fn user_by_name(&self, username: &str) -> Option<&User> {
        self.users.values().find(|u| u.username == username)
    }

    fn require_author(&self, author_id: i64) -> Result<(), DatabaseError> {
        if self.users.contains_key(&author_id) {
            Ok(())
        } else {
            Err(DatabaseError::ForeignKey { field: "author", pk: Some(author_id) })
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_user(&self, username: &str) -> Result<User, DatabaseError> {
        validate_username(username)?;
        let mut tables = self.tables.write().await;
        if tables.user_by_name(username).is_some() {
            return Err(DatabaseError::Conflict(format!(
                "User '{}' already exists",
                username
            )));
        }

        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            username: username.to_string(),
            is_active: true,
            created_at: Utc::now().trunc_subsecs(6),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.user_by_name(username).cloned())
    }

    pub async fn set_active(&self, username: &str, is_active: bool) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .values_mut()
            .find(|u| u.username == username)
            .ok_or_else(|| user_not_found(username))?;
        user.is_active = is_active;
        Ok(user.clone())
    }

    /// Delete a user; their token and recipes go with them
    pub async fn delete_user(&self, username: &str) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let user_id = tables
            .user_by_name(username)
            .map(|u| u.id)
            .ok_or_else(|| user_not_found(username))?;

        tables.users.remove(&user_id);
        tables.tokens.retain(|_, owner| *owner != user_id);
        tables.recipes.retain(|_, recipe| recipe.author_id != user_id);
        Ok(())
    }

    /// Issue a new token for the user, replacing any previous one
    pub async fn issue_token(&self, username: &str) -> Result<IssuedToken, DatabaseError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .user_by_name(username)
            .cloned()
            .ok_or_else(|| user_not_found(username))?;

        let key = generate_token_key();
        tables.tokens.retain(|_, owner| *owner != user.id);
        tables.tokens.insert(token_digest(&key), user.id);

        Ok(IssuedToken {
            user_id: user.id,
            username: user.username,
            key,
        })
    }
}

#[async_trait]
impl RecipeRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Recipe>, DatabaseError> {
        Ok(self.tables.read().await.recipes.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Recipe, DatabaseError> {
        self.tables
            .read()
            .await
            .recipes
            .get(&id)
            .cloned()
            .ok_or_else(|| recipe_not_found(id))
    }

    async fn create(&self, recipe: NewRecipe) -> Result<Recipe, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.require_author(recipe.author_id)?;

        tables.last_recipe_id += 1;
        let created = Recipe {
            id: tables.last_recipe_id,
            title: recipe.title,
            description: recipe.description,
            created_at: Utc::now().trunc_subsecs(6),
            author_id: recipe.author_id,
        };
        tables.recipes.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, changes: RecipeChanges) -> Result<Recipe, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.recipes.contains_key(&id) {
            return Err(recipe_not_found(id));
        }
        if let Some(author_id) = changes.author_id {
            tables.require_author(author_id)?;
        }

        let recipe = tables
            .recipes
            .get_mut(&id)
            .ok_or_else(|| recipe_not_found(id))?;
        changes.apply_to(recipe);
        Ok(recipe.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        self.tables
            .write()
            .await
            .recipes
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| recipe_not_found(id))
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        Ok(self.tables.read().await.recipes.len() as i64)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for MemoryStore {
    async fn user_for_token(&self, key: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tokens
            .get(&token_digest(key))
            .and_then(|user_id| tables.users.get(user_id))
            .cloned())
    }

    async fn user_exists(&self, user_id: i64) -> Result<bool, DatabaseError> {
        Ok(self.tables.read().await.users.contains_key(&user_id))
    }
}
