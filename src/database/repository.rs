use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewRecipe, Recipe, RecipeChanges};

/// Persistence operations for recipes.
///
/// Each method is a single atomic statement against the backing store.
/// Missing rows are reported as `DatabaseError::NotFound`.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// All recipes ordered by id ascending
    async fn list(&self) -> Result<Vec<Recipe>, DatabaseError>;

    async fn get(&self, id: i64) -> Result<Recipe, DatabaseError>;

    /// Insert a recipe; the store assigns `id` and `created_at`
    async fn create(&self, recipe: NewRecipe) -> Result<Recipe, DatabaseError>;

    async fn update(&self, id: i64, changes: RecipeChanges) -> Result<Recipe, DatabaseError>;

    async fn delete(&self, id: i64) -> Result<(), DatabaseError>;

    async fn count(&self) -> Result<i64, DatabaseError>;

    /// Cheap connectivity probe used by the health endpoint
    async fn ping(&self) -> Result<(), DatabaseError>;
}

pub(crate) fn recipe_not_found(id: i64) -> DatabaseError {
    DatabaseError::NotFound(format!("Recipe {} not found", id))
}
