use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maximum length of a recipe title, in characters
pub const TITLE_MAX_LENGTH: usize = 100;

/// A stored recipe.
///
/// `id` and `created_at` are assigned by the store on insert and never change
/// afterwards. `author_id` always references an existing user; deleting that
/// user deletes the recipe with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub author_id: i64,
}

impl std::fmt::Display for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Validated input for inserting a recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub title: String,
    pub description: String,
    pub author_id: i64,
}

impl NewRecipe {
    pub fn new(title: impl Into<String>, description: impl Into<String>, author_id: i64) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            author_id,
        }
    }
}

/// Validated field changes for an update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author_id: Option<i64>,
}

impl RecipeChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.author_id.is_none()
    }

    /// Apply the changes to an in-memory copy of a recipe
    pub fn apply_to(self, recipe: &mut Recipe) {
        if let Some(title) = self.title {
            recipe.title = title;
        }
        if let Some(description) = self.description {
            recipe.description = description;
        }
        if let Some(author_id) = self.author_id {
            recipe.author_id = author_id;
        }
    }
}
