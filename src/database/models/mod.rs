pub mod recipe;
pub mod user;

pub use recipe::{NewRecipe, Recipe, RecipeChanges};
pub use user::{validate_username, User, USERNAME_MAX_LENGTH};
