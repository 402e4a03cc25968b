use axum::{
    body::Bytes,
    extract::{Extension, State},
};

use crate::api::recipe::{self, RecipeOut};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

use super::parse_body;

/// GET /recipes-list/ - List all recipes
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<RecipeOut>> {
    let recipes = state.recipes.list().await?;
    Ok(ApiResponse::success(recipe::encode_all(&recipes)))
}

/// POST /recipes-list/ - Create a recipe
pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    body: Bytes,
) -> ApiResult<RecipeOut> {
    let payload = parse_body(&body)?;
    let new_recipe = recipe::decode(&payload, state.identity.as_ref()).await?;

    let created = state.recipes.create(new_recipe).await?;
    tracing::info!(
        "Recipe {} created by {} (author {})",
        created.id,
        auth_user.username,
        created.author_id
    );

    Ok(ApiResponse::created(recipe::encode(&created)))
}
