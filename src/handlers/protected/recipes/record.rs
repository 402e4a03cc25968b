use axum::{
    body::Bytes,
    extract::{Extension, Path, State},
};

use crate::api::recipe::{self, RecipeOut};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

use super::{parse_body, parse_id};

/// GET /recipes-list/:id/ - Get a single recipe by ID
pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<RecipeOut> {
    let id = parse_id(&id)?;
    let found = state.recipes.get(id).await?;
    Ok(ApiResponse::success(recipe::encode(&found)))
}

/// PUT /recipes-list/:id/ - Replace every writable field of a recipe
pub async fn update(
    state: State<AppState>,
    auth_user: Extension<AuthUser>,
    id: Path<String>,
    body: Bytes,
) -> ApiResult<RecipeOut> {
    apply_update(state, auth_user, id, body, false).await
}

/// PATCH /recipes-list/:id/ - Update only the supplied fields
pub async fn partial_update(
    state: State<AppState>,
    auth_user: Extension<AuthUser>,
    id: Path<String>,
    body: Bytes,
) -> ApiResult<RecipeOut> {
    apply_update(state, auth_user, id, body, true).await
}

/// DELETE /recipes-list/:id/ - Delete a recipe
pub async fn destroy(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id)?;
    state.recipes.delete(id).await?;
    tracing::info!("Recipe {} deleted by {}", id, auth_user.username);
    Ok(ApiResponse::no_content())
}

async fn apply_update(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Bytes,
    partial: bool,
) -> ApiResult<RecipeOut> {
    let id = parse_id(&id)?;

    // Unknown ids answer 404 before the payload is looked at
    state.recipes.get(id).await?;

    let payload = parse_body(&body)?;
    let changes = recipe::decode_changes(&payload, partial, state.identity.as_ref()).await?;

    let updated = state.recipes.update(id, changes).await?;
    tracing::info!("Recipe {} updated by {}", updated.id, auth_user.username);

    Ok(ApiResponse::success(recipe::encode(&updated)))
}
