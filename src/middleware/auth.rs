use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::auth::{parse_token_header, AuthError, IdentityProvider};
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user context resolved from the request token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
        }
    }
}

/// Token authentication middleware.
///
/// Runs before any extractor of the protected handlers, so a request without
/// valid credentials never reaches the store.
pub async fn token_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| value.as_bytes());

    let key = parse_token_header(header).map_err(|e| {
        tracing::debug!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
        ApiError::from(e)
    })?;

    let user = authenticate(state.identity.as_ref(), &key).await.map_err(|e| {
        if !matches!(e, AuthError::Store(_)) {
            tracing::warn!("Token authentication failed: {}", e);
        }
        ApiError::from(e)
    })?;

    tracing::debug!("Authenticated user {} ({})", user.username, user.user_id);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Resolve a token key to an active user
pub async fn authenticate(identity: &dyn IdentityProvider, key: &str) -> Result<AuthUser, AuthError> {
    let user = identity
        .user_for_token(key)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    if !user.is_active {
        return Err(AuthError::InactiveUser);
    }

    Ok(user.into())
}
