use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::database::repository::RecipeRepository;

/// Shared handler state: the recipe store and the identity collaborator
#[derive(Clone)]
pub struct AppState {
    pub recipes: Arc<dyn RecipeRepository>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(recipes: Arc<dyn RecipeRepository>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { recipes, identity }
    }

    /// State backed by a single store serving both roles
    pub fn from_store<S>(store: S) -> Self
    where
        S: RecipeRepository + IdentityProvider + 'static,
    {
        let store = Arc::new(store);
        Self {
            recipes: store.clone(),
            identity: store,
        }
    }
}
