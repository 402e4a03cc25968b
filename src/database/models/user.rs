use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::manager::DatabaseError;

/// Column bound of `users.username`
pub const USERNAME_MAX_LENGTH: usize = 150;

/// Account owned by the identity provider; recipes reference it as their author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.username)
    }
}

/// Check a username against the `users` column constraints
pub fn validate_username(username: &str) -> Result<(), DatabaseError> {
    if username.trim().is_empty() {
        return Err(DatabaseError::InvalidValue("username may not be blank".to_string()));
    }
    if username.chars().count() > USERNAME_MAX_LENGTH {
        return Err(DatabaseError::InvalidValue(format!(
            "username may not be longer than {} characters",
            USERNAME_MAX_LENGTH
        )));
    }
    Ok(())
}
