//! Wire representation of recipes.
//!
//! `encode` renders a stored recipe as the public JSON object
//! `{ id, title, description, created_at, author }`. `decode` and
//! `decode_changes` validate an inbound payload field by field and report
//! every offending field at once. `id` and `created_at` are read-only and
//! silently ignored on input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::auth::IdentityProvider;
use crate::database::manager::DatabaseError;
use crate::database::models::recipe::TITLE_MAX_LENGTH;
use crate::database::models::{NewRecipe, Recipe, RecipeChanges};

pub const FIELD_REQUIRED: &str = "This field is required.";
pub const FIELD_NULL: &str = "This field may not be null.";
pub const FIELD_BLANK: &str = "This field may not be blank.";
pub const FIELD_NOT_STRING: &str = "Not a valid string.";
pub const FIELD_NULL_CHARACTER: &str = "Null characters are not allowed.";

/// Key used for errors that concern the payload as a whole
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field name -> message for every field that failed validation
pub type FieldErrors = HashMap<String, String>;

/// Public JSON shape of a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeOut {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// Author's user id
    pub author: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SerializerError {
    #[error("Invalid input")]
    Invalid(FieldErrors),
    #[error(transparent)]
    Store(#[from] DatabaseError),
}

pub fn encode(recipe: &Recipe) -> RecipeOut {
    RecipeOut {
        id: recipe.id,
        title: recipe.title.clone(),
        description: recipe.description.clone(),
        created_at: recipe.created_at,
        author: recipe.author_id,
    }
}

pub fn encode_all(recipes: &[Recipe]) -> Vec<RecipeOut> {
    recipes.iter().map(encode).collect()
}

/// Validate a create payload. `title`, `description` and `author` are all
/// required and `author` must name an existing user.
pub async fn decode(
    payload: &Value,
    identity: &dyn IdentityProvider,
) -> Result<NewRecipe, SerializerError> {
    let changes = decode_changes(payload, false, identity).await?;
    match changes {
        RecipeChanges {
            title: Some(title),
            description: Some(description),
            author_id: Some(author_id),
        } => Ok(NewRecipe {
            title,
            description,
            author_id,
        }),
        // unreachable in practice: a full decode reports missing fields above
        _ => Err(SerializerError::Invalid(missing_fields(&changes))),
    }
}

/// Validate an update payload. With `partial` unset every writable field is
/// required (PUT); with it set only the supplied fields are checked (PATCH).
pub async fn decode_changes(
    payload: &Value,
    partial: bool,
    identity: &dyn IdentityProvider,
) -> Result<RecipeChanges, SerializerError> {
    let object = payload.as_object().ok_or_else(|| {
        let mut errors = FieldErrors::new();
        errors.insert(
            NON_FIELD_ERRORS.to_string(),
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                wire_type_name(payload)
            ),
        );
        SerializerError::Invalid(errors)
    })?;

    let mut errors = FieldErrors::new();
    let mut changes = RecipeChanges::default();

    match read_text(object, "title", partial) {
        Ok(Some(title)) if title.chars().count() > TITLE_MAX_LENGTH => {
            errors.insert(
                "title".to_string(),
                format!(
                    "Ensure this field has no more than {} characters.",
                    TITLE_MAX_LENGTH
                ),
            );
        }
        Ok(title) => changes.title = title,
        Err(msg) => {
            errors.insert("title".to_string(), msg);
        }
    }

    match read_text(object, "description", partial) {
        Ok(description) => changes.description = description,
        Err(msg) => {
            errors.insert("description".to_string(), msg);
        }
    }

    match read_author(object, partial) {
        Ok(Some(author_id)) => {
            if identity.user_exists(author_id).await? {
                changes.author_id = Some(author_id);
            } else {
                errors.insert("author".to_string(), unknown_author(author_id));
            }
        }
        Ok(None) => {}
        Err(msg) => {
            errors.insert("author".to_string(), msg);
        }
    }

    if errors.is_empty() {
        Ok(changes)
    } else {
        Err(SerializerError::Invalid(errors))
    }
}

/// Message reported when `author` names no existing user
pub fn unknown_author(author_id: impl std::fmt::Display) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", author_id)
}

/// Read a required, non-blank text field. Numbers are accepted and rendered
/// as text; surrounding whitespace is trimmed. NUL characters cannot be
/// stored in a PostgreSQL text column and are rejected.
fn read_text(
    object: &Map<String, Value>,
    field: &str,
    partial: bool,
) -> Result<Option<String>, String> {
    let text = match object.get(field) {
        None if partial => return Ok(None),
        None => return Err(FIELD_REQUIRED.to_string()),
        Some(Value::Null) => return Err(FIELD_NULL.to_string()),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err(FIELD_NOT_STRING.to_string()),
    };

    if text.contains('\0') {
        return Err(FIELD_NULL_CHARACTER.to_string());
    }
    if text.is_empty() {
        return Err(FIELD_BLANK.to_string());
    }
    Ok(Some(text))
}

/// Read the author's primary key; integer strings are accepted
fn read_author(object: &Map<String, Value>, partial: bool) -> Result<Option<i64>, String> {
    let value = match object.get("author") {
        None if partial => return Ok(None),
        None => return Err(FIELD_REQUIRED.to_string()),
        Some(Value::Null) => return Err(FIELD_NULL.to_string()),
        Some(value) => value,
    };

    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match parsed {
        Some(id) => Ok(Some(id)),
        // integral but out of range can never match a row
        None if value.is_u64() => Err(unknown_author(value)),
        None => Err(format!(
            "Incorrect type. Expected pk value, received {}.",
            wire_type_name(value)
        )),
    }
}

fn missing_fields(changes: &RecipeChanges) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if changes.title.is_none() {
        errors.insert("title".to_string(), FIELD_REQUIRED.to_string());
    }
    if changes.description.is_none() {
        errors.insert("description".to_string(), FIELD_REQUIRED.to_string());
    }
    if changes.author_id.is_none() {
        errors.insert("author".to_string(), FIELD_REQUIRED.to_string());
    }
    errors
}

/// JSON value kinds named the way existing API clients expect in error messages
fn wire_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
