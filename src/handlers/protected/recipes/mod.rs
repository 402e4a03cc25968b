use axum::body::Bytes;
use serde_json::{Map, Value};

use crate::error::ApiError;

pub mod collection;
pub mod record;

// Re-export handler functions for use in routing
pub use collection::create;
pub use collection::list;
pub use record::destroy;
pub use record::partial_update;
pub use record::retrieve;
pub use record::update;

/// Collection route as published by the API root
pub const COLLECTION_PATH: &str = "/recipes-list/";

/// Parse a request body as JSON. An empty body is an empty object so that
/// missing fields surface as validation errors rather than a parse error.
pub(crate) fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::invalid_json(format!("JSON parse error - {}", e)))
}

/// Path ids that are not integers cannot match any recipe
pub(crate) fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| ApiError::not_found("Not found."))
}
