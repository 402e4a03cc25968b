use axum::{
    http::{header, HeaderMap},
    response::Json,
};
use serde_json::{json, Value};

use crate::handlers::protected::recipes::COLLECTION_PATH;

/// GET / - browsable API root listing the registered collections
pub async fn root(headers: HeaderMap) -> Json<Value> {
    let base = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|host| format!("http://{}", host))
        .unwrap_or_default();

    Json(json!({
        "recipes-list": format!("{}{}", base, COLLECTION_PATH),
    }))
}
