//! Bucket object serving
//!
//! Private buckets only answer requests carrying a valid signed-URL token.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::types::ObjectStorage;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: Option<i64>,
    pub token: Option<String>,
}

/// GET /storage/:bucket/*path
pub async fn get_object(
    State(state): State<AppState>,
    Path((bucket, path)): Path<(String, String)>,
    Query(query): Query<SignedQuery>,
) -> ApiResult<impl IntoResponse> {
    if bucket != state.storage.bucket() {
        return Err(ApiError::NotFound(format!("Unknown bucket: {}", bucket)));
    }
    let now = Utc::now().timestamp();
    if !state
        .storage
        .verify(&path, query.expires, query.token.as_deref(), now)
    {
        return Err(ApiError::Forbidden(
            "Missing, invalid or expired token".to_string(),
        ));
    }

    let (bytes, content_type) = state.storage.read(&path).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

pub fn storage_routes() -> Router<AppState> {
    Router::new().route("/storage/:bucket/*path", get(get_object))
}
