//! Live feed handlers for the staff console

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use gatepass_common::status::canonicalize_str;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::sync::FeedView;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ScrollRequest {
    pub offset: usize,
}

/// Raw status; any alias is accepted
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// GET /api/feed
pub async fn get_feed(State(state): State<AppState>) -> Json<FeedView> {
    Json(state.feed.view().await)
}

/// POST /api/feed/refresh
pub async fn refresh_feed(State(state): State<AppState>) -> ApiResult<Json<FeedView>> {
    state.feed.refresh().await?;
    Ok(Json(state.feed.view().await))
}

/// PUT /api/feed/scroll
pub async fn set_scroll(
    State(state): State<AppState>,
    Json(request): Json<ScrollRequest>,
) -> Json<FeedView> {
    state.feed.set_scroll_offset(request.offset).await;
    Json(state.feed.view().await)
}

/// POST /api/feed/:id/status
///
/// On a store failure the entry is already rolled back when the error
/// response goes out.
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<FeedView>> {
    let next = canonicalize_str(&request.status);
    if let Err(e) = state.feed.set_status(id, next).await {
        state
            .record_error(format!("Status change for {} failed: {}", id, e))
            .await;
        return Err(e.into());
    }
    Ok(Json(state.feed.view().await))
}

pub fn feed_routes() -> Router<AppState> {
    Router::new()
        .route("/api/feed", get(get_feed))
        .route("/api/feed/refresh", post(refresh_feed))
        .route("/api/feed/scroll", put(set_scroll))
        .route("/api/feed/:id/status", post(set_status))
}
