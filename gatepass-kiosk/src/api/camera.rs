//! Camera handlers
//!
//! Session-scoped controls drive the capture controller. The relay
//! endpoints are how the kiosk front-end feeds the webcam preview in.

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use uuid::Uuid;

use super::sessions::find_session;
use crate::capture::{CameraBackend, RawFrame};
use crate::error::{ApiError, ApiResult};
use crate::submission::SelfieAsset;
use crate::wizard::SessionView;
use crate::AppState;

/// Relayed frames are raw RGB; a 1080p frame is ~8 MiB once base64 encoded
const MAX_FRAME_BODY_BYTES: usize = 16 * 1024 * 1024;

/// PUT /api/camera/frame request
#[derive(Debug, Deserialize)]
pub struct FrameRequest {
    pub width: u32,
    pub height: u32,
    /// Base64 of `width * height * 3` RGB bytes, row-major
    pub rgb: String,
}

/// POST /api/sessions/:id/camera/start
pub async fn start_camera(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let session = find_session(&state, id).await?;
    let mut guard = session.lock().await;
    guard.start_camera().await?;
    Ok(Json(guard.view()))
}

/// POST /api/sessions/:id/camera/capture
pub async fn capture_selfie(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let session = find_session(&state, id).await?;
    let mut guard = session.lock().await;
    guard.capture_selfie()?;
    Ok(Json(guard.view()))
}

/// GET /api/sessions/:id/selfie
///
/// The captured still as an image, so session views stay small.
pub async fn get_selfie(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let session = find_session(&state, id).await?;
    let guard = session.lock().await;
    let snapshot = guard
        .intake()
        .selfie
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("No selfie captured".to_string()))?;
    let asset = SelfieAsset::from_data_url(&snapshot.data_url)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, asset.content_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        asset.bytes,
    ))
}

/// POST /api/sessions/:id/camera/retake
pub async fn retake_selfie(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let session = find_session(&state, id).await?;
    let mut guard = session.lock().await;
    guard.retake_selfie().await?;
    Ok(Json(guard.view()))
}

/// POST /api/sessions/:id/camera/stop
pub async fn stop_camera(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let session = find_session(&state, id).await?;
    let mut guard = session.lock().await;
    guard.stop_camera();
    Ok(Json(guard.view()))
}

/// PUT /api/camera/frame
pub async fn publish_frame(
    State(state): State<AppState>,
    Json(request): Json<FrameRequest>,
) -> ApiResult<StatusCode> {
    if !state.camera.environment().api_available {
        return Err(ApiError::Conflict("Camera relay is disabled".to_string()));
    }
    let rgb = STANDARD
        .decode(request.rgb.trim())
        .map_err(|e| ApiError::BadRequest(format!("Frame is not valid base64: {}", e)))?;
    let frame = RawFrame::new(request.width, request.height, rgb)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    state.camera.publish(frame);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/camera/denied
pub async fn report_denied(State(state): State<AppState>) -> StatusCode {
    state.camera.report_denied();
    StatusCode::NO_CONTENT
}

pub fn camera_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions/:id/camera/start", post(start_camera))
        .route("/api/sessions/:id/camera/capture", post(capture_selfie))
        .route("/api/sessions/:id/camera/retake", post(retake_selfie))
        .route("/api/sessions/:id/camera/stop", post(stop_camera))
        .route("/api/sessions/:id/selfie", get(get_selfie))
        .route(
            "/api/camera/frame",
            put(publish_frame).layer(DefaultBodyLimit::max(MAX_FRAME_BODY_BYTES)),
        )
        .route("/api/camera/denied", post(report_denied))
}
