//! Wizard session handlers
//!
//! POST /api/sessions opens a session; every edit returns the updated
//! [`SessionView`] so the kiosk re-renders from one payload.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::Utc;
use gatepass_common::events::GateEvent;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{IdentityPatch, VisitDetailsPatch};
use crate::wizard::{advance_session, SessionView, SharedSession, StepResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HealthAnswerRequest {
    pub answer: bool,
}

#[derive(Debug, Deserialize)]
pub struct SiteNormRequest {
    pub checked: bool,
}

#[derive(Debug, Deserialize)]
pub struct ConsentRequest {
    pub consent: bool,
}

/// Look up a live session or 404
pub(crate) async fn find_session(state: &AppState, id: Uuid) -> ApiResult<SharedSession> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", id)))
}

/// POST /api/sessions
pub async fn open_session(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<SessionView>)> {
    let (session_id, session) = state.sessions.open(state.camera.clone()).await;
    state.event_bus.emit_lossy(GateEvent::SessionOpened {
        session_id,
        timestamp: Utc::now(),
    });
    let view = session.lock().await.view();
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let session = find_session(&state, id).await?;
    let view = session.lock().await.view();
    Ok(Json(view))
}

/// DELETE /api/sessions/:id
///
/// Abandon the session and release the camera.
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .sessions
        .close(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", id)))?;
    state.event_bus.emit_lossy(GateEvent::SessionClosed {
        session_id: id,
        submitted: false,
        timestamp: Utc::now(),
    });
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/sessions/:id/identity
pub async fn update_identity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<IdentityPatch>,
) -> ApiResult<Json<SessionView>> {
    let session = find_session(&state, id).await?;
    let mut guard = session.lock().await;
    guard.update_identity(patch)?;
    Ok(Json(guard.view()))
}

/// PATCH /api/sessions/:id/visit
pub async fn update_visit_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<VisitDetailsPatch>,
) -> ApiResult<Json<SessionView>> {
    let session = find_session(&state, id).await?;
    let mut guard = session.lock().await;
    guard.update_visit_details(patch)?;
    Ok(Json(guard.view()))
}

/// PUT /api/sessions/:id/health/:question
pub async fn set_health_answer(
    State(state): State<AppState>,
    Path((id, question)): Path<(Uuid, String)>,
    Json(request): Json<HealthAnswerRequest>,
) -> ApiResult<Json<SessionView>> {
    let session = find_session(&state, id).await?;
    let mut guard = session.lock().await;
    guard.set_health_answer(&question, request.answer)?;
    Ok(Json(guard.view()))
}

/// PUT /api/sessions/:id/site-norms/:item
pub async fn set_site_norm(
    State(state): State<AppState>,
    Path((id, item)): Path<(Uuid, String)>,
    Json(request): Json<SiteNormRequest>,
) -> ApiResult<Json<SessionView>> {
    let session = find_session(&state, id).await?;
    let mut guard = session.lock().await;
    guard.set_site_norm(&item, request.checked)?;
    Ok(Json(guard.view()))
}

/// PUT /api/sessions/:id/consent
pub async fn set_consent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ConsentRequest>,
) -> ApiResult<Json<SessionView>> {
    let session = find_session(&state, id).await?;
    let mut guard = session.lock().await;
    guard.set_consent(request.consent)?;
    Ok(Json(guard.view()))
}

/// POST /api/sessions/:id/next
///
/// Runs in its own task: a client that disconnects mid-submission must not
/// cancel the upload or the insert.
pub async fn next_section(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StepResult>> {
    let session = find_session(&state, id).await?;
    let task_state = state.clone();

    let handle = tokio::spawn(async move {
        let result = advance_session(&session, &task_state.pipeline).await;
        match &result {
            Ok(StepResult::Submitted { .. }) => {
                task_state.sessions.close(id).await;
                task_state.event_bus.emit_lossy(GateEvent::SessionClosed {
                    session_id: id,
                    submitted: true,
                    timestamp: Utc::now(),
                });
            }
            Ok(StepResult::Failed { message }) => {
                task_state.record_error(message.clone()).await;
            }
            _ => {}
        }
        result
    });

    let result = handle.await.map_err(|e| {
        tracing::error!(session_id = %id, error = %e, "Advance task failed");
        ApiError::Internal(format!("Advance task failed: {}", e))
    })??;
    Ok(Json(result))
}

/// POST /api/sessions/:id/back
pub async fn previous_section(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let session = find_session(&state, id).await?;
    let mut guard = session.lock().await;
    guard.go_back()?;
    Ok(Json(guard.view()))
}

/// POST /api/sessions/:id/goto/:index
pub async fn go_to_section(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> ApiResult<Json<SessionView>> {
    let session = find_session(&state, id).await?;
    let mut guard = session.lock().await;
    guard.go_to(index)?;
    Ok(Json(guard.view()))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(open_session))
        .route("/api/sessions/:id", get(get_session).delete(close_session))
        .route("/api/sessions/:id/identity", patch(update_identity))
        .route("/api/sessions/:id/visit", patch(update_visit_details))
        .route("/api/sessions/:id/health/:question", put(set_health_answer))
        .route("/api/sessions/:id/site-norms/:item", put(set_site_norm))
        .route("/api/sessions/:id/consent", put(set_consent))
        .route("/api/sessions/:id/next", post(next_section))
        .route("/api/sessions/:id/back", post(previous_section))
        .route("/api/sessions/:id/goto/:index", post(go_to_section))
}
