//! Confirmation view data
//!
//! The thank-you page may be a fresh load carrying only the visit id, so
//! everything here comes from re-fetching the stored record.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use gatepass_common::ids::parse_visit_id;
use gatepass_common::status::BadgeVariant;
use gatepass_common::CanonicalStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::types::ObjectStorage;
use crate::AppState;

/// Query flag value set when the feedback request soft-failed
pub const NOTIFICATION_FAILED_FLAG: &str = "failed";

#[derive(Debug, Deserialize)]
pub struct ConfirmationQuery {
    #[serde(rename = "visitId")]
    pub visit_id: Option<String>,
    pub id: Option<String>,
    pub email: Option<String>,
}

impl ConfirmationQuery {
    /// `visitId` wins over the legacy `id` parameter
    fn raw_id(&self) -> Option<&str> {
        [self.visit_id.as_deref(), self.id.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|candidate| !candidate.is_empty())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationResponse {
    pub visit_id: Uuid,
    pub full_name: String,
    pub purpose: String,
    pub entry_lane: String,
    pub host_name: String,
    pub visit_date: DateTime<Utc>,
    pub status: CanonicalStatus,
    pub badge: BadgeVariant,
    pub selfie_url: Option<String>,
    pub health_alert: bool,
    pub notification_failed: bool,
    pub feedback_link: String,
}

/// GET /api/confirmation?visitId=…&email=failed
pub async fn get_confirmation(
    State(state): State<AppState>,
    Query(query): Query<ConfirmationQuery>,
) -> ApiResult<Json<ConfirmationResponse>> {
    let visit_id =
        parse_visit_id(query.raw_id()).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let record = state
        .store
        .fetch(visit_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Visit not found: {}", visit_id)))?;

    let selfie_url = record
        .selfie_url
        .as_deref()
        .and_then(|reference| state.storage.resolve_url(reference));

    Ok(Json(ConfirmationResponse {
        visit_id: record.id,
        health_alert: record.health_alert(),
        full_name: record.full_name,
        purpose: record.purpose,
        entry_lane: record.entry_lane,
        host_name: record.host_name,
        visit_date: record.visit_date,
        status: record.status,
        badge: record.status.badge_variant(),
        selfie_url,
        notification_failed: query.email.as_deref() == Some(NOTIFICATION_FAILED_FLAG),
        feedback_link: state.pipeline.feedback_link(record.id),
    }))
}

pub fn confirmation_routes() -> Router<AppState> {
    Router::new().route("/api/confirmation", get(get_confirmation))
}
