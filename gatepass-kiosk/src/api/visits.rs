//! Staff console visit listing

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use gatepass_common::db::VisitRecord;
use gatepass_common::status::{canonicalize_str, BadgeVariant};
use gatepass_common::CanonicalStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::types::{DateRange, ObjectStorage, VisitFilter, MAX_VISIT_LIMIT};
use crate::AppState;

/// GET /api/admin/visits query
#[derive(Debug, Default, Deserialize)]
pub struct VisitListQuery {
    pub q: Option<String>,
    pub purpose: Option<String>,
    pub range: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u32>,
}

impl VisitListQuery {
    pub fn into_filter(self) -> ApiResult<VisitFilter> {
        let range = match self.range.as_deref().map(str::trim) {
            None | Some("") | Some("all") => DateRange::All,
            Some("7d") => DateRange::LastWeek,
            Some("30d") => DateRange::LastMonth,
            Some(other) => {
                return Err(ApiError::BadRequest(format!("Unknown range: {}", other)));
            }
        };
        let status = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
            .map(canonicalize_str);

        Ok(VisitFilter {
            query: non_empty(self.q),
            purpose: non_empty(self.purpose),
            range,
            status,
            limit: self.limit.unwrap_or(MAX_VISIT_LIMIT),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub full_name: String,
    pub mobile: String,
    pub visitor_email: String,
    pub company: Option<String>,
    pub visit_type: String,
    pub host_name: String,
    pub purpose: String,
    pub entry_lane: String,
    pub priority: i64,
    pub escort_required: bool,
    pub status: CanonicalStatus,
    pub badge: BadgeVariant,
    pub health_alert: bool,
    pub selfie_url: Option<String>,
    pub visit_date: DateTime<Utc>,
}

impl VisitRow {
    fn from_record(record: VisitRecord, storage: &dyn ObjectStorage) -> Self {
        let selfie_url = record
            .selfie_url
            .as_deref()
            .and_then(|reference| storage.resolve_url(reference));
        Self {
            health_alert: record.health_alert(),
            badge: record.status.badge_variant(),
            id: record.id,
            created_at: record.created_at,
            full_name: record.full_name,
            mobile: record.mobile,
            visitor_email: record.visitor_email,
            company: record.company,
            visit_type: record.visit_type,
            host_name: record.host_name,
            purpose: record.purpose,
            entry_lane: record.entry_lane,
            priority: record.priority,
            escort_required: record.escort_required,
            status: record.status,
            selfie_url,
            visit_date: record.visit_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VisitListResponse {
    pub visits: Vec<VisitRow>,
    pub count: usize,
}

/// GET /api/admin/visits
pub async fn list_visits(
    State(state): State<AppState>,
    Query(query): Query<VisitListQuery>,
) -> ApiResult<Json<VisitListResponse>> {
    let filter = query.into_filter()?;
    let records = state.store.select(&filter).await?;

    let visits: Vec<VisitRow> = records
        .into_iter()
        .map(|record| VisitRow::from_record(record, state.storage.as_ref()))
        .collect();
    Ok(Json(VisitListResponse {
        count: visits.len(),
        visits,
    }))
}

pub fn visit_routes() -> Router<AppState> {
    Router::new().route("/api/admin/visits", get(list_visits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_lists_everything() {
        let filter = VisitListQuery::default().into_filter().unwrap();
        assert_eq!(filter, VisitFilter::default());
    }

    #[test]
    fn test_status_aliases_canonicalized() {
        let query = VisitListQuery {
            status: Some(" Arrived ".to_string()),
            range: Some("7d".to_string()),
            q: Some("  ".to_string()),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.status, Some(CanonicalStatus::CheckedIn));
        assert_eq!(filter.range, DateRange::LastWeek);
        assert_eq!(filter.query, None);

        let all = VisitListQuery {
            status: Some("ALL".to_string()),
            ..Default::default()
        };
        assert_eq!(all.into_filter().unwrap().status, None);
    }

    #[test]
    fn test_unknown_range_rejected() {
        let query = VisitListQuery {
            range: Some("90d".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.into_filter(), Err(ApiError::BadRequest(_))));
    }
}
