//! Database row models
//!
//! `visits` rows are the server-owned projection of a completed intake.
//! Timestamps are stored as RFC 3339 text; health answers as a JSON object.

use crate::catalog::HEALTH_QUESTIONS;
use crate::status::{canonicalize, CanonicalStatus};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Health answers keyed by question key
pub type HealthAnswers = BTreeMap<String, bool>;

/// Column list shared by every `SELECT` on `visits`
pub const VISIT_COLUMNS: &str = "id, created_at, full_name, mobile, visitor_email, company, \
     visit_type, host_name, purpose, purpose_notes, entry_lane, priority, escort_required, \
     sms_updates, health_answers, site_norms_accepted, selfie_url, consent_given, status, visit_date";

/// Insert payload for a new visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVisit {
    pub full_name: String,
    pub mobile: String,
    pub visitor_email: String,
    pub company: Option<String>,
    pub visit_type: String,
    pub host_name: String,
    pub purpose: String,
    pub purpose_notes: Option<String>,
    pub entry_lane: String,
    pub priority: i64,
    pub escort_required: bool,
    pub sms_updates: bool,
    pub health_answers: HealthAnswers,
    pub site_norms_accepted: bool,
    /// Storage path inside the selfie bucket, never a resolved URL
    pub selfie_url: Option<String>,
    pub consent_given: bool,
    pub status: CanonicalStatus,
    pub visit_date: DateTime<Utc>,
}

/// Persisted visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub full_name: String,
    pub mobile: String,
    pub visitor_email: String,
    pub company: Option<String>,
    pub visit_type: String,
    pub host_name: String,
    pub purpose: String,
    pub purpose_notes: Option<String>,
    pub entry_lane: String,
    pub priority: i64,
    pub escort_required: bool,
    pub sms_updates: bool,
    pub health_answers: HealthAnswers,
    pub site_norms_accepted: bool,
    pub selfie_url: Option<String>,
    pub consent_given: bool,
    pub status: CanonicalStatus,
    pub visit_date: DateTime<Utc>,
}

/// Insert payload for visitor feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTestimonial {
    pub visit_id: Uuid,
    pub email: String,
    pub rating: Option<u8>,
    pub comment: String,
}

impl VisitRecord {
    /// Decode a `visits` row selected with [`VISIT_COLUMNS`]
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let id: String = row.try_get("id")?;
        let id = Uuid::parse_str(&id)
            .map_err(|e| Error::CorruptRow {
                column: "id",
                detail: format!("{}: {}", id, e),
            })?;

        let health_json: String = row.try_get("health_answers")?;
        let stored: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&health_json).unwrap_or_default();

        let status: Option<String> = row.try_get("status")?;

        Ok(Self {
            id,
            created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
            full_name: row.try_get("full_name")?,
            mobile: row.try_get("mobile")?,
            visitor_email: row.try_get("visitor_email")?,
            company: row.try_get("company")?,
            visit_type: row.try_get("visit_type")?,
            host_name: row.try_get("host_name")?,
            purpose: row.try_get("purpose")?,
            purpose_notes: row.try_get("purpose_notes")?,
            entry_lane: row.try_get("entry_lane")?,
            priority: row.try_get("priority")?,
            escort_required: row.try_get("escort_required")?,
            sms_updates: row.try_get("sms_updates")?,
            health_answers: normalize_health_answers(&stored),
            site_norms_accepted: row.try_get("site_norms_accepted")?,
            selfie_url: row.try_get("selfie_url")?,
            consent_given: row.try_get("consent_given")?,
            status: canonicalize(status.as_deref()),
            visit_date: parse_timestamp(&row.try_get::<String, _>("visit_date")?)?,
        })
    }

    /// True when any health question was answered "yes"
    pub fn health_alert(&self) -> bool {
        self.health_answers.values().any(|answer| *answer)
    }
}

/// Project stored answers onto the fixed question set
///
/// Unknown keys are dropped; missing questions default to `false`. Truthy
/// JSON values (true, non-zero numbers, non-empty strings) count as yes.
pub fn normalize_health_answers(stored: &BTreeMap<String, serde_json::Value>) -> HealthAnswers {
    HEALTH_QUESTIONS
        .iter()
        .map(|question| {
            let answer = stored.get(question.key).map(is_truthy).unwrap_or(false);
            (question.key.to_string(), answer)
        })
        .collect()
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Null => false,
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::CorruptRow {
            column: "timestamp",
            detail: format!("{}: {}", value, e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_health_answers_normalization() {
        let stored: BTreeMap<String, serde_json::Value> = serde_json::from_value(json!({
            "Influenza": true,
            "Vomiting": 0,
            "Unknown question": true
        }))
        .unwrap();

        let answers = normalize_health_answers(&stored);

        assert_eq!(answers.len(), HEALTH_QUESTIONS.len());
        assert_eq!(answers.get("Influenza"), Some(&true));
        assert_eq!(answers.get("Vomiting"), Some(&false));
        assert_eq!(answers.get("Diarrhea"), Some(&false));
        assert!(!answers.contains_key("Unknown question"));
    }

    #[test]
    fn test_bad_timestamp_is_a_corrupt_row() {
        let err = parse_timestamp("yesterday").unwrap_err();
        assert!(matches!(err, Error::CorruptRow { column: "timestamp", .. }));
        assert!(err.to_string().starts_with("Corrupt timestamp in visit row: yesterday"));

        let parsed = parse_timestamp("2026-03-01T06:30:00.000000Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T06:30:00+00:00");
    }
}
