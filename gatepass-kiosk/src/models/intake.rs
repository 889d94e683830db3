//! Visit intake (the form state owned by one wizard session)
//!
//! A `VisitIntake` lives for exactly one check-in. Every field may be edited
//! freely until `submitted` flips to true; after that the intake is terminal
//! and a new session must be opened for the next visitor.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use gatepass_common::catalog::{self, HEALTH_QUESTIONS, SITE_NORMS};
use gatepass_common::db::HealthAnswers;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::capture::Snapshot;

/// Visitor identity and contact preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub full_name: String,
    pub mobile: String,
    pub email: String,
    pub company: String,
    pub escort_required: bool,
    pub alerts_opt_in: bool,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            mobile: String::new(),
            email: String::new(),
            company: String::new(),
            escort_required: false,
            alerts_opt_in: true,
        }
    }
}

/// Partial identity update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPatch {
    pub full_name: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub escort_required: Option<bool>,
    pub alerts_opt_in: Option<bool>,
}

impl Identity {
    pub fn apply(&mut self, patch: IdentityPatch) {
        if let Some(v) = patch.full_name {
            self.full_name = v;
        }
        if let Some(v) = patch.mobile {
            self.mobile = v;
        }
        if let Some(v) = patch.email {
            self.email = v;
        }
        if let Some(v) = patch.company {
            self.company = v;
        }
        if let Some(v) = patch.escort_required {
            self.escort_required = v;
        }
        if let Some(v) = patch.alerts_opt_in {
            self.alerts_opt_in = v;
        }
    }
}

/// Purpose of the visit; `Other` takes its text from `VisitDetails::other_purpose`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PurposeOption {
    #[default]
    Meeting,
    Delivery,
    Inspection,
    Interview,
    Contractor,
    Other,
}

impl PurposeOption {
    pub const ALL: [PurposeOption; 6] = [
        PurposeOption::Meeting,
        PurposeOption::Delivery,
        PurposeOption::Inspection,
        PurposeOption::Interview,
        PurposeOption::Contractor,
        PurposeOption::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PurposeOption::Meeting => "Meeting",
            PurposeOption::Delivery => "Delivery",
            PurposeOption::Inspection => "Inspection",
            PurposeOption::Interview => "Interview",
            PurposeOption::Contractor => "Contractor",
            PurposeOption::Other => "Other",
        }
    }
}

impl fmt::Display for PurposeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Visit priority, always within 1..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;
    pub const DEFAULT: u8 = 48;

    pub fn new(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl From<i64> for Priority {
    fn from(value: i64) -> Self {
        Priority::new(value)
    }
}

impl From<Priority> for i64 {
    fn from(value: Priority) -> Self {
        value.0 as i64
    }
}

/// Host, purpose and logistics of the visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitDetails {
    pub purpose: PurposeOption,
    pub other_purpose: String,
    pub meeting_with: String,
    pub entry_lane: String,
    pub priority: Priority,
    /// Visit date as entered (ISO 8601); resolved on submission
    pub date: String,
}

impl Default for VisitDetails {
    fn default() -> Self {
        Self {
            purpose: PurposeOption::default(),
            other_purpose: String::new(),
            meeting_with: String::new(),
            entry_lane: catalog::default_entry_lane().to_string(),
            priority: Priority::default(),
            date: Utc::now().to_rfc3339(),
        }
    }
}

/// Partial visit-details update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitDetailsPatch {
    pub purpose: Option<PurposeOption>,
    pub other_purpose: Option<String>,
    pub meeting_with: Option<String>,
    pub entry_lane: Option<String>,
    pub priority: Option<i64>,
    pub date: Option<String>,
}

impl VisitDetails {
    pub fn apply(&mut self, patch: VisitDetailsPatch) {
        if let Some(v) = patch.purpose {
            self.purpose = v;
        }
        if let Some(v) = patch.other_purpose {
            self.other_purpose = v;
        }
        if let Some(v) = patch.meeting_with {
            self.meeting_with = v;
        }
        if let Some(v) = patch.entry_lane {
            self.entry_lane = v;
        }
        if let Some(v) = patch.priority {
            self.priority = Priority::new(v);
        }
        if let Some(v) = patch.date {
            self.date = v;
        }
    }

    /// Lane to persist; an empty lane falls back to the first facility gate
    pub fn resolved_entry_lane(&self) -> String {
        let lane = self.entry_lane.trim();
        if lane.is_empty() {
            catalog::default_entry_lane().to_string()
        } else {
            lane.to_string()
        }
    }

    /// Free text for `Other`, the option label otherwise
    pub fn resolved_purpose(&self) -> String {
        let other = self.other_purpose.trim();
        if self.purpose == PurposeOption::Other && !other.is_empty() {
            other.to_string()
        } else {
            self.purpose.label().to_string()
        }
    }

    /// Visit date, or `now` when the entered value does not parse
    ///
    /// Accepts RFC 3339, a zone-less date-time (taken as UTC) and a bare
    /// `YYYY-MM-DD` (midnight UTC).
    pub fn resolved_date(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let raw = self.date.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return dt.with_timezone(&Utc);
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return naive.and_utc();
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .unwrap_or(now)
    }
}

/// Requested health question does not exist
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown health question: {0}")]
pub struct UnknownQuestion(pub String);

/// Requested site norm does not exist
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown site norm: {0}")]
pub struct UnknownNorm(pub String);

/// Answers for every health question (never a partial mapping)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HealthScreening {
    answers: [bool; HEALTH_QUESTIONS.len()],
}

impl HealthScreening {
    pub fn set(&mut self, key: &str, value: bool) -> Result<(), UnknownQuestion> {
        let index = HEALTH_QUESTIONS
            .iter()
            .position(|q| q.key == key)
            .ok_or_else(|| UnknownQuestion(key.to_string()))?;
        self.answers[index] = value;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<bool> {
        HEALTH_QUESTIONS
            .iter()
            .position(|q| q.key == key)
            .map(|index| self.answers[index])
    }

    /// True if any answer is "yes"
    pub fn alert(&self) -> bool {
        self.answers.iter().any(|answer| *answer)
    }

    pub fn to_answers(&self) -> HealthAnswers {
        HEALTH_QUESTIONS
            .iter()
            .zip(self.answers.iter())
            .map(|(q, answer)| (q.key.to_string(), *answer))
            .collect()
    }
}

impl Serialize for HealthScreening {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_answers().serialize(serializer)
    }
}

/// Site-safety checklist; each item is acknowledged individually
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SiteNormsChecklist {
    checked: [bool; SITE_NORMS.len()],
}

impl SiteNormsChecklist {
    pub fn set(&mut self, id: &str, value: bool) -> Result<(), UnknownNorm> {
        let index = catalog::site_norm_index(id).ok_or_else(|| UnknownNorm(id.to_string()))?;
        self.checked[index] = value;
        Ok(())
    }

    pub fn toggle(&mut self, id: &str) -> Result<bool, UnknownNorm> {
        let index = catalog::site_norm_index(id).ok_or_else(|| UnknownNorm(id.to_string()))?;
        self.checked[index] = !self.checked[index];
        Ok(self.checked[index])
    }

    pub fn is_checked(&self, id: &str) -> bool {
        catalog::site_norm_index(id)
            .map(|index| self.checked[index])
            .unwrap_or(false)
    }

    /// Derived `siteNormsAccepted`: every item checked
    pub fn all_accepted(&self) -> bool {
        self.checked.iter().all(|c| *c)
    }

    /// First item still unchecked, in checklist order
    pub fn first_unchecked(&self) -> Option<&'static str> {
        SITE_NORMS
            .iter()
            .zip(self.checked.iter())
            .find(|(_, checked)| !**checked)
            .map(|(norm, _)| norm.id)
    }
}

impl Serialize for SiteNormsChecklist {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(SITE_NORMS.len()))?;
        for (norm, checked) in SITE_NORMS.iter().zip(self.checked.iter()) {
            map.serialize_entry(norm.id, checked)?;
        }
        map.end()
    }
}

/// The in-progress check-in of one visitor
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitIntake {
    pub identity: Identity,
    pub visit_details: VisitDetails,
    pub health: HealthScreening,
    #[serde(skip)]
    pub selfie: Option<Snapshot>,
    pub site_norms: SiteNormsChecklist,
    pub consent: bool,
    submitted: bool,
}

impl VisitIntake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn site_norms_accepted(&self) -> bool {
        self.site_norms.all_accepted()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Set once after the visit record is durable; never reset
    pub(crate) fn mark_submitted(&mut self) {
        self.submitted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let intake = VisitIntake::new();
        assert!(intake.identity.alerts_opt_in);
        assert!(!intake.identity.escort_required);
        assert_eq!(intake.visit_details.priority.get(), 48);
        assert_eq!(intake.visit_details.entry_lane, catalog::default_entry_lane());
        assert!(!intake.health.alert());
        assert!(!intake.site_norms_accepted());
        assert!(!intake.is_submitted());
    }

    #[test]
    fn test_priority_is_clamped() {
        assert_eq!(Priority::new(0).get(), 1);
        assert_eq!(Priority::new(250).get(), 100);
        assert_eq!(Priority::new(73).get(), 73);
    }

    #[test]
    fn test_patch_leaves_absent_fields() {
        let mut identity = Identity::default();
        identity.apply(IdentityPatch {
            full_name: Some("Rana Haddad".into()),
            ..Default::default()
        });
        identity.apply(IdentityPatch {
            mobile: Some("+966500000000".into()),
            alerts_opt_in: Some(false),
            ..Default::default()
        });
        assert_eq!(identity.full_name, "Rana Haddad");
        assert_eq!(identity.mobile, "+966500000000");
        assert!(!identity.alerts_opt_in);
    }

    #[test]
    fn test_resolved_purpose_and_lane() {
        let mut details = VisitDetails::default();
        assert_eq!(details.resolved_purpose(), "Meeting");

        details.purpose = PurposeOption::Other;
        assert_eq!(details.resolved_purpose(), "Other");
        details.other_purpose = "  Calibration audit ".into();
        assert_eq!(details.resolved_purpose(), "Calibration audit");

        details.entry_lane = "   ".into();
        assert_eq!(details.resolved_entry_lane(), catalog::default_entry_lane());
    }

    #[test]
    fn test_unparseable_date_resolves_to_now() {
        let now = Utc::now();
        let mut details = VisitDetails::default();
        details.date = "next tuesday".into();
        assert_eq!(details.resolved_date(now), now);

        details.date = "2026-03-01T09:30:00+03:00".into();
        assert_eq!(details.resolved_date(now).to_rfc3339(), "2026-03-01T06:30:00+00:00");
    }

    #[test]
    fn test_date_only_resolves_to_midnight_utc() {
        let now = Utc::now();
        let mut details = VisitDetails::default();
        details.date = " 2026-03-01 ".into();
        assert_eq!(details.resolved_date(now).to_rfc3339(), "2026-03-01T00:00:00+00:00");

        details.date = "2026-03-01T09:30".into();
        assert_eq!(details.resolved_date(now).to_rfc3339(), "2026-03-01T09:30:00+00:00");

        details.date = "2026-02-30".into();
        assert_eq!(details.resolved_date(now), now);
    }

    #[test]
    fn test_health_screening_is_total() {
        let mut health = HealthScreening::default();
        assert_eq!(health.to_answers().len(), HEALTH_QUESTIONS.len());

        health.set("Influenza", true).unwrap();
        assert!(health.alert());
        assert_eq!(health.get("Influenza"), Some(true));
        assert_eq!(
            health.set("Headache", true),
            Err(UnknownQuestion("Headache".into()))
        );
    }

    #[test]
    fn test_partial_site_norms_do_not_count() {
        let mut norms = SiteNormsChecklist::default();
        for norm in SITE_NORMS.iter().take(SITE_NORMS.len() - 1) {
            norms.set(norm.id, true).unwrap();
        }
        assert!(!norms.all_accepted());
        assert_eq!(norms.first_unchecked(), Some("cuts"));

        assert!(norms.toggle("cuts").unwrap());
        assert!(norms.all_accepted());
        assert!(!norms.toggle("hair").unwrap());
        assert!(!norms.all_accepted());
    }
}
