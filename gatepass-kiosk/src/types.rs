//! Collaborator contracts
//!
//! The submission pipeline and the live feed only talk to storage, the
//! visit store and the notifier through these traits. Production
//! implementations live in `db::visits` and `services`; tests supply fakes.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone, Utc};
use gatepass_common::db::{NewTestimonial, NewVisit, VisitRecord};
use gatepass_common::CanonicalStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hard cap on rows returned by a visit listing
pub const MAX_VISIT_LIMIT: u32 = 200;

/// Durable visit records
#[async_trait]
pub trait VisitStore: Send + Sync {
    async fn insert(&self, visit: &NewVisit) -> gatepass_common::Result<VisitRecord>;

    async fn fetch(&self, id: Uuid) -> gatepass_common::Result<Option<VisitRecord>>;

    async fn select(&self, filter: &VisitFilter) -> gatepass_common::Result<Vec<VisitRecord>>;

    /// Newest `limit` visits, newest first
    async fn recent(&self, limit: usize) -> gatepass_common::Result<Vec<VisitRecord>>;

    /// Writes the storage form of `status`; `NotFound` if `id` is unknown
    async fn update_status(&self, id: Uuid, status: CanonicalStatus) -> gatepass_common::Result<()>;

    async fn insert_testimonial(&self, testimonial: &NewTestimonial) -> gatepass_common::Result<Uuid>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Private bucket {0} needs a signing_secret")]
    MissingSigningSecret(String),
}

/// Binary object storage for selfies
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    fn bucket(&self) -> &str;

    /// Store `bytes` at `path`; never overwrites an existing object
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError>;

    /// Display URL for a stored reference (path, absolute URL or data URL)
    fn resolve_url(&self, reference: &str) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification endpoint is not configured")]
    NotConfigured,

    #[error("Notification transport failed: {0}")]
    Transport(String),

    #[error("Notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Feedback-request message sent after a visit is recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub email: String,
    pub name: String,
    pub form_link: String,
}

/// Outbound visitor notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_feedback_request(&self, request: &FeedbackRequest) -> Result<(), NotifyError>;
}

/// Creation-date window for staff listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateRange {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "7d")]
    LastWeek,
    #[serde(rename = "30d")]
    LastMonth,
}

impl DateRange {
    /// Inclusive lower bound: local start of day, 6 or 29 days back
    pub fn start(self, now: DateTime<Local>) -> Option<DateTime<Utc>> {
        let days_back = match self {
            DateRange::All => return None,
            DateRange::LastWeek => 6,
            DateRange::LastMonth => 29,
        };
        let day = now.date_naive() - Duration::days(days_back);
        let midnight = day.and_time(NaiveTime::MIN);
        Local
            .from_local_datetime(&midnight)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Staff console visit query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitFilter {
    /// Case-insensitive substring of name or mobile
    pub query: Option<String>,
    pub purpose: Option<String>,
    pub range: DateRange,
    /// Matches every stored alias of this status
    pub status: Option<CanonicalStatus>,
    pub limit: u32,
}

impl Default for VisitFilter {
    fn default() -> Self {
        Self {
            query: None,
            purpose: None,
            range: DateRange::All,
            status: None,
            limit: MAX_VISIT_LIMIT,
        }
    }
}

impl VisitFilter {
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_VISIT_LIMIT)
    }
}

/// Escape `%`, `_` and the escape character for a `LIKE ... ESCAPE '\'`
pub fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
