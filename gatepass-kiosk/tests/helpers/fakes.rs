//! In-memory collaborators with switchable failures

use async_trait::async_trait;
use chrono::Utc;
use gatepass_common::db::{NewTestimonial, NewVisit, VisitRecord};
use gatepass_common::{CanonicalStatus, Error, Result};
use gatepass_kiosk::types::{
    FeedbackRequest, Notifier, NotifyError, ObjectStorage, StorageError, VisitFilter, VisitStore,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

pub fn record_from(visit: &NewVisit) -> VisitRecord {
    VisitRecord {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        full_name: visit.full_name.clone(),
        mobile: visit.mobile.clone(),
        visitor_email: visit.visitor_email.clone(),
        company: visit.company.clone(),
        visit_type: visit.visit_type.clone(),
        host_name: visit.host_name.clone(),
        purpose: visit.purpose.clone(),
        purpose_notes: visit.purpose_notes.clone(),
        entry_lane: visit.entry_lane.clone(),
        priority: visit.priority,
        escort_required: visit.escort_required,
        sms_updates: visit.sms_updates,
        health_answers: visit.health_answers.clone(),
        site_norms_accepted: visit.site_norms_accepted,
        selfie_url: visit.selfie_url.clone(),
        consent_given: visit.consent_given,
        status: visit.status,
        visit_date: visit.visit_date,
    }
}

/// Visit store kept in a Vec
#[derive(Default)]
pub struct FakeStore {
    pub records: Mutex<Vec<VisitRecord>>,
    pub testimonials: Mutex<Vec<NewTestimonial>>,
    pub insert_calls: AtomicUsize,
    pub fail_insert: AtomicBool,
    /// Status updates for these ids are rejected
    pub reject_updates: Mutex<HashSet<Uuid>>,
    /// Delay applied to every status update
    pub update_delay: Mutex<Option<Duration>>,
    /// One-shot delay between reading and returning the next `recent()` rows
    pub next_recent_delay: Mutex<Option<Duration>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_insert() -> Self {
        let store = Self::default();
        store.fail_insert.store(true, Ordering::SeqCst);
        store
    }

    pub fn seed(&self, visit: &NewVisit) -> Uuid {
        let record = record_from(visit);
        let id = record.id;
        self.records.lock().unwrap().push(record);
        id
    }

    pub fn reject_updates_for(&self, id: Uuid) {
        self.reject_updates.lock().unwrap().insert(id);
    }

    pub fn set_update_delay(&self, delay: Duration) {
        *self.update_delay.lock().unwrap() = Some(delay);
    }

    /// The next `recent()` reads its rows, then waits `delay` before returning
    pub fn delay_next_recent(&self, delay: Duration) {
        *self.next_recent_delay.lock().unwrap() = Some(delay);
    }

    pub fn status_of(&self, id: Uuid) -> Option<CanonicalStatus> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.status)
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl VisitStore for FakeStore {
    async fn insert(&self, visit: &NewVisit) -> Result<VisitRecord> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(Error::Internal("insert rejected by fake store".to_string()));
        }
        let record = record_from(visit);
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<VisitRecord>> {
        Ok(self.records.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn select(&self, filter: &VisitFilter) -> Result<Vec<VisitRecord>> {
        let mut rows: Vec<VisitRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(filter.effective_limit() as usize);
        Ok(rows)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<VisitRecord>> {
        let mut rows = self.records.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        let delay = self.next_recent_delay.lock().unwrap().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(rows)
    }

    async fn update_status(&self, id: Uuid, status: CanonicalStatus) -> Result<()> {
        let delay = *self.update_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.reject_updates.lock().unwrap().contains(&id) {
            return Err(Error::Internal(format!("update of {} rejected", id)));
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(Error::VisitNotFound(id))?;
        record.status = status;
        Ok(())
    }

    async fn insert_testimonial(&self, testimonial: &NewTestimonial) -> Result<Uuid> {
        self.testimonials.lock().unwrap().push(testimonial.clone());
        Ok(Uuid::new_v4())
    }
}

/// Object storage that records uploads
pub struct FakeStorage {
    pub uploads: Mutex<Vec<(String, Vec<u8>, String)>>,
    pub fail: AtomicBool,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        let storage = Self::new();
        storage.fail.store(true, Ordering::SeqCst);
        storage
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    fn bucket(&self) -> &str {
        "visitor-selfies"
    }

    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> std::result::Result<(), StorageError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "bucket offline",
            )));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_string(), bytes.to_vec(), content_type.to_string()));
        Ok(())
    }

    fn resolve_url(&self, reference: &str) -> Option<String> {
        Some(format!("https://cdn.example.com/{}", reference))
    }
}

/// Notifier that records requests, or rejects them with a 500
pub struct FakeNotifier {
    pub sent: Mutex<Vec<FeedbackRequest>>,
    pub fail: AtomicBool,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        let notifier = Self::new();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send_feedback_request(&self, request: &FeedbackRequest) -> std::result::Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Rejected {
                status: 500,
                body: "mail relay down".to_string(),
            });
        }
        self.sent.lock().unwrap().push(request.clone());
        Ok(())
    }
}
