//! Submission pipeline
//!
//! Turns a complete intake into a durable visit record:
//!
//! 1. validate (every gating section complete)
//! 2. decode the selfie and upload it under a fresh path
//! 3. insert the visit with status `review`
//! 4. send the feedback-request notification (best effort)
//! 5. hand back the confirmation route
//!
//! Upload and insert failures abort the run. Nothing is rolled back: an
//! uploaded selfie whose insert failed stays in the bucket. A notification
//! failure only sets a flag on the outcome.

pub mod asset;

pub use asset::{InvalidAsset, SelfieAsset};

use chrono::{DateTime, Utc};
use gatepass_common::db::NewVisit;
use gatepass_common::events::{EventBus, GateEvent};
use gatepass_common::ids::object_path;
use gatepass_common::CanonicalStatus;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{PurposeOption, VisitIntake};
use crate::types::{FeedbackRequest, Notifier, ObjectStorage, StorageError, VisitStore};
use crate::wizard::completion::CompletionFlags;
use crate::wizard::navigation::Section;

/// Folder inside the bucket that holds selfies
pub const SELFIE_FOLDER: &str = "selfies";

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Section incomplete: {0}")]
    Incomplete(Section),

    #[error(transparent)]
    InvalidAsset(#[from] InvalidAsset),

    #[error("Selfie upload failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Visit could not be saved: {0}")]
    Persistence(#[from] gatepass_common::Error),
}

impl SubmitError {
    /// Message shown on the wizard's submit-error line
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Incomplete(_) => {
                crate::wizard::navigation::VALIDATION_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Where the kiosk goes after a successful submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRoute {
    pub visit_id: Uuid,
    pub notification_failed: bool,
}

impl ConfirmationRoute {
    pub fn path(&self) -> String {
        let mut path = format!("/visitor/thanks?visitId={}", self.visit_id);
        if self.notification_failed {
            path.push_str("&email=failed");
        }
        path
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub visit_id: Uuid,
    pub selfie_path: String,
    pub notification_failed: bool,
    pub route: ConfirmationRoute,
}

pub struct SubmissionPipeline {
    store: Arc<dyn VisitStore>,
    storage: Arc<dyn ObjectStorage>,
    notifier: Arc<dyn Notifier>,
    events: EventBus,
    base_url: String,
}

impl SubmissionPipeline {
    pub fn new(
        store: Arc<dyn VisitStore>,
        storage: Arc<dyn ObjectStorage>,
        notifier: Arc<dyn Notifier>,
        events: EventBus,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            storage,
            notifier,
            events,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Run all steps for `intake`
    pub async fn submit(&self, intake: &VisitIntake) -> Result<SubmissionOutcome, SubmitError> {
        let flags = CompletionFlags::evaluate(intake);
        if let Some(section) = flags.first_incomplete() {
            return Err(SubmitError::Incomplete(section));
        }
        let snapshot = intake
            .selfie
            .as_ref()
            .ok_or(SubmitError::Incomplete(Section::Selfie))?;

        let asset = SelfieAsset::from_data_url(&snapshot.data_url)?;
        let selfie_path = object_path(SELFIE_FOLDER, asset.extension());

        if let Err(e) = self
            .storage
            .upload(&selfie_path, &asset.bytes, &asset.content_type)
            .await
        {
            error!(path = %selfie_path, error = %e, "Selfie upload failed");
            return Err(e.into());
        }

        let visit = project_visit(intake, selfie_path.clone(), Utc::now());
        let record = match self.store.insert(&visit).await {
            Ok(record) => record,
            Err(e) => {
                // The uploaded selfie is left in place
                error!(path = %selfie_path, error = %e, "Visit insert failed");
                return Err(e.into());
            }
        };
        info!(visit_id = %record.id, "Visit recorded");

        let request = FeedbackRequest {
            email: visit.visitor_email.clone(),
            name: visit.full_name.clone(),
            form_link: self.feedback_link(record.id),
        };
        let notification_failed = match self.notifier.send_feedback_request(&request).await {
            Ok(()) => false,
            Err(e) => {
                warn!(visit_id = %record.id, error = %e, "Feedback request not sent");
                true
            }
        };

        self.events.emit_lossy(GateEvent::VisitSubmitted {
            visit_id: record.id,
            full_name: record.full_name.clone(),
            purpose: record.purpose.clone(),
            notification_failed,
            timestamp: Utc::now(),
        });

        Ok(SubmissionOutcome {
            visit_id: record.id,
            selfie_path,
            notification_failed,
            route: ConfirmationRoute {
                visit_id: record.id,
                notification_failed,
            },
        })
    }

    pub fn feedback_link(&self, visit_id: Uuid) -> String {
        format!("{}/testimonial?visitId={}", self.base_url, visit_id)
    }
}

/// Server-owned projection of an intake
pub fn project_visit(intake: &VisitIntake, selfie_path: String, now: DateTime<Utc>) -> NewVisit {
    let identity = &intake.identity;
    let details = &intake.visit_details;
    let company = identity.company.trim();
    let other = details.other_purpose.trim();

    NewVisit {
        full_name: identity.full_name.trim().to_string(),
        mobile: identity.mobile.trim().to_string(),
        visitor_email: identity.email.trim().to_string(),
        company: (!company.is_empty()).then(|| company.to_string()),
        visit_type: details.purpose.label().to_string(),
        host_name: details.meeting_with.trim().to_string(),
        purpose: details.resolved_purpose(),
        purpose_notes: (details.purpose == PurposeOption::Other && !other.is_empty())
            .then(|| other.to_string()),
        entry_lane: details.resolved_entry_lane(),
        priority: details.priority.get() as i64,
        escort_required: identity.escort_required,
        sms_updates: identity.alerts_opt_in,
        health_answers: intake.health.to_answers(),
        site_norms_accepted: intake.site_norms_accepted(),
        selfie_url: Some(selfie_path),
        consent_given: intake.consent,
        status: CanonicalStatus::Review,
        visit_date: details.resolved_date(now),
    }
}
