//! One visitor's wizard session
//!
//! The session is the single owner of its intake, navigation state and
//! camera. Every mutation goes through it, so a submitted intake can never be
//! edited again and a submission in flight blocks further input.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::completion::CompletionFlags;
use super::navigation::{
    smart_hint, Advance, BlockedSection, NavigationController, SectionOutOfRange, SmartHint,
};
use crate::capture::{CameraBackend, CaptureController, CaptureError, CaptureState, Snapshot};
use crate::models::{IdentityPatch, UnknownNorm, UnknownQuestion, VisitDetailsPatch, VisitIntake};
use crate::submission::{SubmissionOutcome, SubmitError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("This visit has already been submitted")]
    AlreadySubmitted,

    #[error("Submitting…")]
    SubmissionInFlight,

    #[error(transparent)]
    UnknownQuestion(#[from] UnknownQuestion),

    #[error(transparent)]
    UnknownNorm(#[from] UnknownNorm),

    #[error(transparent)]
    SectionOutOfRange(#[from] SectionOutOfRange),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

#[derive(Debug)]
pub struct WizardSession {
    id: Uuid,
    intake: VisitIntake,
    nav: NavigationController,
    camera: CaptureController,
    validation_message: Option<&'static str>,
    submit_error: Option<String>,
    submitting: bool,
    outcome: Option<SubmissionOutcome>,
    created_at: DateTime<Utc>,
    last_activity: Instant,
}

impl WizardSession {
    pub fn new(id: Uuid, camera: Arc<dyn CameraBackend>) -> Self {
        Self {
            id,
            intake: VisitIntake::new(),
            nav: NavigationController::new(),
            camera: CaptureController::new(camera),
            validation_message: None,
            submit_error: None,
            submitting: false,
            outcome: None,
            created_at: Utc::now(),
            last_activity: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn intake(&self) -> &VisitIntake {
        &self.intake
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.nav
    }

    pub fn camera(&self) -> &CaptureController {
        &self.camera
    }

    pub fn flags(&self) -> CompletionFlags {
        CompletionFlags::evaluate(&self.intake)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn outcome(&self) -> Option<&SubmissionOutcome> {
        self.outcome.as_ref()
    }

    pub fn idle_for(&self) -> std::time::Duration {
        self.last_activity.elapsed()
    }

    pub fn update_identity(&mut self, patch: IdentityPatch) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.intake.identity.apply(patch);
        Ok(())
    }

    pub fn update_visit_details(&mut self, patch: VisitDetailsPatch) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.intake.visit_details.apply(patch);
        Ok(())
    }

    pub fn set_health_answer(&mut self, key: &str, value: bool) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.intake.health.set(key, value)?;
        Ok(())
    }

    pub fn set_site_norm(&mut self, id: &str, checked: bool) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.intake.site_norms.set(id, checked)?;
        Ok(())
    }

    pub fn set_consent(&mut self, consent: bool) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.intake.consent = consent;
        Ok(())
    }

    /// Forward navigation; `Advance::Submit` means the caller should run
    /// the submission pipeline
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        self.ensure_editable()?;
        self.validation_message = None;

        let flags = self.flags();
        let outcome = self.nav.advance(&flags, &self.intake);
        if let Advance::Blocked(blocked) = &outcome {
            debug!(session_id = %self.id, section = %blocked.section, "Navigation blocked");
            self.validation_message = Some(blocked.message);
        }
        Ok(outcome)
    }

    pub fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.nav.go_to(index)?;
        Ok(())
    }

    pub fn go_back(&mut self) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.nav.go_back();
        Ok(())
    }

    pub async fn start_camera(&mut self) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.camera.start().await?;
        Ok(())
    }

    /// Capture a still, replacing any previous selfie
    pub fn capture_selfie(&mut self) -> Result<&Snapshot, SessionError> {
        self.ensure_editable()?;
        let snapshot = self.camera.capture()?;
        Ok(self.intake.selfie.insert(snapshot))
    }

    /// Discard the selfie and restart the stream
    pub async fn retake_selfie(&mut self) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.intake.selfie = None;
        self.camera.retake().await?;
        Ok(())
    }

    pub fn stop_camera(&mut self) {
        self.camera.stop();
    }

    /// Enter the submitting state and hand out the intake to submit
    pub fn begin_submission(&mut self) -> Result<VisitIntake, SessionError> {
        self.ensure_editable()?;
        self.submitting = true;
        self.submit_error = None;
        Ok(self.intake.clone())
    }

    /// Apply the pipeline result; returns the section to show when the
    /// pipeline found the intake incomplete
    pub fn finish_submission(
        &mut self,
        result: &Result<SubmissionOutcome, SubmitError>,
    ) -> Option<BlockedSection> {
        self.submitting = false;
        self.last_activity = Instant::now();
        match result {
            Ok(outcome) => {
                self.intake.mark_submitted();
                self.outcome = Some(outcome.clone());
                self.camera.stop();
                info!(session_id = %self.id, visit_id = %outcome.visit_id, "Session submitted");
                None
            }
            Err(SubmitError::Incomplete(section)) => {
                let blocked = self.nav.block(*section, &self.intake);
                self.validation_message = Some(blocked.message);
                Some(blocked)
            }
            Err(e) => {
                self.submit_error = Some(e.user_message());
                None
            }
        }
    }

    pub fn view(&self) -> SessionView {
        let flags = self.flags();
        SessionView {
            session_id: self.id,
            created_at: self.created_at,
            active_index: self.nav.active_index(),
            highlighted_index: self.nav.highlighted_index(),
            completion: flags,
            percent: flags.percent(),
            complete: flags.is_complete(),
            hint: smart_hint(&flags),
            validation_message: self.validation_message,
            submit_error: self.submit_error.clone(),
            submitting: self.submitting,
            submitted: self.intake.is_submitted(),
            camera: CameraView {
                state: self.camera.state(),
                message: self.camera.message().map(str::to_string),
            },
            intake: self.intake.clone(),
            has_selfie: self.intake.selfie.is_some(),
            selfie: self
                .intake
                .selfie
                .as_ref()
                .map(|snapshot| SelfieView::new(self.id, snapshot)),
            outcome: self.outcome.clone(),
        }
    }

    fn ensure_editable(&mut self) -> Result<(), SessionError> {
        if self.intake.is_submitted() {
            return Err(SessionError::AlreadySubmitted);
        }
        if self.submitting {
            return Err(SessionError::SubmissionInFlight);
        }
        self.last_activity = Instant::now();
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraView {
    pub state: CaptureState,
    pub message: Option<String>,
}

/// Selfie metadata; the image itself is fetched from `preview_url`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfieView {
    pub content_type: String,
    pub width: u32,
    pub height: u32,
    pub encoded_bytes: usize,
    pub captured_at: DateTime<Utc>,
    pub preview_url: String,
}

impl SelfieView {
    fn new(session_id: Uuid, snapshot: &Snapshot) -> Self {
        Self {
            content_type: snapshot.content_type.clone(),
            width: snapshot.width,
            height: snapshot.height,
            encoded_bytes: snapshot.encoded_len(),
            captured_at: snapshot.captured_at,
            preview_url: format!("/api/sessions/{}/selfie", session_id),
        }
    }
}

/// Read model served to the kiosk front-end
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub active_index: usize,
    pub highlighted_index: Option<usize>,
    pub completion: CompletionFlags,
    pub percent: u8,
    pub complete: bool,
    pub hint: SmartHint,
    pub validation_message: Option<&'static str>,
    pub submit_error: Option<String>,
    pub submitting: bool,
    pub submitted: bool,
    pub camera: CameraView,
    pub intake: VisitIntake,
    pub has_selfie: bool,
    pub selfie: Option<SelfieView>,
    pub outcome: Option<SubmissionOutcome>,
}
