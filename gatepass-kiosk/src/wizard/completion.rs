//! Section completion evaluation
//!
//! Pure functions of the intake. Recomputed on every read, never cached, so
//! the flags can never disagree with the data they describe.

use gatepass_common::validation::{is_filled, is_valid_email};
use serde::Serialize;

use super::navigation::Section;
use crate::models::{Identity, PurposeOption, VisitDetails, VisitIntake};

/// Number of sections that gate submission (health does not)
pub const GATING_SECTIONS: usize = 5;

/// Per-section completion of one intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionFlags {
    pub identity_complete: bool,
    pub visit_details_complete: bool,
    pub selfie_complete: bool,
    pub site_norms_complete: bool,
    pub consent_complete: bool,
    /// Informational: at least one health answer is "yes"
    pub health_alert: bool,
}

impl CompletionFlags {
    pub fn evaluate(intake: &VisitIntake) -> Self {
        Self {
            identity_complete: identity_complete(&intake.identity),
            visit_details_complete: visit_details_complete(&intake.visit_details),
            selfie_complete: intake.selfie.is_some(),
            site_norms_complete: intake.site_norms_accepted(),
            consent_complete: intake.consent,
            health_alert: intake.health.alert(),
        }
    }

    /// Conjunction of the five gating flags
    pub fn is_complete(&self) -> bool {
        self.gating().iter().all(|flag| *flag)
    }

    pub fn completed_count(&self) -> usize {
        self.gating().iter().filter(|flag| **flag).count()
    }

    /// round(100 * completed / 5)
    pub fn percent(&self) -> u8 {
        let completed = self.completed_count() as f64;
        (completed * 100.0 / GATING_SECTIONS as f64).round() as u8
    }

    /// Health is never incomplete
    pub fn section_complete(&self, section: Section) -> bool {
        match section {
            Section::Identity => self.identity_complete,
            Section::VisitDetails => self.visit_details_complete,
            Section::Health => true,
            Section::Selfie => self.selfie_complete,
            Section::SiteNorms => self.site_norms_complete,
            Section::Consent => self.consent_complete,
        }
    }

    /// Lowest-index incomplete section
    pub fn first_incomplete(&self) -> Option<Section> {
        Section::ALL
            .iter()
            .copied()
            .find(|section| !self.section_complete(*section))
    }

    fn gating(&self) -> [bool; GATING_SECTIONS] {
        [
            self.identity_complete,
            self.visit_details_complete,
            self.selfie_complete,
            self.site_norms_complete,
            self.consent_complete,
        ]
    }
}

pub fn identity_complete(identity: &Identity) -> bool {
    is_filled(&identity.full_name) && is_filled(&identity.mobile) && is_valid_email(&identity.email)
}

pub fn visit_details_complete(details: &VisitDetails) -> bool {
    is_filled(&details.meeting_with)
        && (details.purpose != PurposeOption::Other || is_filled(&details.other_purpose))
}

/// Control the kiosk should focus when a section blocks navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "target", content = "item", rename_all = "camelCase")]
pub enum FocusTarget {
    FullName,
    Mobile,
    Email,
    MeetingWith,
    OtherPurpose,
    /// A specific unchecked site norm, by id
    SiteNorm(&'static str),
    CameraControl,
    ConsentCheckbox,
}

/// First missing field of `section`, if any
pub fn first_missing_field(section: Section, intake: &VisitIntake) -> Option<FocusTarget> {
    match section {
        Section::Identity => {
            let identity = &intake.identity;
            if !is_filled(&identity.full_name) {
                Some(FocusTarget::FullName)
            } else if !is_valid_email(&identity.email) {
                Some(FocusTarget::Email)
            } else if !is_filled(&identity.mobile) {
                Some(FocusTarget::Mobile)
            } else {
                None
            }
        }
        Section::VisitDetails => {
            let details = &intake.visit_details;
            if !is_filled(&details.meeting_with) {
                Some(FocusTarget::MeetingWith)
            } else if details.purpose == PurposeOption::Other && !is_filled(&details.other_purpose)
            {
                Some(FocusTarget::OtherPurpose)
            } else {
                None
            }
        }
        Section::Health => None,
        Section::Selfie => intake.selfie.is_none().then_some(FocusTarget::CameraControl),
        Section::SiteNorms => intake.site_norms.first_unchecked().map(FocusTarget::SiteNorm),
        Section::Consent => (!intake.consent).then_some(FocusTarget::ConsentCheckbox),
    }
}
