//! Intake and visit fixtures

use chrono::Utc;
use gatepass_common::catalog::SITE_NORMS;
use gatepass_common::db::NewVisit;
use gatepass_common::CanonicalStatus;
use gatepass_kiosk::capture::{RawFrame, Snapshot};
use gatepass_kiosk::models::{PurposeOption, VisitIntake};
use gatepass_kiosk::submission::project_visit;

/// A 2x2 still, already encoded the way the capture controller stores it
pub fn selfie_snapshot() -> Snapshot {
    let frame = RawFrame::new(2, 2, vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120])
        .expect("2x2 RGB frame");
    Snapshot::from_frame(&frame).expect("JPEG encoding")
}

/// Intake with all five gating sections complete
pub fn complete_intake() -> VisitIntake {
    let mut intake = VisitIntake::new();
    intake.identity.full_name = "Omar Haddad".to_string();
    intake.identity.mobile = "+966500000001".to_string();
    intake.identity.email = "omar@example.com".to_string();
    intake.identity.company = "Haddad Logistics".to_string();
    intake.visit_details.purpose = PurposeOption::Delivery;
    intake.visit_details.meeting_with = "Warehouse".to_string();
    intake.selfie = Some(selfie_snapshot());
    for norm in SITE_NORMS.iter() {
        intake.site_norms.set(norm.id, true).expect("catalog norm");
    }
    intake.consent = true;
    intake
}

/// Stored-visit payload for seeding stores directly
pub fn new_visit(name: &str, status: CanonicalStatus) -> NewVisit {
    let mut intake = complete_intake();
    intake.identity.full_name = name.to_string();
    let mut visit = project_visit(&intake, "selfies/seed.jpg".to_string(), Utc::now());
    visit.status = status;
    visit
}
