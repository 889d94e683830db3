//! Kiosk data models

pub mod intake;

pub use intake::{
    HealthScreening, Identity, IdentityPatch, Priority, PurposeOption, SiteNormsChecklist,
    UnknownNorm, UnknownQuestion, VisitDetails, VisitDetailsPatch, VisitIntake,
};
