//! Section navigation and guided hints
//!
//! `NavigationController` tracks the active section and the transient
//! highlight pulse. It never inspects the intake directly; callers pass the
//! current [`CompletionFlags`] so evaluation stays in one place.

use serde::Serialize;
use std::fmt;
use tokio::time::{Duration, Instant};

use super::completion::{first_missing_field, CompletionFlags, FocusTarget};
use crate::models::VisitIntake;

/// How long a blocked section stays highlighted
pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(1400);

pub const VALIDATION_MESSAGE: &str = "Please fill the highlighted section before moving on.";

/// Wizard sections in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Identity,
    VisitDetails,
    Health,
    Selfie,
    SiteNorms,
    Consent,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Identity,
        Section::VisitDetails,
        Section::Health,
        Section::Selfie,
        Section::SiteNorms,
        Section::Consent,
    ];

    pub const LAST_INDEX: usize = Self::ALL.len() - 1;

    pub fn index(self) -> usize {
        match self {
            Section::Identity => 0,
            Section::VisitDetails => 1,
            Section::Health => 2,
            Section::Selfie => 3,
            Section::SiteNorms => 4,
            Section::Consent => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<Section> {
        Self::ALL.get(index).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            Section::Identity => "Identity & contact",
            Section::VisitDetails => "Visit details",
            Section::Health => "Health screening",
            Section::Selfie => "Selfie capture",
            Section::SiteNorms => "Site norms",
            Section::Consent => "Consent",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Requested section index is outside the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Section index {0} is out of range")]
pub struct SectionOutOfRange(pub usize);

/// A section that refused navigation, with where to send the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedSection {
    pub section: Section,
    pub index: usize,
    pub focus: Option<FocusTarget>,
    pub message: &'static str,
}

/// Result of a forward navigation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Incomplete intake; the wizard jumped to the first incomplete section
    Blocked(BlockedSection),
    Moved { from: usize, to: usize },
    /// Complete intake on the final section
    Submit,
}

#[derive(Debug, Clone, Copy)]
struct Highlight {
    index: usize,
    until: Instant,
}

#[derive(Debug, Clone)]
pub struct NavigationController {
    active: usize,
    highlight: Option<Highlight>,
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationController {
    pub fn new() -> Self {
        Self {
            active: 0,
            highlight: None,
        }
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_section(&self) -> Section {
        Section::from_index(self.active).unwrap_or(Section::Identity)
    }

    /// Highlighted index while the pulse is running
    pub fn highlighted_index(&self) -> Option<usize> {
        self.highlight
            .filter(|h| Instant::now() < h.until)
            .map(|h| h.index)
    }

    /// Forward navigation
    ///
    /// An incomplete intake always lands on its lowest-index incomplete
    /// section, even when that is behind the active one. A complete intake
    /// moves one step, or asks for submission from the final section.
    pub fn advance(&mut self, flags: &CompletionFlags, intake: &VisitIntake) -> Advance {
        if let Some(section) = flags.first_incomplete() {
            return Advance::Blocked(self.block(section, intake));
        }

        if self.active >= Section::LAST_INDEX {
            return Advance::Submit;
        }

        let from = self.active;
        self.active += 1;
        Advance::Moved {
            from,
            to: self.active,
        }
    }

    /// Jump to `section` and start the highlight pulse
    pub fn block(&mut self, section: Section, intake: &VisitIntake) -> BlockedSection {
        let index = section.index();
        self.active = index;
        self.highlight = Some(Highlight {
            index,
            until: Instant::now() + HIGHLIGHT_DURATION,
        });
        BlockedSection {
            section,
            index,
            focus: first_missing_field(section, intake),
            message: VALIDATION_MESSAGE,
        }
    }

    /// Direct navigation (stepper click); no completion check
    pub fn go_to(&mut self, index: usize) -> Result<(), SectionOutOfRange> {
        if index > Section::LAST_INDEX {
            return Err(SectionOutOfRange(index));
        }
        self.active = index;
        Ok(())
    }

    pub fn go_back(&mut self) {
        self.active = self.active.saturating_sub(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HintTone {
    Info,
    Warning,
    Success,
}

/// Guided suggestion shown beside the wizard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartHint {
    pub title: &'static str,
    pub detail: &'static str,
    pub section_index: usize,
    pub tone: HintTone,
    pub button_label: &'static str,
}

/// Highest-priority hint for the current flags
///
/// Order: identity, visit details, health alert, selfie, consent, ready.
pub fn smart_hint(flags: &CompletionFlags) -> SmartHint {
    if !flags.identity_complete {
        SmartHint {
            title: "Identity incomplete",
            detail: "Add your full name and mobile so the gate team can issue a badge instantly.",
            section_index: Section::Identity.index(),
            tone: HintTone::Warning,
            button_label: "Finish identity",
        }
    } else if !flags.visit_details_complete {
        SmartHint {
            title: "Visit details in review",
            detail: "Select a host, purpose, and entry lane before moving forward.",
            section_index: Section::VisitDetails.index(),
            tone: HintTone::Warning,
            button_label: "Describe visit",
        }
    } else if flags.health_alert {
        SmartHint {
            title: "Health flags detected",
            detail: "An alert was raised. HACCP may review before granting access.",
            section_index: Section::Health.index(),
            tone: HintTone::Warning,
            button_label: "Review health",
        }
    } else if !flags.selfie_complete {
        SmartHint {
            title: "Selfie missing",
            detail: "Capture your photo so the security team can confirm your identity.",
            section_index: Section::Selfie.index(),
            tone: HintTone::Info,
            button_label: "Grab selfie",
        }
    } else if !flags.consent_complete {
        SmartHint {
            title: "Consent required",
            detail: "Authorize data usage to unlock the submit control.",
            section_index: Section::Consent.index(),
            tone: HintTone::Info,
            button_label: "Grant consent",
        }
    } else {
        SmartHint {
            title: "Ready for the gate",
            detail: "All sections are aligned. Hit submit when ready.",
            section_index: Section::Consent.index(),
            tone: HintTone::Success,
            button_label: "Submit now",
        }
    }
}
