//! Canonical visit status vocabulary
//!
//! Every raw status string, whatever its origin (intake, staff console, live
//! feed, stored rows), goes through [`canonicalize`]. The alias table below is
//! the only place status spellings are listed.
//!
//! Unknown input maps to [`CanonicalStatus::Review`]: an unrecognised status
//! sends the visit to manual review rather than letting it through.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Closed set of visit states shared by intake, storage and live display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalStatus {
    Approved,
    Blocked,
    Review,
    CheckedIn,
}

/// Badge colour family used by console renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    Success,
    Danger,
    Warning,
    Neutral,
}

/// Alias table, in match order. The first status whose alias list contains
/// the normalised input wins.
pub const STATUS_ALIASES: [(CanonicalStatus, &[&str]); 4] = [
    (
        CanonicalStatus::Approved,
        &["approved", "allow", "allowed", "approved-in"],
    ),
    (CanonicalStatus::Blocked, &["blocked", "denied", "rejected"]),
    (
        CanonicalStatus::Review,
        &["review", "pending", "needs review", "awaiting", "queued"],
    ),
    (
        CanonicalStatus::CheckedIn,
        &["checked-in", "checked in", "arrived", "arrival", "present"],
    ),
];

impl CanonicalStatus {
    /// All canonical values, in alias-table order
    pub const ALL: [CanonicalStatus; 4] = [
        CanonicalStatus::Approved,
        CanonicalStatus::Blocked,
        CanonicalStatus::Review,
        CanonicalStatus::CheckedIn,
    ];

    /// Display label ("Checked-in" keeps its hyphen)
    pub fn label(self) -> &'static str {
        match self {
            CanonicalStatus::Approved => "Approved",
            CanonicalStatus::Blocked => "Blocked",
            CanonicalStatus::Review => "Review",
            CanonicalStatus::CheckedIn => "Checked-in",
        }
    }

    /// Spelling written to the `visits.status` column
    pub fn to_storage_form(self) -> &'static str {
        match self {
            CanonicalStatus::Approved => "approved",
            CanonicalStatus::Blocked => "blocked",
            CanonicalStatus::Review => "review",
            CanonicalStatus::CheckedIn => "checked-in",
        }
    }

    /// Every stored spelling that canonicalizes to this status
    pub fn aliases(self) -> &'static [&'static str] {
        STATUS_ALIASES
            .iter()
            .find(|(status, _)| *status == self)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }

    pub fn badge_variant(self) -> BadgeVariant {
        match self {
            CanonicalStatus::Approved => BadgeVariant::Success,
            CanonicalStatus::Blocked => BadgeVariant::Danger,
            CanonicalStatus::Review => BadgeVariant::Warning,
            CanonicalStatus::CheckedIn => BadgeVariant::Neutral,
        }
    }
}

impl Default for CanonicalStatus {
    fn default() -> Self {
        CanonicalStatus::Review
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map any raw status string onto the canonical set
///
/// Input is trimmed and lower-cased, then compared against each alias list in
/// table order. `None`, empty and unmatched input all yield `Review`.
pub fn canonicalize(raw: Option<&str>) -> CanonicalStatus {
    let normalized = raw.unwrap_or_default().trim().to_lowercase();
    STATUS_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|alias| *alias == normalized))
        .map(|(status, _)| *status)
        .unwrap_or(CanonicalStatus::Review)
}

/// Convenience wrapper for call sites holding a `&str`
pub fn canonicalize_str(raw: &str) -> CanonicalStatus {
    canonicalize(Some(raw))
}

impl Serialize for CanonicalStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for CanonicalStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(canonicalize(raw.as_deref()))
    }
}
