//! Property tests for the status canonicalizer

use gatepass_common::status::{canonicalize, canonicalize_str, CanonicalStatus};
use proptest::prelude::*;

fn any_status() -> impl Strategy<Value = CanonicalStatus> {
    prop::sample::select(CanonicalStatus::ALL.to_vec())
}

proptest! {
    #[test]
    fn canonicalize_is_idempotent(raw in ".{0,24}") {
        let once = canonicalize_str(&raw);
        prop_assert_eq!(canonicalize_str(once.to_storage_form()), once);
        prop_assert_eq!(canonicalize_str(once.label()), once);
    }

    #[test]
    fn storage_form_round_trips(status in any_status()) {
        prop_assert_eq!(canonicalize(Some(status.to_storage_form())), status);
    }

    #[test]
    fn aliases_ignore_case_and_padding(
        status in any_status(),
        pick in any::<prop::sample::Index>(),
        upper in any::<bool>(),
        pad in " {0,3}",
    ) {
        let alias = pick.get(status.aliases());
        let spelled = if upper { alias.to_uppercase() } else { alias.to_string() };
        let raw = format!("{pad}{spelled}{pad}");
        prop_assert_eq!(canonicalize_str(&raw), status);
    }

    #[test]
    fn unknown_input_goes_to_review(raw in "[0-9#]{1,12}") {
        prop_assert_eq!(canonicalize_str(&raw), CanonicalStatus::Review);
    }
}

#[test]
fn test_missing_status_is_review() {
    assert_eq!(canonicalize(None), CanonicalStatus::Review);
    assert_eq!(canonicalize(Some("   ")), CanonicalStatus::Review);
}
