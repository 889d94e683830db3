//! Shared field validation

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// `local@domain.tld` check applied to the trimmed value
pub fn is_valid_email(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && EMAIL_PATTERN.is_match(trimmed)
}

/// True when the value has at least one non-whitespace character
pub fn is_filled(value: &str) -> bool {
    !value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("guest@bakery.example"));
        assert!(is_valid_email("  a@b.co  "));
        assert!(!is_valid_email("guest@bakery"));
        assert!(!is_valid_email("guest bakery@site.com"));
        assert!(!is_valid_email("@site.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_is_filled() {
        assert!(is_filled(" x "));
        assert!(!is_filled("   "));
    }
}
