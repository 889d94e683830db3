//! Stamps the kiosk binary with the revision it was built from
//!
//! Sets `GATEPASS_REVISION` (`git describe`, `-dirty` when the tree has local
//! edits), `GATEPASS_BUILT_AT` (UTC, or `SOURCE_DATE_EPOCH` for reproducible
//! builds) and `GATEPASS_PROFILE`.

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn main() {
    let revision = git(&["describe", "--always", "--dirty", "--abbrev=8"])
        .unwrap_or_else(|| "unknown".to_string());

    let built_at = std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|epoch| epoch.trim().parse::<i64>().ok())
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(chrono::Utc::now)
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string();

    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GATEPASS_REVISION={}", revision);
    println!("cargo:rustc-env=GATEPASS_BUILT_AT={}", built_at);
    println!("cargo:rustc-env=GATEPASS_PROFILE={}", profile);
}
