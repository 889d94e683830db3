//! Visit ids as they arrive from links and forms, and bucket object names

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VisitIdError {
    #[error("Missing visit id")]
    Missing,

    #[error("Invalid visit id: {0}")]
    Malformed(String),
}

/// Parse a visit id taken from a query string or form field
///
/// Blank input is `Missing`. The nil id is never issued, so it is rejected
/// along with anything that is not a UUID.
pub fn parse_visit_id(raw: Option<&str>) -> Result<Uuid, VisitIdError> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty());
    let raw = raw.ok_or(VisitIdError::Missing)?;
    match Uuid::parse_str(raw) {
        Ok(id) if !id.is_nil() => Ok(id),
        _ => Err(VisitIdError::Malformed(raw.to_string())),
    }
}

/// Fresh `<folder>/<uuid>.<ext>` name; a new one per upload attempt
pub fn object_path(folder: &str, extension: &str) -> String {
    format!(
        "{}/{}.{}",
        folder.trim_matches('/'),
        Uuid::new_v4(),
        extension.trim_start_matches('.')
    )
}
