//! Errors shared by the gatepass crates

use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// gatepass.toml missing, unreadable or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// No visit with this id (status update, testimonial target)
    #[error("Visit {0} not found")]
    VisitNotFound(Uuid),

    /// A stored visit row that no longer decodes
    #[error("Corrupt {column} in visit row: {detail}")]
    CorruptRow {
        column: &'static str,
        detail: String,
    },

    /// SQLite stayed locked for the whole retry budget
    #[error("Database locked during {operation} after {attempts} attempts ({elapsed_ms} ms)")]
    Locked {
        operation: String,
        attempts: u32,
        elapsed_ms: u64,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}
