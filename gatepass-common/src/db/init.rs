//! Database initialization
//!
//! Creates the database file on first run and applies the schema
//! idempotently on every start.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (or create) the database file and ensure the schema exists
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets the live feed read while an intake insert is in progress
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema, for tests and dry runs
pub async fn init_memory_database() -> Result<SqlitePool> {
    // A single connection keeps every query on the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Apply the schema (idempotent)
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;
    create_visits_table(pool).await?;
    create_visit_testimonials_table(pool).await?;
    Ok(())
}

async fn create_visits_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS visits (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            full_name TEXT NOT NULL,
            mobile TEXT NOT NULL,
            visitor_email TEXT NOT NULL,
            company TEXT,
            visit_type TEXT NOT NULL,
            host_name TEXT NOT NULL,
            purpose TEXT NOT NULL,
            purpose_notes TEXT,
            entry_lane TEXT NOT NULL,
            priority INTEGER NOT NULL,
            escort_required INTEGER NOT NULL DEFAULT 0,
            sms_updates INTEGER NOT NULL DEFAULT 0,
            health_answers TEXT NOT NULL DEFAULT '{}',
            site_norms_accepted INTEGER NOT NULL DEFAULT 0,
            selfie_url TEXT,
            consent_given INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'review',
            visit_date TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_visits_created_at ON visits(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_visit_testimonials_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS visit_testimonials (
            id TEXT PRIMARY KEY,
            visit_id TEXT NOT NULL REFERENCES visits(id) ON DELETE CASCADE,
            email TEXT NOT NULL,
            rating INTEGER CHECK (rating IS NULL OR (rating BETWEEN 1 AND 5)),
            comment TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = init_memory_database().await.unwrap();
        init_schema(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert_eq!(tables, vec!["visit_testimonials".to_string(), "visits".to_string()]);
    }

    #[tokio::test]
    async fn test_init_database_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("gatepass.db");

        let pool = init_database(&db_path).await.unwrap();
        assert!(db_path.exists());
        pool.close().await;
    }
}
