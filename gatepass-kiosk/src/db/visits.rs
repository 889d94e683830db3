//! Visit store backed by SQLite
//!
//! Status values are written in storage form (lowercase canonical) and read
//! back through the canonicalizer, so rows written by older tools with other
//! spellings still map onto the four canonical states.

use async_trait::async_trait;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use gatepass_common::db::{NewTestimonial, NewVisit, VisitRecord, VISIT_COLUMNS};
use gatepass_common::{CanonicalStatus, Error, Result};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::retry::{retry_on_lock, DEFAULT_MAX_LOCK_WAIT_MS};
use crate::types::{escape_like, VisitFilter, VisitStore};

/// Fixed-width UTC timestamps so text ordering matches time ordering
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, Clone)]
pub struct SqliteVisitStore {
    pool: SqlitePool,
    max_lock_wait_ms: u64,
}

impl SqliteVisitStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            max_lock_wait_ms: DEFAULT_MAX_LOCK_WAIT_MS,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Build the listing query and its bind values
    fn select_sql(filter: &VisitFilter, now: DateTime<Local>) -> (String, Vec<String>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(query) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", escape_like(query));
            clauses.push("(full_name LIKE ? ESCAPE '\\' OR mobile LIKE ? ESCAPE '\\')".to_string());
            binds.push(pattern.clone());
            binds.push(pattern);
        }

        if let Some(purpose) = filter.purpose.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            clauses.push("purpose = ?".to_string());
            binds.push(purpose.to_string());
        }

        if let Some(start) = filter.range.start(now) {
            clauses.push("created_at >= ?".to_string());
            binds.push(format_timestamp(start));
        }

        if let Some(status) = filter.status {
            let aliases = status.aliases();
            let placeholders = vec!["?"; aliases.len()].join(", ");
            clauses.push(format!("LOWER(TRIM(status)) IN ({})", placeholders));
            binds.extend(aliases.iter().map(|alias| alias.to_string()));
        }

        let mut sql = format!("SELECT {} FROM visits", VISIT_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(&format!(" ORDER BY created_at DESC LIMIT {}", filter.effective_limit()));

        (sql, binds)
    }
}

#[async_trait]
impl VisitStore for SqliteVisitStore {
    async fn insert(&self, visit: &NewVisit) -> Result<VisitRecord> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        let health = serde_json::to_string(&visit.health_answers)
            .map_err(|e| Error::Internal(format!("Failed to serialize health answers: {}", e)))?;
        let id_text = id.to_string();
        let created_text = format_timestamp(created_at);
        let visit_date = format_timestamp(visit.visit_date);

        retry_on_lock("insert_visit", self.max_lock_wait_ms, || async {
            sqlx::query(
                r#"
                INSERT INTO visits (
                    id, created_at, full_name, mobile, visitor_email, company,
                    visit_type, host_name, purpose, purpose_notes, entry_lane, priority,
                    escort_required, sms_updates, health_answers, site_norms_accepted,
                    selfie_url, consent_given, status, visit_date
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id_text)
            .bind(&created_text)
            .bind(&visit.full_name)
            .bind(&visit.mobile)
            .bind(&visit.visitor_email)
            .bind(&visit.company)
            .bind(&visit.visit_type)
            .bind(&visit.host_name)
            .bind(&visit.purpose)
            .bind(&visit.purpose_notes)
            .bind(&visit.entry_lane)
            .bind(visit.priority)
            .bind(visit.escort_required)
            .bind(visit.sms_updates)
            .bind(&health)
            .bind(visit.site_norms_accepted)
            .bind(&visit.selfie_url)
            .bind(visit.consent_given)
            .bind(visit.status.to_storage_form())
            .bind(&visit_date)
            .execute(&self.pool)
            .await?;
            Ok::<_, Error>(())
        })
        .await?;

        debug!(visit_id = %id, "Inserted visit row");

        Ok(VisitRecord {
            id,
            created_at,
            full_name: visit.full_name.clone(),
            mobile: visit.mobile.clone(),
            visitor_email: visit.visitor_email.clone(),
            company: visit.company.clone(),
            visit_type: visit.visit_type.clone(),
            host_name: visit.host_name.clone(),
            purpose: visit.purpose.clone(),
            purpose_notes: visit.purpose_notes.clone(),
            entry_lane: visit.entry_lane.clone(),
            priority: visit.priority,
            escort_required: visit.escort_required,
            sms_updates: visit.sms_updates,
            health_answers: visit.health_answers.clone(),
            site_norms_accepted: visit.site_norms_accepted,
            selfie_url: visit.selfie_url.clone(),
            consent_given: visit.consent_given,
            status: visit.status,
            visit_date: visit.visit_date,
        })
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<VisitRecord>> {
        let sql = format!("SELECT {} FROM visits WHERE id = ?", VISIT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(VisitRecord::from_row).transpose()
    }

    async fn select(&self, filter: &VisitFilter) -> Result<Vec<VisitRecord>> {
        let (sql, binds) = Self::select_sql(filter, Local::now());
        let mut query = sqlx::query(&sql);
        for value in binds {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(VisitRecord::from_row).collect()
    }

    async fn recent(&self, limit: usize) -> Result<Vec<VisitRecord>> {
        let sql = format!(
            "SELECT {} FROM visits ORDER BY created_at DESC LIMIT ?",
            VISIT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(VisitRecord::from_row).collect()
    }

    async fn update_status(&self, id: Uuid, status: CanonicalStatus) -> Result<()> {
        let id_text = id.to_string();
        let affected = retry_on_lock("update_visit_status", self.max_lock_wait_ms, || async {
            let result = sqlx::query("UPDATE visits SET status = ? WHERE id = ?")
                .bind(status.to_storage_form())
                .bind(&id_text)
                .execute(&self.pool)
                .await?;
            Ok::<_, Error>(result.rows_affected())
        })
        .await?;

        if affected == 0 {
            return Err(Error::VisitNotFound(id));
        }
        Ok(())
    }

    async fn insert_testimonial(&self, testimonial: &NewTestimonial) -> Result<Uuid> {
        if self.fetch(testimonial.visit_id).await?.is_none() {
            return Err(Error::VisitNotFound(testimonial.visit_id));
        }

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO visit_testimonials (id, visit_id, email, rating, comment, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(testimonial.visit_id.to_string())
        .bind(&testimonial.email)
        .bind(testimonial.rating.map(i64::from))
        .bind(&testimonial.comment)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(id)
    }
}
