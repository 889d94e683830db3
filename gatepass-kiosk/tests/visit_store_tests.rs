//! SQLite visit store against an in-memory database

mod helpers;

use chrono::{Duration, Utc};
use gatepass_common::db::NewTestimonial;
use gatepass_common::{CanonicalStatus, Error};
use gatepass_kiosk::db::visits::format_timestamp;
use gatepass_kiosk::db::SqliteVisitStore;
use gatepass_kiosk::types::{DateRange, VisitFilter, VisitStore};
use helpers::new_visit;
use uuid::Uuid;

async fn store() -> SqliteVisitStore {
    let pool = gatepass_common::db::init_memory_database()
        .await
        .expect("Failed to create in-memory database");
    SqliteVisitStore::new(pool)
}

async fn set_raw_status(store: &SqliteVisitStore, id: Uuid, raw: &str) {
    sqlx::query("UPDATE visits SET status = ? WHERE id = ?")
        .bind(raw)
        .bind(id.to_string())
        .execute(store.pool())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_insert_and_fetch_round_trip() {
    let store = store().await;
    let visit = new_visit("Faisal Omar", CanonicalStatus::Review);

    let inserted = store.insert(&visit).await.unwrap();
    let fetched = store.fetch(inserted.id).await.unwrap().unwrap();

    assert_eq!(fetched.full_name, "Faisal Omar");
    assert_eq!(fetched.status, CanonicalStatus::Review);
    assert_eq!(fetched.health_answers, visit.health_answers);
    assert_eq!(fetched.selfie_url.as_deref(), Some("selfies/seed.jpg"));
    assert_eq!(
        format_timestamp(fetched.created_at),
        format_timestamp(inserted.created_at)
    );
    assert!(store.fetch(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_legacy_status_spellings_are_canonicalized() {
    let store = store().await;
    let arrived = store.insert(&new_visit("A", CanonicalStatus::Review)).await.unwrap().id;
    let present = store.insert(&new_visit("B", CanonicalStatus::Review)).await.unwrap().id;
    let denied = store.insert(&new_visit("C", CanonicalStatus::Review)).await.unwrap().id;
    let garbage = store.insert(&new_visit("D", CanonicalStatus::Review)).await.unwrap().id;
    set_raw_status(&store, arrived, " Arrived ").await;
    set_raw_status(&store, present, "PRESENT").await;
    set_raw_status(&store, denied, "denied").await;
    set_raw_status(&store, garbage, "???").await;

    assert_eq!(
        store.fetch(arrived).await.unwrap().unwrap().status,
        CanonicalStatus::CheckedIn
    );
    assert_eq!(
        store.fetch(garbage).await.unwrap().unwrap().status,
        CanonicalStatus::Review
    );

    let checked_in = store
        .select(&VisitFilter {
            status: Some(CanonicalStatus::CheckedIn),
            ..Default::default()
        })
        .await
        .unwrap();
    let mut ids: Vec<Uuid> = checked_in.iter().map(|r| r.id).collect();
    ids.sort();
    let mut expected = vec![arrived, present];
    expected.sort();
    assert_eq!(ids, expected);

    let blocked = store
        .select(&VisitFilter {
            status: Some(CanonicalStatus::Blocked),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].id, denied);
}

#[tokio::test]
async fn test_text_query_escapes_wildcards() {
    let store = store().await;
    store.insert(&new_visit("100% Cotton Ltd", CanonicalStatus::Review)).await.unwrap();
    store.insert(&new_visit("1000 Cotton Ltd", CanonicalStatus::Review)).await.unwrap();
    store.insert(&new_visit("snake_case", CanonicalStatus::Review)).await.unwrap();
    store.insert(&new_visit("snakeXcase", CanonicalStatus::Review)).await.unwrap();

    let percent = store
        .select(&VisitFilter {
            query: Some("0%".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(percent.len(), 1);
    assert_eq!(percent[0].full_name, "100% Cotton Ltd");

    let underscore = store
        .select(&VisitFilter {
            query: Some("E_C".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(underscore.len(), 1);
    assert_eq!(underscore[0].full_name, "snake_case");
}

#[tokio::test]
async fn test_range_purpose_and_limit() {
    let store = store().await;
    let old = store.insert(&new_visit("Old", CanonicalStatus::Review)).await.unwrap().id;
    sqlx::query("UPDATE visits SET created_at = ? WHERE id = ?")
        .bind(format_timestamp(Utc::now() - Duration::days(40)))
        .bind(old.to_string())
        .execute(store.pool())
        .await
        .unwrap();
    for i in 0..3 {
        store
            .insert(&new_visit(&format!("New {}", i), CanonicalStatus::Review))
            .await
            .unwrap();
    }

    let all = store.select(&VisitFilter::default()).await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all.last().unwrap().id, old);

    let month = store
        .select(&VisitFilter {
            range: DateRange::LastMonth,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(month.len(), 3);

    let limited = store
        .select(&VisitFilter {
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].full_name, "New 2");

    let by_purpose = store
        .select(&VisitFilter {
            purpose: Some("Delivery".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_purpose.len(), 4);
    let none = store
        .select(&VisitFilter {
            purpose: Some("Interview".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_update_status_writes_storage_form() {
    let store = store().await;
    let id = store.insert(&new_visit("Rami", CanonicalStatus::Review)).await.unwrap().id;

    store.update_status(id, CanonicalStatus::CheckedIn).await.unwrap();
    let raw: String = sqlx::query_scalar("SELECT status FROM visits WHERE id = ?")
        .bind(id.to_string())
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(raw, "checked-in");

    let err = store
        .update_status(Uuid::new_v4(), CanonicalStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::VisitNotFound(_)));
}

#[tokio::test]
async fn test_recent_is_newest_first() {
    let store = store().await;
    for i in 0..4 {
        store
            .insert(&new_visit(&format!("Visitor {}", i), CanonicalStatus::Review))
            .await
            .unwrap();
    }
    let recent = store.recent(2).await.unwrap();
    let names: Vec<&str> = recent.iter().map(|r| r.full_name.as_str()).collect();
    assert_eq!(names, vec!["Visitor 3", "Visitor 2"]);
}

#[tokio::test]
async fn test_testimonial_requires_visit() {
    let store = store().await;
    let visit_id = store.insert(&new_visit("Nora", CanonicalStatus::Review)).await.unwrap().id;

    let testimonial = NewTestimonial {
        visit_id,
        email: "nora@example.com".to_string(),
        rating: Some(5),
        comment: "Fast badge printing".to_string(),
    };
    store.insert_testimonial(&testimonial).await.unwrap();

    let orphan = NewTestimonial {
        visit_id: Uuid::new_v4(),
        ..testimonial
    };
    assert!(matches!(
        store.insert_testimonial(&orphan).await,
        Err(Error::VisitNotFound(id)) if id == orphan.visit_id
    ));
}
