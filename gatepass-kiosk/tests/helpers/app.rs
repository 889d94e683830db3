//! Full application wired to in-memory SQLite and a temp-dir bucket

use axum::body::Body;
use axum::response::Response;
use gatepass_common::config::TomlConfig;
use gatepass_kiosk::db::SqliteVisitStore;
use gatepass_kiosk::services::LocalBucket;
use gatepass_kiosk::types::{Notifier, VisitStore};
use gatepass_kiosk::{build_router, AppState};
use http_body_util::BodyExt;
use std::sync::Arc;
use tempfile::TempDir;

use super::fakes::FakeNotifier;

pub struct TestApp {
    pub router: axum::Router,
    pub state: AppState,
    pub notifier: Arc<FakeNotifier>,
    /// Keeps the bucket directory alive for the test
    pub storage_dir: TempDir,
}

/// Build the router with `config` (defaults when `None`)
pub async fn create_test_app(config: Option<TomlConfig>) -> TestApp {
    let pool = gatepass_common::db::init_memory_database()
        .await
        .expect("Failed to create in-memory database");
    let config = config.unwrap_or_default();

    let storage_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage = Arc::new(
        LocalBucket::new(storage_dir.path(), config.base_url(), &config.storage)
            .expect("Failed to configure bucket"),
    );
    let store: Arc<dyn VisitStore> = Arc::new(SqliteVisitStore::new(pool));
    let notifier = Arc::new(FakeNotifier::new());
    let dyn_notifier: Arc<dyn Notifier> = notifier.clone();

    let state = AppState::new(store, storage, dyn_notifier, config);
    let router = build_router(state.clone());

    TestApp {
        router,
        state,
        notifier,
        storage_dir,
    }
}

/// Collect a response body as JSON
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
