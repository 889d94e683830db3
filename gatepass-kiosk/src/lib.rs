//! gatepass-kiosk library interface
//!
//! The visitor intake wizard, capture controller, submission pipeline and
//! live status feed, plus the HTTP surface the kiosk front-end and the
//! staff console call. Exposed as a library for integration testing.

pub mod api;
pub mod capture;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod submission;
pub mod sync;
pub mod types;
pub mod wizard;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use gatepass_common::config::TomlConfig;
use gatepass_common::events::EventBus;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::capture::RelayCamera;
use crate::db::SqliteVisitStore;
use crate::services::{HttpNotifier, LocalBucket};
use crate::submission::SubmissionPipeline;
use crate::sync::LiveFeed;
use crate::types::{Notifier, NotifyError, StorageError, VisitStore};
use crate::wizard::SessionRegistry;

/// Collaborators that could not be configured at startup
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Event bus capacity
pub const EVENT_BUS_CAPACITY: usize = 100;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VisitStore>,
    pub storage: Arc<LocalBucket>,
    pub camera: Arc<RelayCamera>,
    pub sessions: SessionRegistry,
    pub pipeline: Arc<SubmissionPipeline>,
    pub feed: Arc<LiveFeed>,
    pub event_bus: EventBus,
    pub config: Arc<TomlConfig>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    /// Wire the service from its collaborators
    pub fn new(
        store: Arc<dyn VisitStore>,
        storage: Arc<LocalBucket>,
        notifier: Arc<dyn Notifier>,
        config: TomlConfig,
    ) -> Self {
        let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
        let camera = Arc::new(RelayCamera::new(
            config.camera.enabled,
            config.is_secure_context(),
        ));
        let pipeline = Arc::new(SubmissionPipeline::new(
            store.clone(),
            storage.clone(),
            notifier,
            event_bus.clone(),
            config.base_url(),
        ));
        let feed = Arc::new(LiveFeed::new(
            store.clone(),
            event_bus.clone(),
            config.feed.window,
        ));

        Self {
            store,
            storage,
            camera,
            sessions: SessionRegistry::new(),
            pipeline,
            feed,
            event_bus,
            config: Arc::new(config),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Production wiring: SQLite store, filesystem bucket, HTTP notifier
    pub fn from_pool(
        pool: SqlitePool,
        config: TomlConfig,
        storage_root: &Path,
    ) -> Result<Self, StartupError> {
        let store: Arc<dyn VisitStore> = Arc::new(SqliteVisitStore::new(pool));
        let storage = Arc::new(LocalBucket::new(storage_root, config.base_url(), &config.storage)?);
        let notifier: Arc<dyn Notifier> = Arc::new(HttpNotifier::from_config(&config.notify)?);
        Ok(Self::new(store, storage, notifier, config))
    }

    /// Remember the most recent failure for `/health`
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::session_routes())
        .merge(api::camera_routes())
        .merge(api::confirmation_routes())
        .merge(api::testimonial_routes())
        .merge(api::visit_routes())
        .merge(api::feed_routes())
        .merge(api::storage_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
