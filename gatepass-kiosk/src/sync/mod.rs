//! Live status synchronizer
//!
//! Keeps the staff console's view of the newest visits. The entry list is
//! only ever replaced by [`LiveFeed::refresh`] and patched by
//! [`LiveFeed::set_status`]; nothing else writes to it.

pub mod optimistic;
pub mod poller;

pub use optimistic::{AlreadyPending, OptimisticLedger};
pub use poller::spawn_feed_poller;

use chrono::{DateTime, Utc};
use gatepass_common::db::VisitRecord;
use gatepass_common::events::{EventBus, GateEvent};
use gatepass_common::CanonicalStatus;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::VisitStore;

pub const DEFAULT_NAME: &str = "Visitor";
pub const DEFAULT_PURPOSE: &str = "Standby";

/// Reloads tried when status changes keep landing mid-refresh
const MAX_REFRESH_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Visit store error: {0}")]
    Store(#[from] gatepass_common::Error),

    #[error("Visit {0} is not in the live feed")]
    UnknownEntry(Uuid),

    #[error("A status change for visit {0} is already in progress")]
    MutationInFlight(Uuid),
}

/// One row of the live feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveFeedEntry {
    pub id: Uuid,
    pub name: String,
    pub purpose: String,
    pub status: CanonicalStatus,
    pub timestamp: DateTime<Utc>,
}

impl LiveFeedEntry {
    pub fn from_record(record: &VisitRecord) -> Self {
        let name = record.full_name.trim();
        let purpose = [record.purpose.trim(), record.entry_lane.trim()]
            .into_iter()
            .find(|candidate| !candidate.is_empty())
            .unwrap_or(DEFAULT_PURPOSE);

        Self {
            id: record.id,
            name: if name.is_empty() { DEFAULT_NAME } else { name }.to_string(),
            purpose: purpose.to_string(),
            status: record.status,
            timestamp: record.created_at,
        }
    }
}

#[derive(Debug, Default)]
struct FeedState {
    entries: Vec<LiveFeedEntry>,
    scroll_offset: usize,
    ledger: OptimisticLedger<Uuid, CanonicalStatus>,
    /// Bumped on every commit or rollback; a refresh that read the store
    /// before the last bump carries stale rows
    changes: u64,
}

impl FeedState {
    fn clamp_scroll(&mut self) {
        let max = self.entries.len().saturating_sub(1);
        if self.scroll_offset > max {
            self.scroll_offset = max;
        }
    }
}

/// Snapshot of the feed served to the console
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedView {
    pub entries: Vec<LiveFeedEntry>,
    pub scroll_offset: usize,
}

pub struct LiveFeed {
    store: Arc<dyn VisitStore>,
    events: EventBus,
    window: usize,
    state: RwLock<FeedState>,
}

impl LiveFeed {
    pub fn new(store: Arc<dyn VisitStore>, events: EventBus, window: usize) -> Self {
        Self {
            store,
            events,
            window: window.max(1),
            state: RwLock::new(FeedState::default()),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub async fn entries(&self) -> Vec<LiveFeedEntry> {
        self.state.read().await.entries.clone()
    }

    pub async fn view(&self) -> FeedView {
        let state = self.state.read().await;
        FeedView {
            entries: state.entries.clone(),
            scroll_offset: state.scroll_offset,
        }
    }

    pub async fn scroll_offset(&self) -> usize {
        self.state.read().await.scroll_offset
    }

    /// Store the viewer's scroll position (clamped to the current list)
    pub async fn set_scroll_offset(&self, offset: usize) -> usize {
        let mut state = self.state.write().await;
        state.scroll_offset = offset;
        state.clamp_scroll();
        state.scroll_offset
    }

    /// Replace the list with the newest `window` visits
    ///
    /// Entries with a status change in flight keep their optimistic value.
    /// Rows read before a status change settled are discarded and reloaded.
    /// The scroll offset is kept unless the list became shorter than it.
    pub async fn refresh(&self) -> Result<Vec<LiveFeedEntry>, SyncError> {
        let mut attempt = 0;
        let snapshot = loop {
            attempt += 1;
            let started = self.state.read().await.changes;
            let records = self.store.recent(self.window).await?;
            let mut entries: Vec<LiveFeedEntry> =
                records.iter().map(LiveFeedEntry::from_record).collect();

            let mut state = self.state.write().await;
            if state.changes != started {
                if attempt < MAX_REFRESH_ATTEMPTS {
                    debug!(attempt, "Status settled during refresh, reloading");
                    continue;
                }
                warn!(attempt, "Live feed kept as is, status changes outpaced refresh");
                break state.entries.clone();
            }
            state
                .ledger
                .overlay(entries.iter_mut().map(|entry| (&entry.id, &mut entry.status)));
            state.entries = entries;
            state.clamp_scroll();
            break state.entries.clone();
        };

        debug!(entries = snapshot.len(), "Live feed refreshed");
        self.events.emit_lossy(GateEvent::LiveFeedRefreshed {
            entries: snapshot.len(),
            timestamp: Utc::now(),
        });
        Ok(snapshot)
    }

    /// Optimistically change one entry's status
    ///
    /// The new status shows immediately. On success the feed is reloaded
    /// from the store; on failure only this entry is restored, and only if
    /// it still shows the optimistic value.
    pub async fn set_status(
        &self,
        id: Uuid,
        next: CanonicalStatus,
    ) -> Result<Vec<LiveFeedEntry>, SyncError> {
        let previous = {
            let mut state = self.state.write().await;
            let FeedState { entries, ledger, .. } = &mut *state;
            let entry = entries
                .iter_mut()
                .find(|entry| entry.id == id)
                .ok_or(SyncError::UnknownEntry(id))?;
            let previous = entry.status;
            ledger
                .begin(id, previous, next)
                .map_err(|_| SyncError::MutationInFlight(id))?;
            entry.status = next;
            previous
        };

        match self.store.update_status(id, next).await {
            Ok(()) => {
                {
                    let mut state = self.state.write().await;
                    state.ledger.commit(&id);
                    state.changes += 1;
                }
                info!(visit_id = %id, status = %next, "Visit status changed");
                self.events.emit_lossy(GateEvent::VisitStatusChanged {
                    visit_id: id,
                    status: next,
                    timestamp: Utc::now(),
                });
                match self.refresh().await {
                    Ok(entries) => Ok(entries),
                    Err(e) => {
                        warn!(visit_id = %id, error = %e, "Refresh after status change failed");
                        Ok(self.entries().await)
                    }
                }
            }
            Err(e) => {
                let restored = {
                    let mut state = self.state.write().await;
                    let FeedState {
                        entries,
                        ledger,
                        changes,
                        ..
                    } = &mut *state;
                    *changes += 1;
                    let current = entries
                        .iter_mut()
                        .find(|entry| entry.id == id)
                        .map(|entry| &mut entry.status);
                    ledger.rollback(&id, current)
                };
                warn!(
                    visit_id = %id,
                    attempted = %next,
                    restored = %restored.unwrap_or(previous),
                    error = %e,
                    "Status change rejected, rolled back"
                );
                self.events.emit_lossy(GateEvent::VisitStatusRolledBack {
                    visit_id: id,
                    restored: restored.unwrap_or(previous),
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(e.into())
            }
        }
    }
}
