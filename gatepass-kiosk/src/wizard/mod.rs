//! Intake wizard
//!
//! Sessions are kept in a registry keyed by session id. Each one is behind
//! its own mutex; the lock is released while the submission pipeline runs so
//! the kiosk can keep polling the session view.

pub mod completion;
pub mod navigation;
pub mod session;

pub use completion::{CompletionFlags, FocusTarget};
pub use navigation::{smart_hint, Advance, BlockedSection, Section, SmartHint};
pub use session::{SelfieView, SessionError, SessionView, WizardSession};

use chrono::Utc;
use gatepass_common::events::{EventBus, GateEvent};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use uuid::Uuid;

use crate::capture::CameraBackend;
use crate::submission::{SubmissionOutcome, SubmissionPipeline};

pub type SharedSession = Arc<Mutex<WizardSession>>;

/// Result of pressing "Next"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum StepResult {
    Blocked { blocked: BlockedSection },
    Moved { from: usize, to: usize },
    Submitted { outcome: SubmissionOutcome },
    Failed { message: String },
}

/// Press "Next" on `session`, running the submission pipeline when the
/// final section is complete
pub async fn advance_session(
    session: &Mutex<WizardSession>,
    pipeline: &SubmissionPipeline,
) -> Result<StepResult, SessionError> {
    let intake = {
        let mut guard = session.lock().await;
        match guard.advance()? {
            Advance::Blocked(blocked) => return Ok(StepResult::Blocked { blocked }),
            Advance::Moved { from, to } => return Ok(StepResult::Moved { from, to }),
            Advance::Submit => guard.begin_submission()?,
        }
    };

    let result = pipeline.submit(&intake).await;

    let mut guard = session.lock().await;
    let blocked = guard.finish_submission(&result);
    Ok(match (result, blocked) {
        (Ok(outcome), _) => StepResult::Submitted { outcome },
        (Err(_), Some(blocked)) => StepResult::Blocked { blocked },
        (Err(e), None) => StepResult::Failed {
            message: e.user_message(),
        },
    })
}

/// Live wizard sessions
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(&self, camera: Arc<dyn CameraBackend>) -> (Uuid, SharedSession) {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(WizardSession::new(id, camera)));
        self.sessions.write().await.insert(id, session.clone());
        info!(session_id = %id, "Wizard session opened");
        (id, session)
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Remove a session and release its camera
    pub async fn close(&self, id: Uuid) -> Option<SharedSession> {
        let session = self.sessions.write().await.remove(&id)?;
        session.lock().await.stop_camera();
        info!(session_id = %id, "Wizard session closed");
        Some(session)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Close sessions idle longer than `max_idle`; busy sessions are skipped
    pub async fn sweep_idle(&self, max_idle: Duration) -> Vec<Uuid> {
        let mut sessions = self.sessions.write().await;
        let mut expired = Vec::new();
        for (id, session) in sessions.iter() {
            let Ok(mut guard) = session.try_lock() else {
                continue;
            };
            if !guard.is_submitting() && guard.idle_for() > max_idle {
                guard.stop_camera();
                expired.push(*id);
            }
        }
        for id in &expired {
            sessions.remove(id);
            debug!(session_id = %id, "Idle wizard session expired");
        }
        expired
    }
}

/// Idle time after which an abandoned session is closed
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Close idle sessions every `period` until the task is aborted
pub fn spawn_session_sweeper(
    registry: SessionRegistry,
    events: EventBus,
    max_idle: Duration,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            for session_id in registry.sweep_idle(max_idle).await {
                events.emit_lossy(GateEvent::SessionClosed {
                    session_id,
                    submitted: false,
                    timestamp: Utc::now(),
                });
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{RawFrame, RelayCamera};

    #[tokio::test]
    async fn test_open_get_close() {
        let registry = SessionRegistry::new();
        let camera = Arc::new(RelayCamera::new(true, true));
        camera.publish(RawFrame::new(1, 1, vec![0, 0, 0]).unwrap());

        let (id, session) = registry.open(camera.clone()).await;
        session.lock().await.start_camera().await.unwrap();
        assert!(camera.in_use());
        assert!(registry.get(id).await.is_some());

        registry.close(id).await.unwrap();
        assert!(!camera.in_use());
        assert!(registry.get(id).await.is_none());
        assert!(registry.close(id).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_idle() {
        let registry = SessionRegistry::new();
        let camera: Arc<dyn CameraBackend> = Arc::new(RelayCamera::new(true, true));
        let (stale, _) = registry.open(camera.clone()).await;

        tokio::time::advance(Duration::from_secs(120)).await;
        let (fresh, _) = registry.open(camera).await;

        let expired = registry.sweep_idle(Duration::from_secs(60)).await;
        assert_eq!(expired, vec![stale]);
        assert!(registry.get(fresh).await.is_some());
        assert_eq!(registry.len().await, 1);
    }
}
