//! Relay camera backend
//!
//! The kiosk front-end owns the physical webcam and relays preview frames to
//! the service (`PUT /api/camera/frame`). This backend turns that feed into
//! a [`CameraBackend`]: a stream is the latest relayed frame, and only one
//! session may hold the stream at a time.

use super::{
    CameraBackend, CameraStream, CaptureEnvironment, DeviceError, RawFrame, StreamConstraints,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, Instant};
use tracing::{debug, info};

/// Frames older than this count as a dead feed
pub const STALE_FRAME_AFTER: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct RelayedFrame {
    frame: RawFrame,
    received_at: Instant,
}

#[derive(Debug, Clone)]
enum FeedState {
    /// Nothing relayed since startup
    Empty,
    /// Front-end reported the browser refused camera access
    Denied,
    Frame(RelayedFrame),
}

/// Camera fed by frames the kiosk front-end publishes
#[derive(Debug)]
pub struct RelayCamera {
    enabled: bool,
    secure_context: bool,
    feed: watch::Sender<FeedState>,
    in_use: Arc<AtomicBool>,
}

impl RelayCamera {
    pub fn new(enabled: bool, secure_context: bool) -> Self {
        let (feed, _) = watch::channel(FeedState::Empty);
        Self {
            enabled,
            secure_context,
            feed,
            in_use: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Publish the latest preview frame
    pub fn publish(&self, frame: RawFrame) {
        self.feed.send_replace(FeedState::Frame(RelayedFrame {
            frame,
            received_at: Instant::now(),
        }));
    }

    /// Record that the browser denied camera permission
    pub fn report_denied(&self) {
        info!("Kiosk front-end reported camera permission denied");
        self.feed.send_replace(FeedState::Denied);
    }

    /// Whether a session currently holds the stream
    pub fn in_use(&self) -> bool {
        self.in_use.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraBackend for RelayCamera {
    fn environment(&self) -> CaptureEnvironment {
        CaptureEnvironment {
            api_available: self.enabled,
            secure_context: self.secure_context,
        }
    }

    async fn open(
        &self,
        _constraints: StreamConstraints,
    ) -> Result<Box<dyn CameraStream>, DeviceError> {
        match &*self.feed.borrow() {
            FeedState::Empty => return Err(DeviceError::NotFound),
            FeedState::Denied => return Err(DeviceError::PermissionDenied),
            FeedState::Frame(relayed) if relayed.received_at.elapsed() > STALE_FRAME_AFTER => {
                return Err(DeviceError::Other("camera feed is stale".to_string()));
            }
            FeedState::Frame(_) => {}
        }

        if self
            .in_use
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(DeviceError::Other(
                "camera is held by another session".to_string(),
            ));
        }

        debug!("Relay camera stream opened");
        Ok(Box::new(RelayStream {
            feed: self.feed.subscribe(),
            in_use: self.in_use.clone(),
            live: true,
        }))
    }
}

struct RelayStream {
    feed: watch::Receiver<FeedState>,
    in_use: Arc<AtomicBool>,
    live: bool,
}

impl CameraStream for RelayStream {
    fn grab(&mut self) -> Result<RawFrame, DeviceError> {
        if !self.live {
            return Err(DeviceError::Other("stream stopped".to_string()));
        }
        match &*self.feed.borrow() {
            FeedState::Frame(relayed) if relayed.received_at.elapsed() <= STALE_FRAME_AFTER => {
                Ok(relayed.frame.clone())
            }
            FeedState::Frame(_) => Err(DeviceError::Other("camera feed is stale".to_string())),
            FeedState::Denied => Err(DeviceError::PermissionDenied),
            FeedState::Empty => Err(DeviceError::NotFound),
        }
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.in_use.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for RelayStream {
    fn drop(&mut self) {
        self.stop();
    }
}
