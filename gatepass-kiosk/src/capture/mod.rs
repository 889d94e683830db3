//! Capture device controller
//!
//! Owns the camera stream for one wizard session and walks it through
//! `Idle -> Starting -> Active | Error`. Whatever happens, the stream is
//! stopped when the controller is stopped, restarted, or dropped.

pub mod frame;
pub mod relay;

pub use frame::{RawFrame, Snapshot};
pub use relay::RelayCamera;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    Idle,
    Starting,
    Active,
    Error,
}

/// User-facing capture failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("Camera access is not supported on this device.")]
    Unsupported,

    #[error("Camera requires a secure (HTTPS) context. Please switch to a secure connection.")]
    InsecureContext,

    #[error("Camera permission was denied. Click 'Enable camera' to retry.")]
    PermissionDenied,

    #[error("No camera devices detected.")]
    NoDevice,

    /// Any other device failure; the detail is logged, not shown
    #[error("Unable to start the camera at this time.")]
    Device(String),

    #[error("Camera is not active.")]
    NotActive,

    /// The still could not be encoded; the stream stays open
    #[error("Unable to process the captured photo. Please try again.")]
    Encode(String),
}

/// Failures reported by a backend while opening or reading a stream
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("no capture device found")]
    NotFound,

    #[error("{0}")]
    Other(String),
}

impl From<DeviceError> for CaptureError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::PermissionDenied => CaptureError::PermissionDenied,
            DeviceError::NotFound => CaptureError::NoDevice,
            DeviceError::Other(detail) => CaptureError::Device(detail),
        }
    }
}

/// What the platform offers before any stream is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureEnvironment {
    pub api_available: bool,
    pub secure_context: bool,
}

/// Requested stream shape (front-facing, 720p ideal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing_user: bool,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing_user: true,
            ideal_width: 1280,
            ideal_height: 720,
        }
    }
}

/// Platform capture device
#[async_trait]
pub trait CameraBackend: Send + Sync {
    fn environment(&self) -> CaptureEnvironment;

    async fn open(&self, constraints: StreamConstraints)
        -> Result<Box<dyn CameraStream>, DeviceError>;
}

/// A live stream; must release the device on `stop`
pub trait CameraStream: Send + Sync {
    fn grab(&mut self) -> Result<RawFrame, DeviceError>;

    fn stop(&mut self);
}

/// Camera lifecycle for one wizard session
pub struct CaptureController {
    backend: Arc<dyn CameraBackend>,
    state: CaptureState,
    message: Option<String>,
    stream: Option<Box<dyn CameraStream>>,
}

impl std::fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureController")
            .field("state", &self.state)
            .field("message", &self.message)
            .field("has_stream", &self.stream.is_some())
            .finish()
    }
}

impl CaptureController {
    pub fn new(backend: Arc<dyn CameraBackend>) -> Self {
        Self {
            backend,
            state: CaptureState::Idle,
            message: None,
            stream: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Message shown beside the preview when in `Error`
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Request a stream; any previous stream is released first
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        self.release();

        let environment = self.backend.environment();
        if !environment.api_available {
            return Err(self.fail(CaptureError::Unsupported));
        }
        if !environment.secure_context {
            return Err(self.fail(CaptureError::InsecureContext));
        }

        self.state = CaptureState::Starting;
        self.message = None;

        match self.backend.open(StreamConstraints::default()).await {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state = CaptureState::Active;
                info!("Camera stream started");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Camera stream failed to start");
                Err(self.fail(e.into()))
            }
        }
    }

    /// Take a mirrored still from the live stream
    pub fn capture(&mut self) -> Result<Snapshot, CaptureError> {
        if self.state != CaptureState::Active {
            return Err(CaptureError::NotActive);
        }
        let stream = self.stream.as_mut().ok_or(CaptureError::NotActive)?;
        match stream.grab() {
            Ok(frame) => {
                debug!(width = frame.width(), height = frame.height(), "Captured still");
                Snapshot::from_frame(&frame).map_err(|e| {
                    warn!(error = %e, "Still encoding failed");
                    CaptureError::Encode(e.to_string())
                })
            }
            Err(e) => {
                warn!(error = %e, "Camera stream lost while capturing");
                self.release();
                Err(self.fail(e.into()))
            }
        }
    }

    /// Restart the stream for a new still
    pub async fn retake(&mut self) -> Result<(), CaptureError> {
        self.start().await
    }

    /// Release the device and return to `Idle`
    pub fn stop(&mut self) {
        self.release();
        self.state = CaptureState::Idle;
        self.message = None;
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!("Camera stream released");
        }
    }

    fn fail(&mut self, err: CaptureError) -> CaptureError {
        self.state = CaptureState::Error;
        self.message = Some(err.to_string());
        err
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.release();
    }
}
