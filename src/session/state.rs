use serde::Serialize;

use crate::error::{CaptureError, SessionError, TransportError};

/// Immutable snapshot of the recording session, delivered in full to every
/// subscriber on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Transport channel is open and usable
    pub connected: bool,
    /// Capture is active and chunks are being forwarded
    pub recording: bool,
    /// Server-assigned id; set once the transport acknowledges creation,
    /// cleared on disconnect
    pub session_id: Option<String>,
    /// Wall-clock seconds since recording start; advances only while
    /// recording
    pub elapsed_seconds: u64,
    /// Most recent fault; cleared on the next successful operation
    pub last_error: Option<ErrorInfo>,
}

/// Snapshot form of a fault, one distinct kind per user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthenticated,
    PermissionDenied,
    DeviceNotFound,
    DeviceUnsupported,
    InsecureContext,
    Connect,
    ServerReported,
}

impl ErrorInfo {
    pub fn unauthenticated() -> Self {
        Self {
            kind: ErrorKind::Unauthenticated,
            message: SessionError::Unauthenticated.to_string(),
        }
    }

    /// An inbound `error` control message from the remote side.
    pub fn server_reported(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ServerReported,
            message: message.into(),
        }
    }
}

impl From<&CaptureError> for ErrorInfo {
    fn from(e: &CaptureError) -> Self {
        let kind = match e {
            CaptureError::PermissionDenied => ErrorKind::PermissionDenied,
            CaptureError::DeviceNotFound => ErrorKind::DeviceNotFound,
            CaptureError::DeviceUnsupported(_) => ErrorKind::DeviceUnsupported,
            CaptureError::InsecureContext => ErrorKind::InsecureContext,
        };
        Self {
            kind,
            message: e.to_string(),
        }
    }
}

impl From<&TransportError> for ErrorInfo {
    fn from(e: &TransportError) -> Self {
        Self {
            kind: ErrorKind::Connect,
            message: e.to_string(),
        }
    }
}

/// Format an elapsed-second count as zero-padded `MM:SS`. Minutes are
/// unbounded, not wrapped at 60: 3661 seconds formats as "61:01".
pub fn format_duration(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
