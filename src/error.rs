use thiserror::Error;

/// Capture device acquisition and start-up faults.
///
/// Every `acquire()` call resolves to either success or one of these;
/// nothing escapes the capture layer as an unhandled panic or a stringly
/// error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    /// The platform refused access to the input device.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// No input device is present.
    #[error("no microphone found")]
    DeviceNotFound,

    /// A device exists but cannot produce a usable stream.
    #[error("microphone not usable: {0}")]
    DeviceUnsupported(String),

    /// The ingestion endpoint is neither TLS nor localhost; capture is
    /// refused before any hardware access is attempted.
    #[error("audio capture requires a secure ingestion endpoint (wss:// or localhost)")]
    InsecureContext,
}

/// Transport channel faults.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("invalid ingestion endpoint `{url}`: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// The channel never reached Open (DNS, TLS, refused).
    #[error("failed to connect to ingestion endpoint: {0}")]
    Connect(String),
}

/// Errors surfaced by the session controller to command callers.
///
/// The guard variants (`EmptyTitle`, `AlreadyRecording`, `NotRecording`)
/// are returned synchronously and never stored in the state snapshot, so
/// callers can short-circuit without waiting for a notification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no authenticated user identity")]
    Unauthenticated,

    #[error("meeting title must not be empty")]
    EmptyTitle,

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("no recording in progress")]
    NotRecording,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
