pub mod capture;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod transport;

pub use capture::{
    AudioChunk, CaptureBackendFactory, CaptureConfig, CaptureDevice, CaptureFactory, CaptureSource,
};
pub use config::Config;
pub use error::{CaptureError, SessionError, TransportError};
pub use http::{create_router, AppState};
pub use session::{
    format_duration, ErrorInfo, ErrorKind, Identity, SessionConfig, SessionController,
    SessionState, Subscription,
};
pub use transport::{
    is_secure_endpoint, ClientMessage, Connection, ServerMessage, TransportChannel,
    TransportEvent, TransportFactory, WebSocketFactory,
};
